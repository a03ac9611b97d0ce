//! Workspace walking and directory tree snapshots.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use ignore::WalkBuilder;

use crate::infra::config::Config;

const REDRAFT_IGNORE: &str = ".redraftignore";

/// Walks the workspace honoring gitignore rules plus a configured overlay,
/// producing the tracked-file list and the rendered tree snapshot.
pub struct TreeScanner {
    root: PathBuf,
    overlay: GlobSet,
}

impl TreeScanner {
    /// Build a scanner for `root`, compiling ignore patterns from the config
    /// and from a `.redraftignore` file at the root when present.
    pub fn new(root: impl Into<PathBuf>, config: &Config) -> Result<Self> {
        let root = root.into();
        let overlay = build_ignore_overlay(&root, config)?;
        Ok(Self { root, overlay })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Every tracked file, relative to the root, sorted by path.
    pub fn tracked_files(&self) -> Vec<PathBuf> {
        let mut builder = WalkBuilder::new(&self.root);
        builder.git_ignore(true).hidden(true);

        let root = self.root.clone();
        let overlay = self.overlay.clone();
        builder.filter_entry(move |entry| {
            if entry.depth() == 0 {
                return true;
            }
            let rel = entry.path().strip_prefix(&root).unwrap_or(entry.path());
            !overlay.is_match(rel)
        });

        let mut files = Vec::new();
        for result in builder.build() {
            let entry = match result {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::warn!(error = %err, "scanner error");
                    continue;
                }
            };
            if !entry.file_type().is_some_and(|kind| kind.is_file()) {
                continue;
            }
            let rel = entry
                .path()
                .strip_prefix(&self.root)
                .unwrap_or(entry.path());
            files.push(rel.to_path_buf());
        }

        files.sort();
        files
    }

    /// Render the tracked tree as indented text, directories first.
    pub fn render(&self) -> String {
        let mut tree = Node::default();
        for file in self.tracked_files() {
            tree.insert(&file);
        }

        let name = self
            .root
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(".");
        let mut lines = vec![format!("{name}/")];
        tree.render("", &mut lines);
        lines.join("\n")
    }
}

#[derive(Default)]
struct Node {
    dirs: BTreeMap<String, Node>,
    files: BTreeSet<String>,
}

impl Node {
    fn insert(&mut self, path: &Path) {
        let components: Vec<String> = path
            .iter()
            .map(|component| component.to_string_lossy().into_owned())
            .collect();
        let Some((file, dirs)) = components.split_last() else {
            return;
        };

        let mut node = self;
        for dir in dirs {
            node = node.dirs.entry(dir.clone()).or_default();
        }
        node.files.insert(file.clone());
    }

    fn render(&self, prefix: &str, lines: &mut Vec<String>) {
        let total = self.dirs.len() + self.files.len();
        let mut index = 0;

        for (name, node) in &self.dirs {
            index += 1;
            let is_last = index == total;
            let connector = if is_last { "└── " } else { "├── " };
            lines.push(format!("{prefix}{connector}{name}/"));
            let extension = if is_last { "    " } else { "│   " };
            node.render(&format!("{prefix}{extension}"), lines);
        }

        for name in &self.files {
            index += 1;
            let connector = if index == total { "└── " } else { "├── " };
            lines.push(format!("{prefix}{connector}{name}"));
        }
    }
}

fn build_ignore_overlay(root: &Path, config: &Config) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();

    for pattern in &config.ignore.paths {
        for expanded in expand_dir_pattern(pattern) {
            let glob = Glob::new(&expanded).context("invalid ignore path pattern")?;
            builder.add(glob);
        }
    }

    for glob in &config.ignore.globs {
        let glob = Glob::new(glob).context("invalid ignore glob")?;
        builder.add(glob);
    }

    for pattern in load_redraftignore(root)? {
        for expanded in expand_dir_pattern(&pattern) {
            let glob = Glob::new(&expanded).context("invalid .redraftignore pattern")?;
            builder.add(glob);
        }
    }

    // Always ignore the ignore file itself.
    builder.add(Glob::new(REDRAFT_IGNORE)?);

    builder.build().context("failed to build ignore overlay")
}

fn expand_dir_pattern(raw: &str) -> Vec<String> {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        return Vec::new();
    }
    vec![
        trimmed.to_owned(),
        format!("{trimmed}/**"),
        format!("**/{trimmed}"),
        format!("**/{trimmed}/**"),
    ]
}

fn load_redraftignore(root: &Path) -> Result<Vec<String>> {
    let path = root.join(REDRAFT_IGNORE);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let reader = BufReader::new(file);
    let mut patterns = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        patterns.push(trimmed.to_owned());
    }
    Ok(patterns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn respects_ignore_paths_and_globs() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();

        fs::create_dir_all(root.join("src"))?;
        fs::create_dir_all(root.join("skipme"))?;
        fs::write(root.join("src/lib.rs"), b"fn lib() {}")?;
        fs::write(root.join("skipme/file.txt"), b"ignored")?;
        fs::write(root.join("Cargo.lock"), b"lock")?;

        let mut config = Config::default();
        config.ignore.paths.push("skipme/".into());

        let scanner = TreeScanner::new(root, &config)?;
        let files: Vec<String> = scanner
            .tracked_files()
            .iter()
            .map(|path| path.display().to_string())
            .collect();

        assert!(files.contains(&"src/lib.rs".to_string()));
        assert!(!files.iter().any(|path| path.contains("skipme")));
        assert!(!files.iter().any(|path| path.ends_with("Cargo.lock")));
        Ok(())
    }

    #[test]
    fn respects_redraftignore() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();

        fs::create_dir_all(root.join("generated"))?;
        fs::create_dir_all(root.join("src"))?;
        fs::write(root.join("generated/output.txt"), b"not included")?;
        fs::write(root.join("src/main.rs"), b"fn main() {}")?;
        fs::write(root.join(REDRAFT_IGNORE), "generated/\n")?;

        let scanner = TreeScanner::new(root, &Config::default())?;
        let files: Vec<String> = scanner
            .tracked_files()
            .iter()
            .map(|path| path.display().to_string())
            .collect();

        assert!(files.contains(&"src/main.rs".to_string()));
        assert!(!files.iter().any(|path| path.starts_with("generated")));
        assert!(!files.contains(&REDRAFT_IGNORE.to_string()));
        Ok(())
    }

    #[test]
    fn renders_directories_before_files_with_connectors() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();

        fs::create_dir_all(root.join("src"))?;
        fs::write(root.join("src/main.rs"), b"fn main() {}")?;
        fs::write(root.join("README.md"), b"# readme")?;

        let scanner = TreeScanner::new(root, &Config::default())?;
        let rendered = scanner.render();
        let lines: Vec<&str> = rendered.lines().collect();

        assert!(lines[0].ends_with('/'));
        assert_eq!(lines[1], "├── src/");
        assert_eq!(lines[2], "│   └── main.rs");
        assert_eq!(lines[3], "└── README.md");
        Ok(())
    }

    #[test]
    fn hidden_files_are_not_tracked() -> Result<()> {
        let temp = tempfile::tempdir()?;
        let root = temp.path();

        fs::write(root.join(".secret"), b"hidden")?;
        fs::write(root.join("visible.txt"), b"shown")?;

        let scanner = TreeScanner::new(root, &Config::default())?;
        let files: Vec<String> = scanner
            .tracked_files()
            .iter()
            .map(|path| path.display().to_string())
            .collect();

        assert_eq!(files, vec!["visible.txt".to_string()]);
        Ok(())
    }
}
