//! Managing the set of files included in outbound prompt context.

use std::collections::HashSet;
use std::path::{Component, Path, PathBuf};

/// Ordered, duplicate-free set of relative file paths.
///
/// Insertion order is preserved and significant: the prompt builder renders
/// files in the order they were selected. Membership is tested against the
/// normalized form of a path, so `./src/lib.rs` and `src/lib.rs` are the same
/// entry.
#[derive(Debug, Default, Clone)]
pub struct SelectionSet {
    paths: Vec<PathBuf>,
}

impl SelectionSet {
    /// Create an empty selection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of selected paths.
    pub fn len(&self) -> usize {
        self.paths.len()
    }

    /// Returns whether the selection is empty.
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// Access the selected paths in insertion order.
    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Returns whether the normalized form of `path` is already selected.
    pub fn contains(&self, path: impl AsRef<Path>) -> bool {
        let normalized = normalize(path.as_ref());
        self.paths.iter().any(|existing| *existing == normalized)
    }

    /// Append `path` if its normalized form is absent. Idempotent: adding a
    /// path that is already present leaves the selection unchanged.
    ///
    /// Returns `true` when the selection grew.
    pub fn add(&mut self, path: impl AsRef<Path>) -> bool {
        let normalized = normalize(path.as_ref());
        if self.paths.iter().any(|existing| *existing == normalized) {
            return false;
        }
        self.paths.push(normalized);
        true
    }

    /// Bulk variant of [`SelectionSet::add`]; each candidate is independently
    /// subject to the same idempotent insert. Returns how many were added.
    pub fn add_all<I, P>(&mut self, candidates: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: AsRef<Path>,
    {
        candidates
            .into_iter()
            .filter(|candidate| self.add(candidate))
            .count()
    }

    /// Remove every entry whose string form is in `targets`. Entries in
    /// `targets` that match nothing are silently ignored.
    ///
    /// Returns how many entries were removed.
    pub fn remove(&mut self, targets: &HashSet<String>) -> usize {
        let normalized: HashSet<PathBuf> = targets
            .iter()
            .map(|target| normalize(Path::new(target)))
            .collect();
        let original_len = self.paths.len();
        self.paths.retain(|path| !normalized.contains(path));
        original_len - self.paths.len()
    }

    /// Remove all entries.
    pub fn clear(&mut self) {
        self.paths.clear();
    }
}

/// Strip `.` components so equivalent spellings of a relative path compare
/// equal. `..` components are kept as written: the selection does not resolve
/// against the filesystem.
fn normalize(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            other => normalized.push(other.as_os_str()),
        }
    }
    if normalized.as_os_str().is_empty() {
        normalized.push(".");
    }
    normalized
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_is_idempotent() {
        let mut selection = SelectionSet::new();
        assert!(selection.add("src/lib.rs"));
        assert!(!selection.add("src/lib.rs"));
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn add_deduplicates_by_normalized_path() {
        let mut selection = SelectionSet::new();
        selection.add("./src/lib.rs");
        selection.add("src/lib.rs");
        assert_eq!(selection.len(), 1);
        assert!(selection.contains("./src/./lib.rs"));
    }

    #[test]
    fn insertion_order_is_preserved() {
        let mut selection = SelectionSet::new();
        selection.add("b.rs");
        selection.add("a.rs");
        selection.add("c.rs");
        let order: Vec<_> = selection
            .paths()
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        assert_eq!(order, vec!["b.rs", "a.rs", "c.rs"]);
    }

    #[test]
    fn add_all_reports_how_many_were_new() {
        let mut selection = SelectionSet::new();
        selection.add("a.rs");
        let added = selection.add_all(["a.rs", "b.rs", "b.rs", "c.rs"]);
        assert_eq!(added, 2);
        assert_eq!(selection.len(), 3);
    }

    #[test]
    fn remove_absent_path_is_a_noop() {
        let mut selection = SelectionSet::new();
        selection.add("a.rs");
        let removed = selection.remove(&HashSet::from(["missing.rs".to_string()]));
        assert_eq!(removed, 0);
        assert_eq!(selection.len(), 1);
    }

    #[test]
    fn remove_drops_matching_entries_only() {
        let mut selection = SelectionSet::new();
        selection.add("a.rs");
        selection.add("b.rs");
        selection.add("c.rs");
        let removed = selection.remove(&HashSet::from(["./b.rs".to_string()]));
        assert_eq!(removed, 1);
        assert!(!selection.contains("b.rs"));
        assert_eq!(selection.len(), 2);
    }
}
