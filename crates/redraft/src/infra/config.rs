//! Configuration management utilities.

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use dirs_next::config_dir;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

static DEFAULT_CONFIG: Lazy<&'static str> =
    Lazy::new(|| include_str!("../../assets/default-config.toml"));
static DEFAULT_WORKSPACE_CONFIG_PATH: &str = ".redraft/config.toml";

/// Layered configuration loaded from defaults, user, workspace, and env.
///
/// Constructed once at startup and passed by reference into every component
/// that needs a model identifier, credential, or prompt string; nothing reads
/// configuration state globally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub defaults: Defaults,
    #[serde(default)]
    pub prompts: Prompts,
    #[serde(default)]
    pub ignore: Ignore,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Defaults {
    /// Model identifier passed through to the generation endpoint.
    #[serde(default = "Defaults::default_model")]
    pub model: String,
    /// Chat-completions endpoint URL.
    #[serde(default = "Defaults::default_endpoint")]
    pub endpoint: String,
    /// Credential value; `$VAR` resolves against the environment.
    #[serde(default = "Defaults::default_api_key")]
    pub api_key: String,
    /// Whether the prompt includes the directory tree before file contents.
    #[serde(default = "Defaults::default_show_tree")]
    pub show_tree: bool,
    /// Paths selected automatically at startup when they exist.
    #[serde(default = "Defaults::default_files")]
    pub default_files: Vec<String>,
}

impl Defaults {
    fn default_model() -> String {
        "gpt-4o-mini".to_owned()
    }

    fn default_endpoint() -> String {
        "https://api.openai.com/v1/chat/completions".to_owned()
    }

    fn default_api_key() -> String {
        "$OPENAI_API_KEY".to_owned()
    }

    fn default_show_tree() -> bool {
        true
    }

    fn default_files() -> Vec<String> {
        vec!["README.md".to_owned()]
    }
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            model: Self::default_model(),
            endpoint: Self::default_endpoint(),
            api_key: Self::default_api_key(),
            show_tree: Self::default_show_tree(),
            default_files: Self::default_files(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Prompts {
    #[serde(default)]
    prefix: Option<String>,
    #[serde(default)]
    picker: Option<String>,
    #[serde(default)]
    editor: Option<String>,
    #[serde(default)]
    template: Option<String>,
}

impl Prompts {
    fn default_prefix() -> &'static str {
        "Here are the files in my folder:\n"
    }

    fn default_picker() -> &'static str {
        "You are a highly accurate file selector. You will receive a directory \
         tree and a set of user instructions describing code edits. Return ONLY \
         a JSON array of file paths (as strings) that the edits apply to. If the \
         user needs to create a brand-new file, include the intended path for \
         that new file in the array. Do NOT include anything else - no prose, no \
         code fences, no comments."
    }

    fn default_editor() -> &'static str {
        "You are an expert file editor. You will be given the contents of \
         various files and edits to make, and you must format the edits in a \
         machine-readable way, by providing the WHOLE edited file.\n\n\
         To suggest changes to a file you MUST return the entire content of the \
         updated file.\n\
         You MUST use this *file listing* format:\n\n\
         path/to/filename.js\n\
         ```\n\
         // entire file content ...\n\
         // ... goes in between\n\
         ```\n\n\
         Every *file listing* MUST use this format:\n\
         - First line: the filename with any originally provided path; no extra \
         markup, punctuation, comments, etc. JUST the filename with path.\n\
         - Second line: opening ```\n\
         - ... entire content of the file ...\n\
         - Final line: closing ```\n\n\
         *NEVER* skip, omit or elide content from a *file listing* using \"...\" \
         or by adding comments like \"... rest of code...\"!\n\
         To create a new file you MUST return a *file listing* which includes an \
         appropriate filename, including any appropriate path. DO NOT provide a \
         patch."
    }

    fn default_template() -> &'static str {
        "prompt_context"
    }

    /// Text emitted before everything else in the rendered prompt.
    pub fn prefix(&self) -> String {
        self.prefix
            .clone()
            .unwrap_or_else(|| Self::default_prefix().to_owned())
    }

    /// System instruction for the path-selecting stage.
    pub fn picker(&self) -> String {
        self.picker
            .clone()
            .unwrap_or_else(|| Self::default_picker().to_owned())
    }

    /// System instruction for the content-producing stage.
    pub fn editor(&self) -> String {
        self.editor
            .clone()
            .unwrap_or_else(|| Self::default_editor().to_owned())
    }

    /// Prompt template name (built-in) or path (filesystem override).
    pub fn template(&self) -> String {
        self.template
            .clone()
            .unwrap_or_else(|| Self::default_template().to_owned())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ignore {
    #[serde(default)]
    pub paths: Vec<String>,
    #[serde(default)]
    pub globs: Vec<String>,
}

impl Default for Ignore {
    fn default() -> Self {
        Self {
            paths: vec![
                "target/".into(),
                "node_modules/".into(),
                "dist/".into(),
                ".git/".into(),
            ],
            globs: vec!["*.min.js".into(), "*.lock".into()],
        }
    }
}

/// Environment overrides for critical settings.
#[derive(Debug, Default, Clone)]
pub struct EnvOverrides {
    model: Option<String>,
    api_key: Option<String>,
}

impl EnvOverrides {
    fn from_env() -> Self {
        Self {
            model: env::var("REDRAFT_MODEL").ok(),
            api_key: env::var("REDRAFT_API_KEY").ok(),
        }
    }

    #[cfg(test)]
    fn for_tests(model: &str, api_key: &str) -> Self {
        Self {
            model: Some(model.to_owned()),
            api_key: Some(api_key.to_owned()),
        }
    }
}

impl Config {
    /// Load configuration from defaults, user/global config, workspace config, and env overrides.
    pub fn load() -> Result<Self> {
        let env = EnvOverrides::from_env();
        let global = global_config_path();
        let workspace = workspace_config_path()?;
        Self::load_with_layers(global, workspace, env)
    }

    /// Resolve the configured credential.
    ///
    /// `$VAR` reads `VAR` from the environment (empty when unset); a leading
    /// `\$` escapes to a literal dollar value.
    pub fn resolved_api_key(&self) -> String {
        let raw = self.defaults.api_key.as_str();
        if let Some(literal) = raw.strip_prefix("\\$") {
            return format!("${literal}");
        }
        if let Some(var) = raw.strip_prefix('$') {
            return env::var(var).unwrap_or_default();
        }
        raw.to_owned()
    }

    fn load_with_layers(
        global: Option<PathBuf>,
        workspace: Option<PathBuf>,
        env_overrides: EnvOverrides,
    ) -> Result<Self> {
        let mut layers: Vec<Config> = Vec::new();

        layers.push(Self::from_str(&DEFAULT_CONFIG)?);

        if let Some(global_path) = global.filter(|path| path.exists()) {
            layers.push(Self::from_file(&global_path)?);
        }

        if let Some(workspace_path) = workspace.filter(|path| path.exists()) {
            layers.push(Self::from_file(&workspace_path)?);
        }

        let merged = layers.into_iter().reduce(Config::merge).unwrap_or_default();
        Ok(apply_env_overrides(merged, env_overrides))
    }

    fn from_file(path: &Path) -> Result<Self> {
        let data = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_str(&data)
    }

    fn from_str(contents: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(contents).with_context(|| "failed to parse TOML config".to_string())?;
        Ok(config)
    }

    fn merge(self, other: Self) -> Self {
        Self {
            defaults: merge_defaults(self.defaults, other.defaults),
            prompts: merge_prompts(self.prompts, other.prompts),
            ignore: merge_ignore(self.ignore, other.ignore),
        }
    }
}

fn merge_defaults(base: Defaults, overlay: Defaults) -> Defaults {
    Defaults {
        model: if overlay.model != Defaults::default_model() {
            overlay.model
        } else {
            base.model
        },
        endpoint: if overlay.endpoint != Defaults::default_endpoint() {
            overlay.endpoint
        } else {
            base.endpoint
        },
        api_key: if overlay.api_key != Defaults::default_api_key() {
            overlay.api_key
        } else {
            base.api_key
        },
        show_tree: if overlay.show_tree != Defaults::default_show_tree() {
            overlay.show_tree
        } else {
            base.show_tree
        },
        default_files: if overlay.default_files != Defaults::default_files() {
            overlay.default_files
        } else {
            base.default_files
        },
    }
}

fn merge_prompts(mut base: Prompts, overlay: Prompts) -> Prompts {
    if let Some(value) = overlay.prefix {
        base.prefix = Some(value);
    }
    if let Some(value) = overlay.picker {
        base.picker = Some(value);
    }
    if let Some(value) = overlay.editor {
        base.editor = Some(value);
    }
    if let Some(value) = overlay.template {
        base.template = Some(value);
    }
    base
}

fn merge_ignore(base: Ignore, overlay: Ignore) -> Ignore {
    let mut paths: BTreeSet<String> = base.paths.into_iter().collect();
    paths.extend(overlay.paths);

    let mut globs: BTreeSet<String> = base.globs.into_iter().collect();
    globs.extend(overlay.globs);

    Ignore {
        paths: paths.into_iter().collect(),
        globs: globs.into_iter().collect(),
    }
}

fn global_config_path() -> Option<PathBuf> {
    config_dir().map(|base| base.join("redraft/config.toml"))
}

fn workspace_config_path() -> Result<Option<PathBuf>> {
    let cwd = env::current_dir()?;
    let root = find_repo_root(&cwd).unwrap_or(cwd);
    Ok(Some(root.join(DEFAULT_WORKSPACE_CONFIG_PATH)))
}

fn find_repo_root(start: &Path) -> Option<PathBuf> {
    let mut current = start;
    loop {
        if current.join(".git").exists() {
            return Some(current.to_path_buf());
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return None,
        }
    }
}

fn apply_env_overrides(mut config: Config, env: EnvOverrides) -> Config {
    if let Some(model) = env.model {
        config.defaults.model = model;
    }
    if let Some(api_key) = env.api_key {
        config.defaults.api_key = api_key;
    }
    config
}
