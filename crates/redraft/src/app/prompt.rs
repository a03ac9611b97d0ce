//! Building the outbound prompt from the active selection.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, anyhow};
use minijinja::Environment;
use serde::Serialize;

use crate::app::selection::SelectionSet;
use crate::infra::config::Config;

/// Name of the built-in prompt template.
const DEFAULT_TEMPLATE_NAME: &str = "prompt_context";

/// Prefix, then the tree snapshot when enabled, then one delimited block per
/// selected file. Inline tags keep the rendering byte-deterministic.
const DEFAULT_TEMPLATE: &str = "{{ prefix }}{% if tree %}{{ tree }}{% endif %}\
{% for file in files %}\n### {{ file.path }} ###\n{{ file.contents }}{% endfor %}";

/// Runtime options controlling prompt rendering.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub prefix: String,
    pub include_tree: bool,
    pub template: String,
}

impl PromptOptions {
    /// Build options from configuration defaults.
    pub fn from_config(config: &Config) -> Self {
        Self {
            prefix: config.prompts.prefix(),
            include_tree: config.defaults.show_tree,
            template: config.prompts.template(),
        }
    }
}

/// Renders the selection into a single prompt string.
///
/// File contents are read fresh from disk on every render so the prompt
/// always reflects current state; nothing is cached across selection
/// mutations. Any unreadable file aborts the whole render.
pub struct PromptBuilder {
    env: Environment<'static>,
}

impl PromptBuilder {
    /// Create a builder with the built-in template registered.
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        env.add_template(DEFAULT_TEMPLATE_NAME, DEFAULT_TEMPLATE)
            .map_err(|err| anyhow!("failed to register built-in prompt template: {err}"))?;
        Ok(Self { env })
    }

    /// Render the prompt for `selection`, resolving each path against `root`.
    pub fn render(
        &self,
        root: &Path,
        selection: &SelectionSet,
        tree: &str,
        options: &PromptOptions,
    ) -> Result<String> {
        let mut files = Vec::with_capacity(selection.len());
        for path in selection.paths() {
            let contents = fs::read_to_string(root.join(path))
                .with_context(|| format!("failed to read selected file {}", path.display()))?;
            files.push(TemplateFile {
                path: path.display().to_string(),
                contents,
            });
        }

        let context = TemplateContext {
            prefix: options.prefix.clone(),
            tree: options.include_tree.then(|| tree.to_string()),
            files,
        };
        self.render_with_template(&context, &options.template)
    }

    fn render_with_template(&self, context: &TemplateContext, template_name: &str) -> Result<String> {
        if let Ok(template) = self.env.get_template(template_name) {
            return template
                .render(context)
                .map_err(|err| anyhow!("failed to render template '{template_name}': {err}"));
        }

        // Fall back to treating the name as a template file on disk.
        let template_path = Path::new(template_name);
        if template_path.exists() {
            let source = fs::read_to_string(template_path).with_context(|| {
                format!("failed to load template from {}", template_path.display())
            })?;
            let mut env = Environment::new();
            env.add_template("external", &source)
                .map_err(|err| anyhow!("invalid template '{template_name}': {err}"))?;
            return env
                .get_template("external")
                .expect("template registered above")
                .render(context)
                .map_err(|err| anyhow!("failed to render template '{template_name}': {err}"));
        }

        Err(anyhow!(
            "template '{template_name}' not found (built-in or filesystem)"
        ))
    }
}

#[derive(Serialize)]
struct TemplateContext {
    prefix: String,
    tree: Option<String>,
    files: Vec<TemplateFile>,
}

#[derive(Serialize)]
struct TemplateFile {
    path: String,
    contents: String,
}
