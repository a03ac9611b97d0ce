//! Line-oriented interactive session.

use std::collections::HashSet;
use std::path::PathBuf;
use std::thread;

use anyhow::{Context, Result};
use reedline::{DefaultPrompt, DefaultPromptSegment, Reedline, Signal};

use crate::app::command::{self, Command};
use crate::app::pipeline::{Pipeline, PipelineError, PipelineReport};
use crate::app::prompt::{PromptBuilder, PromptOptions};
use crate::app::selection::SelectionSet;
use crate::app::tokens::estimate_prompt;
use crate::domain::model::ApplyStatus;
use crate::infra::clipboard::Clipboard;
use crate::infra::config::Config;
use crate::infra::generate::HttpBackend;
use crate::infra::shell;
use crate::infra::tree::TreeScanner;

enum Flow {
    Continue,
    Quit,
}

/// Owns the selection and drives commands against the pipeline.
pub struct Repl {
    root: PathBuf,
    config: Config,
    selection: SelectionSet,
    scanner: TreeScanner,
    prompt_builder: PromptBuilder,
    clipboard: Clipboard,
    backend: HttpBackend,
}

impl Repl {
    pub fn new(root: PathBuf, config: Config) -> Result<Self> {
        let scanner = TreeScanner::new(&root, &config)?;
        let backend =
            HttpBackend::from_config(&config).context("failed to initialize generation client")?;
        Ok(Self {
            root,
            selection: SelectionSet::new(),
            scanner,
            prompt_builder: PromptBuilder::new()?,
            clipboard: Clipboard::new(),
            backend,
            config,
        })
    }

    /// Enter the read-eval loop until the user quits.
    pub fn run(&mut self) -> Result<()> {
        self.seed_default_selection();
        self.show_selection();

        let mut editor = Reedline::create();
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("redraft".into()),
            DefaultPromptSegment::Empty,
        );

        loop {
            match editor.read_line(&prompt) {
                Ok(Signal::Success(buffer)) => {
                    if buffer.trim().is_empty() {
                        continue;
                    }
                    match self.dispatch(&buffer) {
                        Ok(Flow::Quit) => break,
                        Ok(Flow::Continue) => {}
                        Err(err) => println!("error: {err:#}"),
                    }
                }
                Ok(Signal::CtrlC) | Ok(Signal::CtrlD) => break,
                Err(err) => {
                    tracing::error!(error = %err, "readline failure");
                    break;
                }
            }
        }
        Ok(())
    }

    /// Select configured default files that actually exist.
    fn seed_default_selection(&mut self) {
        let defaults = self.config.defaults.default_files.clone();
        for file in defaults {
            if self.root.join(&file).is_file() {
                self.selection.add(&file);
            }
        }
    }

    fn dispatch(&mut self, raw: &str) -> Result<Flow> {
        let decoded = match command::parse_command(raw) {
            Ok(decoded) => decoded,
            Err(err) => {
                println!("{err}");
                return Ok(Flow::Continue);
            }
        };

        match decoded {
            Command::Add(paths) => self.add_paths(paths),
            Command::Remove(paths) => self.remove_paths(paths),
            Command::EstimateTokens => self.estimate_tokens()?,
            Command::CopyPrompt => self.copy_prompt()?,
            Command::ApplyPaste => self.apply_from_clipboard()?,
            Command::Shell(cmd) => {
                println!("$ {cmd}");
                print!("{}", shell::run(&cmd)?);
            }
            Command::Help => println!("{}", command::help_text()),
            Command::Quit => return Ok(Flow::Quit),
            Command::Echo(text) => println!("{text}"),
        }
        Ok(Flow::Continue)
    }

    fn add_paths(&mut self, paths: Vec<String>) {
        let mut candidates: Vec<PathBuf> = Vec::new();
        for path in paths {
            if path == "." {
                candidates.extend(self.scanner.tracked_files());
            } else {
                candidates.push(PathBuf::from(path));
            }
        }

        let before = self.selection.len();
        for candidate in candidates {
            if self.root.join(&candidate).is_file() {
                self.selection.add(&candidate);
            } else {
                println!("skipping {} (not a file)", candidate.display());
            }
        }
        println!("added {} file(s)", self.selection.len() - before);
        self.show_selection();
    }

    fn remove_paths(&mut self, paths: Vec<String>) {
        let targets: HashSet<String> = paths.into_iter().collect();
        let removed = self.selection.remove(&targets);
        println!("removed {removed} file(s)");
        self.show_selection();
    }

    fn estimate_tokens(&self) -> Result<()> {
        let prompt = self.build_prompt()?;
        let estimate = estimate_prompt(&prompt);
        let qualifier = if estimate.exact { "" } else { "~" };
        println!(
            "{qualifier}{} tokens ({} characters)",
            estimate.tokens, estimate.characters
        );
        Ok(())
    }

    fn copy_prompt(&mut self) -> Result<()> {
        let prompt = self.build_prompt()?;
        self.clipboard.copy(&prompt)?;
        println!("prompt copied to clipboard");
        Ok(())
    }

    /// Paste instructions and run the full apply pipeline.
    ///
    /// The run happens on a worker thread: the generation calls block on the
    /// network and do not belong on the thread driving the terminal. Stages
    /// stay strictly sequential inside the run.
    fn apply_from_clipboard(&mut self) -> Result<()> {
        let instructions = self.clipboard.paste()?;
        if instructions.trim().is_empty() {
            println!("clipboard is empty; nothing to apply");
            return Ok(());
        }
        println!("pasted instructions:\n{instructions}");

        let tree = self.scanner.render();
        let backend = &self.backend;
        let config = &self.config;
        let root = self.root.clone();

        let result = thread::scope(|scope| {
            scope
                .spawn(move || {
                    let mut pipeline = Pipeline::new(backend, config, root);
                    pipeline.run(&tree, &instructions)
                })
                .join()
                .expect("pipeline thread panicked")
        });

        match result {
            Ok(report) => self.show_report(&report),
            Err(PipelineError::PickerFormat { raw }) => {
                println!("picker did not return a JSON array of file paths; raw response:");
                println!("{raw}");
            }
            Err(err) => println!("apply aborted: {err}"),
        }
        Ok(())
    }

    fn show_report(&self, report: &PipelineReport) {
        println!("picker chose: {:?}", report.picked);
        println!("{}", report.response);

        if report.outcomes.is_empty() {
            println!("no file listings found in the response");
            return;
        }
        for outcome in &report.outcomes {
            match outcome.status {
                ApplyStatus::Written => println!("updated {}", outcome.path),
                ApplyStatus::Failed => println!(
                    "failed {}: {}",
                    outcome.path,
                    outcome.error.as_deref().unwrap_or("unknown error")
                ),
            }
        }
    }

    fn build_prompt(&self) -> Result<String> {
        let options = PromptOptions::from_config(&self.config);
        let tree = if options.include_tree {
            self.scanner.render()
        } else {
            String::new()
        };
        self.prompt_builder
            .render(&self.root, &self.selection, &tree, &options)
    }

    fn show_selection(&self) {
        if self.selection.is_empty() {
            println!("no files selected");
            return;
        }
        for path in self.selection.paths() {
            println!("  {}", path.display());
        }
    }
}
