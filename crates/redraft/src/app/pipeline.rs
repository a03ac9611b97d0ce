//! The two-stage apply pipeline.
//!
//! One run sequences: pick paths, load their current contents, generate
//! replacement listings, parse them, write them out. The two generation
//! calls form a simple saga: nothing touches the filesystem until the
//! applying phase, so an abort before that point needs no compensation.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;

use crate::app::apply::Applier;
use crate::app::listing::parse_listings;
use crate::domain::model::ApplyOutcome;
use crate::infra::config::Config;
use crate::infra::generate::{ChatMessage, GenerationBackend, TransportError};

/// Observable pipeline state.
///
/// `Applying` never transitions to `Aborted`: once listings exist every one
/// is attempted and the run ends in `Done`, even if every write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    Idle,
    PickingFiles,
    LoadingContent,
    Editing,
    Parsing,
    Applying,
    Done,
    Aborted,
}

/// Fatal failure of a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// The picker stage did not return a JSON array of path strings. The raw
    /// response text is preserved for diagnostic display.
    #[error("picker did not return a JSON array of file paths")]
    PickerFormat { raw: String },
}

/// Result of a completed run.
#[derive(Debug)]
pub struct PipelineReport {
    /// Paths the picker stage selected, in response order, not deduplicated.
    pub picked: Vec<String>,
    /// Raw editor stage response, as handed to the listing parser.
    pub response: String,
    /// One outcome per parsed listing, in parse order.
    pub outcomes: Vec<ApplyOutcome>,
}

/// Sequences one apply operation end to end.
///
/// Only one run can be in flight at a time: `run` takes `&mut self` and the
/// driver owns a single pipeline.
pub struct Pipeline<'a> {
    backend: &'a dyn GenerationBackend,
    config: &'a Config,
    applier: Applier,
    phase: PipelinePhase,
}

impl<'a> Pipeline<'a> {
    pub fn new(backend: &'a dyn GenerationBackend, config: &'a Config, root: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            config,
            applier: Applier::new(root),
            phase: PipelinePhase::Idle,
        }
    }

    /// Current phase, for status display.
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Run the full pipeline for one set of edit instructions.
    ///
    /// `tree` is the directory snapshot handed to the picker stage verbatim.
    /// A transport failure at either stage, or a malformed picker response,
    /// aborts the run before any file is written.
    pub fn run(&mut self, tree: &str, instructions: &str) -> Result<PipelineReport, PipelineError> {
        match self.run_stages(tree, instructions) {
            Ok(report) => {
                self.enter(PipelinePhase::Done);
                Ok(report)
            }
            Err(err) => {
                self.enter(PipelinePhase::Aborted);
                Err(err)
            }
        }
    }

    fn run_stages(
        &mut self,
        tree: &str,
        instructions: &str,
    ) -> Result<PipelineReport, PipelineError> {
        self.enter(PipelinePhase::PickingFiles);
        let picked = self.pick_paths(tree, instructions)?;

        self.enter(PipelinePhase::LoadingContent);
        let files = self.load_contents(&picked);

        self.enter(PipelinePhase::Editing);
        let response = self.edit_files(instructions, &files)?;

        self.enter(PipelinePhase::Parsing);
        let listings = parse_listings(&response);
        tracing::info!(count = listings.len(), "parsed listings");

        self.enter(PipelinePhase::Applying);
        let outcomes = self.applier.apply(&listings);

        Ok(PipelineReport {
            picked,
            response,
            outcomes,
        })
    }

    /// Picker stage: tree + instructions in, JSON array of paths out.
    fn pick_paths(&self, tree: &str, instructions: &str) -> Result<Vec<String>, PipelineError> {
        let messages = [
            ChatMessage::system(self.config.prompts.picker()),
            ChatMessage::user(format!(
                "DIRECTORY TREE:\n{tree}\n\nUSER INSTRUCTIONS:\n{instructions}"
            )),
        ];
        let raw = self.backend.complete(&messages)?;

        serde_json::from_str::<Vec<String>>(&raw)
            .map_err(|_| PipelineError::PickerFormat { raw })
    }

    /// Picked paths may not exist yet; those load as empty content, which
    /// tells the editor stage the file is new.
    fn load_contents(&self, picked: &[String]) -> Vec<(String, String)> {
        picked
            .iter()
            .map(|path| {
                let contents =
                    fs::read_to_string(self.applier.root().join(path)).unwrap_or_default();
                (path.clone(), contents)
            })
            .collect()
    }

    /// Editor stage: instructions plus current file contents in, free text
    /// containing zero or more listings out. No structural validation here.
    fn edit_files(
        &self,
        instructions: &str,
        files: &[(String, String)],
    ) -> Result<String, PipelineError> {
        let payload = files
            .iter()
            .map(|(path, contents)| format!("### {path}\n{contents}"))
            .collect::<Vec<_>>()
            .join("\n\n");

        let messages = [
            ChatMessage::system(self.config.prompts.editor()),
            ChatMessage::user(format!("{instructions}\n\n--- FILES ---\n{payload}")),
        ];
        Ok(self.backend.complete(&messages)?)
    }

    fn enter(&mut self, phase: PipelinePhase) {
        tracing::info!(?phase, "pipeline phase");
        self.phase = phase;
    }
}
