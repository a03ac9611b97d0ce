use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::fs;

use redraft::app::pipeline::{Pipeline, PipelineError, PipelinePhase};
use redraft::app::prompt::{PromptBuilder, PromptOptions};
use redraft::app::selection::SelectionSet;
use redraft::domain::model::ApplyStatus;
use redraft::infra::config::Config;
use redraft::infra::generate::{ChatMessage, GenerationBackend, TransportError};

struct ScriptedBackend {
    script: RefCell<VecDeque<Result<String, ()>>>,
    calls: Cell<usize>,
}

impl ScriptedBackend {
    fn new(script: Vec<Result<String, ()>>) -> Self {
        Self {
            script: RefCell::new(script.into()),
            calls: Cell::new(0),
        }
    }
}

impl GenerationBackend for ScriptedBackend {
    fn complete(&self, _messages: &[ChatMessage]) -> Result<String, TransportError> {
        self.calls.set(self.calls.get() + 1);
        match self.script.borrow_mut().pop_front() {
            Some(Ok(text)) => Ok(text),
            Some(Err(())) => Err(TransportError::EmptyCompletion),
            None => panic!("backend called more times than scripted"),
        }
    }
}

#[test]
fn prompt_then_pipeline_round_trip_updates_the_workspace() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("README.md"), "# old readme\n").unwrap();

    // Build the outbound prompt the way the interactive surface would.
    let mut selection = SelectionSet::new();
    selection.add("README.md");

    let config = Config::default();
    let builder = PromptBuilder::new().unwrap();
    let mut options = PromptOptions::from_config(&config);
    options.include_tree = false;
    let prompt = builder
        .render(temp.path(), &selection, "", &options)
        .unwrap();
    assert!(prompt.contains("### README.md ###"));
    assert!(prompt.contains("# old readme"));

    // Apply a response that rewrites the readme and creates a new file.
    let backend = ScriptedBackend::new(vec![
        Ok(r#"["README.md", "docs/usage.md"]"#.to_string()),
        Ok("README.md\n```\n# new readme\n```\n\
            docs/usage.md\n```\nSee the readme.\n```\n"
            .to_string()),
    ]);
    let mut pipeline = Pipeline::new(&backend, &config, temp.path());
    let report = pipeline.run("tree", "rewrite the readme").unwrap();

    assert_eq!(pipeline.phase(), PipelinePhase::Done);
    assert_eq!(report.outcomes.len(), 2);
    assert!(report
        .outcomes
        .iter()
        .all(|outcome| outcome.status == ApplyStatus::Written));

    assert_eq!(
        fs::read_to_string(temp.path().join("README.md")).unwrap(),
        "# new readme"
    );
    assert_eq!(
        fs::read_to_string(temp.path().join("docs/usage.md")).unwrap(),
        "See the readme."
    );
}

#[test]
fn picker_failure_leaves_the_workspace_untouched() {
    let temp = tempfile::tempdir().unwrap();
    fs::write(temp.path().join("README.md"), "# untouched\n").unwrap();

    let backend = ScriptedBackend::new(vec![Ok("I think you want README.md".to_string())]);
    let config = Config::default();
    let mut pipeline = Pipeline::new(&backend, &config, temp.path());

    let err = pipeline.run("tree", "do something").unwrap_err();
    assert!(matches!(err, PipelineError::PickerFormat { .. }));
    assert_eq!(backend.calls.get(), 1);
    assert_eq!(
        fs::read_to_string(temp.path().join("README.md")).unwrap(),
        "# untouched\n"
    );
}

#[test]
fn partial_write_failures_do_not_stop_the_batch() {
    let temp = tempfile::tempdir().unwrap();
    // A plain file where a directory is needed makes the first write fail.
    fs::write(temp.path().join("blocker"), "file, not dir").unwrap();

    let backend = ScriptedBackend::new(vec![
        Ok(r#"["blocker/a.txt", "ok.txt"]"#.to_string()),
        Ok("blocker/a.txt\n```\nA\n```\nok.txt\n```\nB\n```\n".to_string()),
    ]);
    let config = Config::default();
    let mut pipeline = Pipeline::new(&backend, &config, temp.path());

    let report = pipeline.run("tree", "write both").unwrap();

    let statuses: Vec<ApplyStatus> = report
        .outcomes
        .iter()
        .map(|outcome| outcome.status)
        .collect();
    assert_eq!(statuses, vec![ApplyStatus::Failed, ApplyStatus::Written]);
    assert_eq!(fs::read_to_string(temp.path().join("ok.txt")).unwrap(), "B");
    assert_eq!(pipeline.phase(), PipelinePhase::Done);
}
