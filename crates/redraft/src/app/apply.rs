//! Committing parsed listings to the filesystem.

use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::model::{ApplyOutcome, FileListing};

/// Writes listings to disk as whole-file replacements.
///
/// The batch is intentionally non-transactional: every listing is attempted
/// regardless of earlier failures, and applying N listings always produces
/// exactly N outcomes in input order.
#[derive(Debug, Clone)]
pub struct Applier {
    root: PathBuf,
}

impl Applier {
    /// Create an applier resolving listing paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Apply every listing in order, overwriting existing files and creating
    /// parent directories as needed. Failures are recorded per listing and
    /// never abort the batch.
    pub fn apply(&self, listings: &[FileListing]) -> Vec<ApplyOutcome> {
        listings
            .iter()
            .map(|listing| self.apply_one(listing))
            .collect()
    }

    fn apply_one(&self, listing: &FileListing) -> ApplyOutcome {
        match self.write_listing(listing) {
            Ok(()) => {
                tracing::debug!(path = %listing.path, "wrote listing");
                ApplyOutcome::written(listing.path.clone())
            }
            Err(err) => {
                tracing::warn!(path = %listing.path, error = %err, "failed to write listing");
                ApplyOutcome::failed(listing.path.clone(), err.to_string())
            }
        }
    }

    fn write_listing(&self, listing: &FileListing) -> std::io::Result<()> {
        let target = self.root.join(&listing.path);
        if let Some(parent) = target.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, &listing.content)
    }

    /// Root directory listing paths are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::domain::model::ApplyStatus;

    fn listing(path: &str, content: &str) -> FileListing {
        FileListing {
            path: path.into(),
            content: content.into(),
        }
    }

    #[test]
    fn writes_files_and_creates_parent_directories() {
        let temp = tempfile::tempdir().unwrap();
        let applier = Applier::new(temp.path());

        let outcomes = applier.apply(&[listing("deep/nested/file.txt", "contents")]);

        assert_eq!(outcomes[0].status, ApplyStatus::Written);
        let written = fs::read_to_string(temp.path().join("deep/nested/file.txt")).unwrap();
        assert_eq!(written, "contents");
    }

    #[test]
    fn overwrites_existing_files_unconditionally() {
        let temp = tempfile::tempdir().unwrap();
        fs::write(temp.path().join("existing.txt"), "old").unwrap();

        let applier = Applier::new(temp.path());
        let outcomes = applier.apply(&[listing("existing.txt", "new")]);

        assert_eq!(outcomes[0].status, ApplyStatus::Written);
        assert_eq!(
            fs::read_to_string(temp.path().join("existing.txt")).unwrap(),
            "new"
        );
    }

    #[test]
    fn failure_on_one_listing_does_not_stop_the_next() {
        let temp = tempfile::tempdir().unwrap();
        // A regular file in the parent position makes create_dir_all fail.
        fs::write(temp.path().join("blocker"), "not a directory").unwrap();

        let applier = Applier::new(temp.path());
        let outcomes = applier.apply(&[
            listing("blocker/child.txt", "unwritable"),
            listing("ok.txt", "fine"),
        ]);

        assert_eq!(outcomes.len(), 2);
        assert_eq!(outcomes[0].status, ApplyStatus::Failed);
        assert!(outcomes[0].error.is_some());
        assert_eq!(outcomes[1].status, ApplyStatus::Written);
        assert_eq!(fs::read_to_string(temp.path().join("ok.txt")).unwrap(), "fine");
    }

    #[test]
    fn produces_one_outcome_per_listing_in_order() {
        let temp = tempfile::tempdir().unwrap();
        let applier = Applier::new(temp.path());

        let outcomes = applier.apply(&[
            listing("a.txt", "A"),
            listing("b.txt", "B"),
            listing("a.txt", "A2"),
        ]);

        let paths: Vec<_> = outcomes.iter().map(|outcome| outcome.path.as_str()).collect();
        assert_eq!(paths, vec!["a.txt", "b.txt", "a.txt"]);
        // Last write wins for duplicate paths.
        assert_eq!(fs::read_to_string(temp.path().join("a.txt")).unwrap(), "A2");
    }

    #[test]
    fn empty_batch_yields_empty_outcomes() {
        let temp = tempfile::tempdir().unwrap();
        let applier = Applier::new(temp.path());
        assert!(applier.apply(&[]).is_empty());
    }
}
