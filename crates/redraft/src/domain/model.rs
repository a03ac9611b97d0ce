//! Domain models for file listings and apply outcomes.

/// A whole-file replacement extracted from generation output.
///
/// Identity is positional: two listings in one response may name the same
/// path, and both are kept in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileListing {
    /// Relative file path, trimmed and non-empty.
    pub path: String,
    /// File content captured verbatim, minus the record's own trailing newline.
    pub content: String,
}

/// Result of committing a single [`FileListing`] to disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyOutcome {
    pub path: String,
    pub status: ApplyStatus,
    /// IO error detail when the write failed.
    pub error: Option<String>,
}

impl ApplyOutcome {
    pub fn written(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ApplyStatus::Written,
            error: None,
        }
    }

    pub fn failed(path: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            status: ApplyStatus::Failed,
            error: Some(detail.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    Written,
    Failed,
}
