//! Extracting file listings from generation output.
//!
//! The wire format is a path line followed by a fenced block:
//!
//! ````text
//! path/to/file.ext
//! ```
//! entire file content
//! ```
//! ````
//!
//! The scanner is line-oriented and non-greedy: a body ends at the first
//! bare close fence, so content that itself contains a triple-backtick line
//! is truncated there. That ambiguity is part of the format's contract.

use crate::domain::model::FileListing;

/// Scanner states for one candidate listing.
#[derive(Clone, Copy)]
enum ScanState {
    /// Looking for a non-empty line to treat as a path candidate.
    SeekingPath,
    /// `path` is the line index of the candidate; the current line must open
    /// a fence or the candidate is rejected.
    SeekingFenceOpen { path: usize },
    /// Inside a fenced body started at line index `body`.
    InBody { path: usize, body: usize },
}

/// Parse every well-formed listing out of `text`, in document order.
///
/// Malformed candidates are skipped without error: a path line not followed
/// by an opening fence simply shifts the scan down one line. Duplicate paths
/// are preserved; callers decide what repeated listings mean. A fence that
/// never closes discards its candidate.
pub fn parse_listings(text: &str) -> Vec<FileListing> {
    let lines: Vec<&str> = text.lines().collect();
    let mut listings = Vec::new();
    let mut state = ScanState::SeekingPath;
    let mut index = 0;

    while index < lines.len() {
        match state {
            ScanState::SeekingPath => {
                if !lines[index].trim().is_empty() {
                    state = ScanState::SeekingFenceOpen { path: index };
                }
                index += 1;
            }
            ScanState::SeekingFenceOpen { path } => {
                if is_fence_open(lines[index]) {
                    state = ScanState::InBody {
                        path,
                        body: index + 1,
                    };
                    index += 1;
                } else {
                    // Rejected candidate: the current line becomes the next
                    // path candidate, so the index does not advance.
                    state = ScanState::SeekingPath;
                }
            }
            ScanState::InBody { path, body } => {
                if is_fence_close(lines[index]) {
                    listings.push(FileListing {
                        path: lines[path].trim().to_string(),
                        content: lines[body..index].join("\n"),
                    });
                    state = ScanState::SeekingPath;
                }
                index += 1;
            }
        }
    }

    listings
}

/// Opening fence: three backticks at the start of the line, optionally
/// followed by a language tag, which is ignored.
fn is_fence_open(line: &str) -> bool {
    line.starts_with("```")
}

/// Closing fence: three backticks alone on the line.
fn is_fence_close(line: &str) -> bool {
    line.trim() == "```"
}
