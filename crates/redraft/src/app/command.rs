//! Decoding raw interactive input into typed commands.
//!
//! Input is parsed exactly once into a [`Command`] variant and exhaustively
//! matched by the driver, rather than string-prefix checks scattered through
//! the loop.

use thiserror::Error;

/// One decoded line of interactive input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// `/a <path>...`: add paths to the selection. A lone `.` argument
    /// expands to every tracked file.
    Add(Vec<String>),
    /// `/r <path>...`: remove paths from the selection.
    Remove(Vec<String>),
    /// `/t`: estimate tokens of the current prompt.
    EstimateTokens,
    /// `/c`: copy the current prompt to the clipboard.
    CopyPrompt,
    /// `/p`: paste instructions from the clipboard and run the apply pipeline.
    ApplyPaste,
    /// `!cmd`: run a shell command and show its output.
    Shell(String),
    /// `/h`, `/help`, or bare `/`.
    Help,
    /// `/q`: leave the session.
    Quit,
    /// Anything that is not a command: echoed back to the log.
    Echo(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CommandParseError {
    #[error("unknown command '{0}' (try /h)")]
    Unknown(String),
    #[error("'{0}' requires at least one path argument")]
    MissingPaths(&'static str),
}

/// Decode one line of raw input.
///
/// Empty input decodes to `Echo("")`; callers typically skip it. Path
/// arguments are split on whitespace.
pub fn parse_command(raw: &str) -> Result<Command, CommandParseError> {
    let input = raw.trim();

    if let Some(shell) = input.strip_prefix('!') {
        return Ok(Command::Shell(shell.trim().to_string()));
    }
    if !input.starts_with('/') {
        return Ok(Command::Echo(input.to_string()));
    }

    let mut parts = input.split_whitespace();
    let verb = parts.next().unwrap_or("/");
    let args: Vec<String> = parts.map(str::to_string).collect();

    match verb {
        "/a" => {
            if args.is_empty() {
                Err(CommandParseError::MissingPaths("/a"))
            } else {
                Ok(Command::Add(args))
            }
        }
        "/r" => {
            if args.is_empty() {
                Err(CommandParseError::MissingPaths("/r"))
            } else {
                Ok(Command::Remove(args))
            }
        }
        "/t" => Ok(Command::EstimateTokens),
        "/c" => Ok(Command::CopyPrompt),
        "/p" => Ok(Command::ApplyPaste),
        "/" | "/h" | "/help" => Ok(Command::Help),
        "/q" | "/quit" => Ok(Command::Quit),
        other => Err(CommandParseError::Unknown(other.to_string())),
    }
}

/// Help text listing every command, in display order.
pub fn help_text() -> &'static str {
    "/a <path>...  add file(s) to selection ('.' adds every tracked file)\n\
     /r <path>...  remove file(s) from selection\n\
     /t            estimate tokens of the current prompt\n\
     /c            copy current prompt to clipboard\n\
     /p            paste instructions from clipboard and apply edits\n\
     /h            show this help message\n\
     /q            quit\n\
     !<cmd>        run a shell command"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_add_with_paths() {
        assert_eq!(
            parse_command("/a src/lib.rs README.md"),
            Ok(Command::Add(vec!["src/lib.rs".into(), "README.md".into()]))
        );
    }

    #[test]
    fn add_without_paths_is_an_error() {
        assert_eq!(
            parse_command("/a"),
            Err(CommandParseError::MissingPaths("/a"))
        );
    }

    #[test]
    fn decodes_remove_with_paths() {
        assert_eq!(
            parse_command("/r a.txt"),
            Ok(Command::Remove(vec!["a.txt".into()]))
        );
    }

    #[test]
    fn decodes_bare_verbs() {
        assert_eq!(parse_command("/t"), Ok(Command::EstimateTokens));
        assert_eq!(parse_command("/c"), Ok(Command::CopyPrompt));
        assert_eq!(parse_command("/p"), Ok(Command::ApplyPaste));
        assert_eq!(parse_command("/h"), Ok(Command::Help));
        assert_eq!(parse_command("/"), Ok(Command::Help));
        assert_eq!(parse_command("/q"), Ok(Command::Quit));
    }

    #[test]
    fn decodes_shell_passthrough() {
        assert_eq!(
            parse_command("!cargo check"),
            Ok(Command::Shell("cargo check".into()))
        );
    }

    #[test]
    fn unknown_slash_command_is_an_error() {
        assert_eq!(
            parse_command("/frobnicate"),
            Err(CommandParseError::Unknown("/frobnicate".into()))
        );
    }

    #[test]
    fn plain_text_is_echoed() {
        assert_eq!(
            parse_command("  just a note  "),
            Ok(Command::Echo("just a note".into()))
        );
    }
}
