//! Shell command passthrough for `!` input.

use std::process::Command;

use anyhow::{Context, Result};

/// Run `command` through the platform shell, returning stdout followed by
/// stderr. A non-zero exit is reported in the output rather than as an
/// error: the passthrough is a convenience, not a build step.
pub fn run(command: &str) -> Result<String> {
    let output = shell_command(command)
        .output()
        .with_context(|| format!("failed to run shell command: {command}"))?;

    let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
    if !output.stderr.is_empty() {
        text.push_str(&String::from_utf8_lossy(&output.stderr));
    }
    if !output.status.success() {
        text.push_str(&format!("(exited with {})\n", output.status));
    }
    Ok(text)
}

#[cfg(unix)]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("sh");
    shell.arg("-c").arg(command);
    shell
}

#[cfg(windows)]
fn shell_command(command: &str) -> Command {
    let mut shell = Command::new("cmd");
    shell.arg("/C").arg(command);
    shell
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    #[cfg(unix)]
    fn captures_stdout() {
        let output = run("echo hello").unwrap();
        assert!(output.contains("hello"));
    }

    #[test]
    #[cfg(unix)]
    fn captures_stderr_and_exit_status() {
        let output = run("echo oops >&2; exit 3").unwrap();
        assert!(output.contains("oops"));
        assert!(output.contains("exited with"));
    }

    #[test]
    fn missing_shell_is_the_only_hard_error() {
        // The shell itself exists on supported platforms; a bogus command
        // still produces output rather than an Err.
        let output = run("definitely-not-a-real-command-xyz");
        assert!(output.is_ok());
    }
}
