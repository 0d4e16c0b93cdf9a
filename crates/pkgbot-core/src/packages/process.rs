//! External tool invocation.
//!
//! Runs a program to completion and captures its output. A failing exit
//! status is reported in the returned [`CommandOutput`]; only a spawn
//! failure is an error.

use crate::error::{PackageError, Result};
use serde::Serialize;
use std::path::Path;
use std::process::Command;
use tracing::debug;

/// Normalized outcome of an external tool invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    /// Exit code, `-1` when the process was terminated by a signal.
    pub exit_status: i32,
    pub stdout: String,
    pub stderr: String,
    pub is_error: bool,
}

impl CommandOutput {
    /// Successful output carrying `stdout`.
    pub fn success(stdout: impl Into<String>) -> Self {
        Self { exit_status: 0, stdout: stdout.into(), stderr: String::new(), is_error: false }
    }

    /// Failed output with the given status and `stderr`.
    pub fn failure(exit_status: i32, stderr: impl Into<String>) -> Self {
        Self { exit_status, stdout: String::new(), stderr: stderr.into(), is_error: true }
    }

    /// `stdout` immediately followed by `stderr`, verbatim.
    pub fn text(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

/// Runs `program` with `args`, optionally inside `working_dir`.
pub fn run_tool(program: &str, args: &[&str], working_dir: Option<&Path>) -> Result<CommandOutput> {
    let mut cmd = Command::new(program);
    cmd.args(args);
    if let Some(dir) = working_dir {
        cmd.current_dir(dir);
    }

    debug!(program, ?args, cwd = ?working_dir, "Running external tool");

    let output = cmd.output().map_err(|source| PackageError::ToolUnavailable {
        program: program.to_string(),
        source,
    })?;

    let exit_status = output.status.code().unwrap_or(-1);
    Ok(CommandOutput {
        exit_status,
        stdout: String::from_utf8_lossy(&output.stdout).to_string(),
        stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        is_error: !output.status.success(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_concatenates_streams() {
        let output = CommandOutput {
            exit_status: 1,
            stdout: "Cloning into 'weather'...\n".to_string(),
            stderr: "fatal: not found\n".to_string(),
            is_error: true,
        };
        assert_eq!(output.text(), "Cloning into 'weather'...\nfatal: not found\n");
    }

    #[test]
    fn test_missing_program_is_tool_unavailable() {
        let err = run_tool("pkgbot-definitely-not-a-real-binary", &[], None).unwrap_err();
        assert!(matches!(err, PackageError::ToolUnavailable { .. }));
    }

    #[cfg(unix)]
    #[test]
    fn test_failing_program_is_not_an_error() {
        let output = run_tool("false", &[], None).unwrap();
        assert!(output.is_error);
        assert_ne!(output.exit_status, 0);
    }

    #[cfg(unix)]
    #[test]
    fn test_captures_stdout_and_working_dir() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let output = run_tool("pwd", &[], Some(temp_dir.path())).unwrap();
        assert!(!output.is_error);
        let reported = std::path::PathBuf::from(output.stdout.trim());
        assert_eq!(
            reported.canonicalize().unwrap(),
            temp_dir.path().canonicalize().unwrap()
        );
    }
}
