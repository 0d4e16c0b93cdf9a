//! Third-party dependency installation for freshly installed packages.

use crate::config::ConfigError;
use crate::error::{PackageError, Result};
use crate::packages::process::{CommandOutput, run_tool};
use std::path::Path;

/// Installs the dependencies listed in a requirements file.
pub trait DependencyInstaller: Send + Sync {
    fn install(&self, requirements: &Path) -> Result<CommandOutput>;
}

/// Installer that appends the requirements path to a fixed command line,
/// e.g. `pip install -r <path>`.
#[derive(Debug, Clone)]
pub struct CommandInstaller {
    command: Vec<String>,
}

impl CommandInstaller {
    /// `command` must contain at least the program name.
    pub fn new(command: Vec<String>) -> Result<Self> {
        if command.is_empty() {
            return Err(empty_command());
        }
        Ok(Self { command })
    }

    pub fn command(&self) -> &[String] {
        &self.command
    }
}

impl DependencyInstaller for CommandInstaller {
    fn install(&self, requirements: &Path) -> Result<CommandOutput> {
        let (program, fixed) = self.command.split_first().ok_or_else(empty_command)?;
        let requirements = requirements.to_string_lossy();
        let mut args: Vec<&str> = fixed.iter().map(String::as_str).collect();
        args.push(&requirements);
        run_tool(program, &args, None)
    }
}

fn empty_command() -> PackageError {
    PackageError::Config(ConfigError::InvalidValue(
        "dependency installer command is empty".to_string(),
    ))
}

/// Outcome of the post-install dependency step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DependencyStep {
    /// Package ships no requirements file.
    NotRequired,
    /// Installer ran and succeeded.
    Installed(CommandOutput),
    /// Installer ran and reported failure, or could not be started.
    Failed(String),
}

impl DependencyStep {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_command_rejected() {
        assert!(CommandInstaller::new(Vec::new()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn test_requirements_path_is_appended() {
        let installer = CommandInstaller::new(vec!["echo".to_string(), "-r".to_string()]).unwrap();
        let output = installer.install(Path::new("pkgs/installed/weather/repository/requirements.txt")).unwrap();
        assert!(!output.is_error);
        assert_eq!(output.stdout.trim(), "-r pkgs/installed/weather/repository/requirements.txt");
    }

    #[test]
    fn test_missing_installer_is_tool_error() {
        let installer = CommandInstaller::new(vec!["pkgbot-no-such-pip".to_string()]).unwrap();
        let err = installer.install(Path::new("requirements.txt")).unwrap_err();
        assert!(matches!(err, PackageError::ToolUnavailable { .. }));
    }
}
