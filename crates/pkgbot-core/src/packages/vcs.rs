//! Version-control gateway.
//!
//! Every clone, pull and reset performed by pkgbot goes through
//! [`VersionControl`]. Implementations never interpret the tool's output.

use crate::config::DEFAULT_GIT_PROGRAM;
use crate::error::Result;
use crate::packages::process::{CommandOutput, run_tool};
use std::path::Path;

/// Version-control operations against a package's upstream.
pub trait VersionControl: Send + Sync {
    /// Clones `remote` into `working_dir/destination`. Neither argument is
    /// ever interpreted as an option.
    fn clone_repo(&self, remote: &str, destination: &str, working_dir: &Path)
    -> Result<CommandOutput>;

    /// Pulls upstream changes into the checkout at `repo_path`.
    fn pull(&self, repo_path: &Path) -> Result<CommandOutput>;

    /// Discards local changes in `repo_path`.
    fn reset(&self, repo_path: &Path, hard: bool) -> Result<CommandOutput>;
}

/// Gateway backed by the `git` command-line client.
#[derive(Debug, Clone)]
pub struct GitCli {
    program: String,
}

impl GitCli {
    /// Uses `git` from `PATH`.
    pub fn new() -> Self {
        Self::with_program(DEFAULT_GIT_PROGRAM)
    }

    /// Uses an explicit git executable.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self { program: program.into() }
    }

    /// Configured executable.
    pub fn program(&self) -> &str {
        &self.program
    }
}

impl Default for GitCli {
    fn default() -> Self {
        Self::new()
    }
}

impl VersionControl for GitCli {
    fn clone_repo(
        &self,
        remote: &str,
        destination: &str,
        working_dir: &Path,
    ) -> Result<CommandOutput> {
        run_tool(&self.program, &["clone", "--", remote, destination], Some(working_dir))
    }

    fn pull(&self, repo_path: &Path) -> Result<CommandOutput> {
        run_tool(&self.program, &["pull"], Some(repo_path))
    }

    fn reset(&self, repo_path: &Path, hard: bool) -> Result<CommandOutput> {
        if hard {
            run_tool(&self.program, &["reset", "--hard"], Some(repo_path))
        } else {
            run_tool(&self.program, &["reset"], Some(repo_path))
        }
    }
}
