//! Error types for pkgbot core.

use std::path::PathBuf;
use thiserror::Error;

/// Broad classification of a [`PackageError`].
///
/// Front ends use this to decide how to phrase a failure; the orchestrator
/// never branches on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Package or URL could not be resolved to an install source.
    Resolution,
    /// The version-control tool reported a failure.
    Vcs,
    /// A catalog or package metadata document is missing or malformed.
    Metadata,
    /// Rename/create failure or an install-name collision.
    Filesystem,
    /// An external tool could not be executed at all.
    Tool,
    /// A search pattern did not compile.
    Pattern,
    /// Configuration could not be loaded.
    Config,
}

/// Core error type for package lifecycle operations.
#[derive(Error, Debug)]
pub enum PackageError {
    /// Package is not advertised by the repository.
    #[error("Package not found in repository '{repo}': {name}")]
    NotFound { name: String, repo: String },

    /// Repository snapshot has never been loaded.
    #[error("Cannot locate repo '{0}'. Try running \"pkgbot update\"")]
    CatalogUnavailable(String),

    /// Token is neither a catalog name nor a usable URL.
    #[error("Invalid package name or url: {0}")]
    InvalidSource(String),

    /// Version-control invocation finished with a failure status.
    #[error("git {operation} failed for '{target}':\n{output}")]
    Vcs {
        operation: &'static str,
        target: String,
        output: String,
    },

    /// Metadata document could not be read or parsed.
    #[error("Invalid metadata in {path}: {reason}")]
    Metadata { path: PathBuf, reason: String },

    /// Install target already exists.
    #[error("Package already installed: {0}")]
    AlreadyInstalled(String),

    /// Package directory does not exist.
    #[error("Package is not installed: {0}")]
    NotInstalled(String),

    /// Filesystem operation failed.
    #[error("Filesystem operation failed on {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// External tool could not be spawned.
    #[error("Failed to execute {program}: {source}")]
    ToolUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Search pattern failed to compile.
    #[error("Invalid search pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),
}

impl PackageError {
    /// Builds a filesystem error for `path`.
    pub fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem { path: path.into(), source }
    }

    /// Builds a metadata error for `path`.
    pub fn metadata(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::Metadata { path: path.into(), reason: reason.to_string() }
    }

    /// Returns the taxonomy bucket for this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound { .. } | Self::CatalogUnavailable(_) | Self::InvalidSource(_) => {
                ErrorKind::Resolution
            }
            Self::Vcs { .. } => ErrorKind::Vcs,
            Self::Metadata { .. } => ErrorKind::Metadata,
            Self::AlreadyInstalled(_) | Self::NotInstalled(_) | Self::Filesystem { .. } => {
                ErrorKind::Filesystem
            }
            Self::ToolUnavailable { .. } => ErrorKind::Tool,
            Self::InvalidPattern(_) => ErrorKind::Pattern,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

/// Result type alias for pkgbot operations.
pub type Result<T> = std::result::Result<T, PackageError>;
