//! Configuration file support.
//!
//! Settings are merged from, lowest to highest precedence:
//! 1. Defaults
//! 2. Global config file (~/.pkgbot/config.toml)
//! 3. Local config file (./.pkgbotrc)
//! 4. Environment variables (`PKGBOT_*`)
//!
//! Command-line flags are applied by the caller on top of the result.

use crate::packages::manifest::validate_install_name;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::warn;

/// Default base directory holding `repos/`, `installed/` and `trash/`.
pub const DEFAULT_BASE_DIR: &str = "pkgs";

/// Name of the designated default catalog repository.
pub const DEFAULT_REPOSITORY_NAME: &str = "main";

/// Remote location of the default catalog repository.
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/asdofindia/telegram-pybot-plugin-repo";

/// Version-control executable used when none is configured.
pub const DEFAULT_GIT_PROGRAM: &str = "git";

/// Configuration structure.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PkgbotConfig {
    /// Base directory for package state
    #[serde(default)]
    pub base_dir: Option<PathBuf>,

    /// Log level
    #[serde(default)]
    pub log_level: Option<String>,

    /// Default catalog repository
    #[serde(default)]
    pub repository: RepositoryConfig,

    /// External tools
    #[serde(default)]
    pub tools: ToolsConfig,
}

/// Default catalog repository settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RepositoryConfig {
    /// Local identifier of the repository (directory name under `repos/`)
    #[serde(default)]
    pub name: Option<String>,

    /// Remote URL cloned on first update
    #[serde(default)]
    pub url: Option<String>,
}

/// External tool settings.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ToolsConfig {
    /// Path or name of the git executable
    #[serde(default)]
    pub git: Option<String>,

    /// Dependency installer command; the requirements file path is appended
    #[serde(default)]
    pub dependency_installer: Option<Vec<String>>,
}

/// Errors that can occur during configuration loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Configuration file not found.
    #[error("Configuration file not found: {0}")]
    NotFound(String),

    /// Failed to read configuration file.
    #[error("Failed to read configuration file: {0}")]
    ReadError(String),

    /// Failed to parse configuration file.
    #[error("Failed to parse configuration file: {0}")]
    ParseError(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value: {0}")]
    InvalidValue(String),
}

/// Result type for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

impl PkgbotConfig {
    /// Load configuration from a TOML file.
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.display().to_string()));
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadError(format!("{}: {}", path.display(), e)))?;

        let config: Self = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Get default global configuration file path.
    pub fn default_global_path() -> PathBuf {
        std::env::var("HOME")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(".pkgbot")
            .join("config.toml")
    }

    /// Get default local configuration file path.
    pub fn default_local_path() -> PathBuf {
        PathBuf::from(".pkgbotrc")
    }

    /// Discover and load configuration files, then apply environment overrides.
    ///
    /// Unreadable files are logged and skipped; a missing file is not an error.
    pub fn discover_and_load() -> Self {
        let mut config = Self::default();

        for path in [Self::default_global_path(), Self::default_local_path()] {
            match Self::load_from_file(&path) {
                Ok(file_config) => config.merge(&file_config),
                Err(ConfigError::NotFound(_)) => {}
                Err(e) => warn!(path = %path.display(), error = %e, "Ignoring config file"),
            }
        }

        config.apply_overrides(|key| std::env::var(key).ok());
        config
    }

    /// Merge another configuration into this one.
    ///
    /// Values from `other` override values in `self` if they are Some.
    pub fn merge(&mut self, other: &Self) {
        if let Some(ref base_dir) = other.base_dir {
            self.base_dir = Some(base_dir.clone());
        }
        if let Some(ref log_level) = other.log_level {
            self.log_level = Some(log_level.clone());
        }
        if let Some(ref name) = other.repository.name {
            self.repository.name = Some(name.clone());
        }
        if let Some(ref url) = other.repository.url {
            self.repository.url = Some(url.clone());
        }
        if let Some(ref git) = other.tools.git {
            self.tools.git = Some(git.clone());
        }
        if let Some(ref installer) = other.tools.dependency_installer {
            self.tools.dependency_installer = Some(installer.clone());
        }
    }

    /// Apply `PKGBOT_*` overrides read through `lookup`.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup("PKGBOT_BASE_DIR") {
            self.base_dir = Some(PathBuf::from(value));
        }
        if let Some(value) = lookup("PKGBOT_REPO_NAME") {
            self.repository.name = Some(value);
        }
        if let Some(value) = lookup("PKGBOT_REPO_URL") {
            self.repository.url = Some(value);
        }
        if let Some(value) = lookup("PKGBOT_GIT") {
            self.tools.git = Some(value);
        }
        if let Some(value) = lookup("PKGBOT_LOG") {
            self.log_level = Some(value);
        }
    }

    fn validate(&self) -> ConfigResult<()> {
        if let Some(ref name) = self.repository.name {
            validate_install_name(name)
                .map_err(|e| ConfigError::InvalidValue(format!("repository.name: {}", e)))?;
        }
        if let Some(ref installer) = self.tools.dependency_installer {
            if installer.is_empty() {
                return Err(ConfigError::InvalidValue(
                    "tools.dependency_installer must name a program".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Effective base directory.
    pub fn base_dir(&self) -> PathBuf {
        self.base_dir.clone().unwrap_or_else(|| PathBuf::from(DEFAULT_BASE_DIR))
    }

    /// Effective default repository name.
    pub fn repository_name(&self) -> &str {
        self.repository.name.as_deref().unwrap_or(DEFAULT_REPOSITORY_NAME)
    }

    /// Effective default repository URL.
    pub fn repository_url(&self) -> &str {
        self.repository.url.as_deref().unwrap_or(DEFAULT_REPOSITORY_URL)
    }

    /// Effective git executable.
    pub fn git_program(&self) -> &str {
        self.tools.git.as_deref().unwrap_or(DEFAULT_GIT_PROGRAM)
    }

    /// Effective dependency installer command line.
    pub fn dependency_installer(&self) -> Vec<String> {
        self.tools.dependency_installer.clone().unwrap_or_else(|| {
            vec!["pip".to_string(), "install".to_string(), "-r".to_string()]
        })
    }
}
