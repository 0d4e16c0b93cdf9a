//! Package lifecycle for host extensions.
//!
//! Each package is a version-controlled repository cloned under the
//! installed root. A catalog repository advertises installable packages.
//!
//! # Example
//!
//! ```rust,no_run
//! use pkgbot_core::config::PkgbotConfig;
//! use pkgbot_core::packages::{LoggingHost, PackageManager};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = PkgbotConfig::discover_and_load();
//! let manager = PackageManager::from_config(&config, Arc::new(LoggingHost))?;
//!
//! let mut messages: Vec<String> = Vec::new();
//! manager.update_catalog(&mut messages)?;
//! manager.install("weather", &mut messages);
//! print!("{}", manager.list_installed()?);
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod deps;
pub mod host;
pub mod layout;
pub mod manager;
pub mod manifest;
pub mod process;
pub mod resolver;
pub mod vcs;

pub use catalog::{CatalogEntry, CatalogSnapshot, CatalogStore, Refresh, RefreshStep, ReloadReport};
pub use deps::{CommandInstaller, DependencyInstaller, DependencyStep};
pub use host::{ExtensionHost, LoggingHost, ResponseSink};
pub use layout::{INSTALLED_DIR, PackageLayout, REPOS_DIR, TRASH_DIR, trash_name};
pub use manager::{
    BatchReport, InstallOutcome, InstalledPackage, ItemReport, NO_PACKAGES_INSTALLED,
    NOTHING_TO_UPDATE, PLUGINS_RELOADED, PackageManager,
};
pub use manifest::{
    InstalledMetadata, METADATA_DIR, METADATA_FILE, PackageDescriptor, REQUIREMENTS_FILE,
    RepositoryDocument, metadata_path, validate_install_name,
};
pub use process::CommandOutput;
pub use resolver::{PackageResolver, Resolution, install_name_from_url};
pub use vcs::{GitCli, VersionControl};
