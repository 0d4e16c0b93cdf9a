//! pkgbot core - package manager for host extensions.
//!
//! This crate provides:
//! - the catalog store and its atomically replaced snapshot
//! - the installed/trash directory layout
//! - the git gateway and dependency installer
//! - the lifecycle orchestrator ([`PackageManager`])
//!
//! # Example
//!
//! ```rust,no_run
//! use pkgbot_core::{LoggingHost, PackageManager, PkgbotConfig};
//! use std::sync::Arc;
//!
//! fn main() -> pkgbot_core::Result<()> {
//!     let config = PkgbotConfig::discover_and_load();
//!     let manager = PackageManager::from_config(&config, Arc::new(LoggingHost))?;
//!     print!("{}", manager.search("weather")?);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod packages;

pub use config::{ConfigError, PkgbotConfig};
pub use error::{ErrorKind, PackageError, Result};
pub use packages::{
    BatchReport, CatalogStore, CommandOutput, DependencyStep, ExtensionHost, GitCli,
    InstalledPackage, ItemReport, LoggingHost, PackageDescriptor, PackageLayout, PackageManager,
    ResponseSink, VersionControl,
};
