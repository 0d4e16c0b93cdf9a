//! Catalog and package metadata documents.
//!
//! Both documents live at `repository/repo.json` relative to a checkout: the
//! catalog repository's document lists packages, an installed package's
//! document describes that package.

use crate::error::{PackageError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;

/// Directory inside a checkout that holds metadata.
pub const METADATA_DIR: &str = "repository";

/// Metadata document file name.
pub const METADATA_FILE: &str = "repo.json";

/// Dependency requirements file shipped by a package.
pub const REQUIREMENTS_FILE: &str = "requirements.txt";

/// Returns `<checkout>/repository/repo.json`.
pub fn metadata_path(checkout: &Path) -> PathBuf {
    checkout.join(METADATA_DIR).join(METADATA_FILE)
}

/// One catalog-advertised package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageDescriptor {
    /// Install-name; doubles as the directory name once installed.
    pub pkg_name: String,

    /// Display name.
    pub name: String,

    pub version: String,

    pub description: String,

    /// Remote location cloned on install.
    pub repo: String,

    /// Extensions activated right after install.
    #[serde(default)]
    pub default_enable: Vec<String>,
}

/// Catalog repository document: `{ "packages": [...] }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RepositoryDocument {
    #[serde(default)]
    pub packages: Vec<PackageDescriptor>,
}

impl RepositoryDocument {
    /// Loads and validates a repository document.
    ///
    /// Descriptors whose `pkg_name` is not a safe install-name are dropped
    /// with a warning; the rest of the document stays usable.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PackageError::metadata(path, e))?;
        let mut document: Self =
            serde_json::from_str(&content).map_err(|e| PackageError::metadata(path, e))?;

        document.packages.retain(|pkg| match validate_install_name(&pkg.pkg_name) {
            Ok(()) => true,
            Err(reason) => {
                warn!(path = %path.display(), pkg_name = %pkg.pkg_name, %reason, "Skipping package entry");
                false
            }
        });

        Ok(document)
    }
}

/// Metadata shipped inside an installed package checkout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstalledMetadata {
    pub version: String,
    pub description: String,
}

impl InstalledMetadata {
    /// Loads a per-package metadata document.
    pub fn load(path: &Path) -> Result<Self> {
        let content =
            std::fs::read_to_string(path).map_err(|e| PackageError::metadata(path, e))?;
        serde_json::from_str(&content).map_err(|e| PackageError::metadata(path, e))
    }
}

/// Checks that `name` can be used as a single directory name.
pub fn validate_install_name(name: &str) -> std::result::Result<(), String> {
    if name.trim().is_empty() {
        return Err("install-name is empty".to_string());
    }
    if name == "." || name == ".." {
        return Err(format!("install-name '{}' is reserved", name));
    }
    if name.starts_with('-') {
        return Err(format!("install-name '{}' starts with '-'", name));
    }
    if name.contains(['/', '\\', '\0']) {
        return Err(format!("install-name '{}' contains a path separator", name));
    }
    Ok(())
}
