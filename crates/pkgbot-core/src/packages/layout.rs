//! Package directory layout.
//!
//! Owns the three filesystem roots below the base directory and the moves
//! between them:
//!
//! ```text
//! <base>/repos/<repo>/...        catalog repository cache
//! <base>/installed/<name>/...    installed package checkouts
//! <base>/trash/<name>.<uuid>/... uninstalled packages
//! ```

use crate::error::{PackageError, Result};
use crate::packages::manifest::{
    InstalledMetadata, METADATA_DIR, REQUIREMENTS_FILE, metadata_path,
};
use std::path::{Path, PathBuf};
use tracing::{debug, info};
use uuid::Uuid;

/// Catalog repository cache root name.
pub const REPOS_DIR: &str = "repos";

/// Installed packages root name.
pub const INSTALLED_DIR: &str = "installed";

/// Trash root name.
pub const TRASH_DIR: &str = "trash";

/// Filesystem roots used by the package manager.
#[derive(Debug, Clone)]
pub struct PackageLayout {
    base_dir: PathBuf,
}

impl PackageLayout {
    /// Creates a layout rooted at `base_dir`. No I/O is performed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Self {
        Self { base_dir: base_dir.into() }
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn repos_dir(&self) -> PathBuf {
        self.base_dir.join(REPOS_DIR)
    }

    pub fn installed_dir(&self) -> PathBuf {
        self.base_dir.join(INSTALLED_DIR)
    }

    pub fn trash_dir(&self) -> PathBuf {
        self.base_dir.join(TRASH_DIR)
    }

    /// `<installed>/<name>`.
    pub fn install_path(&self, name: &str) -> PathBuf {
        self.installed_dir().join(name)
    }

    /// `<trash>/<name>`.
    pub fn trash_path(&self, name: &str) -> PathBuf {
        self.trash_dir().join(name)
    }

    /// `<repos>/<repo_id>`.
    pub fn repo_path(&self, repo_id: &str) -> PathBuf {
        self.repos_dir().join(repo_id)
    }

    /// `<installed>/<name>/repository/requirements.txt`.
    pub fn requirements_path(&self, name: &str) -> PathBuf {
        self.install_path(name).join(METADATA_DIR).join(REQUIREMENTS_FILE)
    }

    /// Creates the catalog root if missing.
    pub fn ensure_repos_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.repos_dir())
    }

    /// Creates the installed root if missing.
    pub fn ensure_installed_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.installed_dir())
    }

    /// Creates the trash root if missing.
    pub fn ensure_trash_dir(&self) -> Result<PathBuf> {
        ensure_dir(self.trash_dir())
    }

    /// Whether `<installed>/<name>` exists.
    pub fn is_installed(&self, name: &str) -> bool {
        self.install_path(name).exists()
    }

    /// Sorted names of the directories under the installed root.
    ///
    /// An absent root yields an empty list.
    pub fn installed_names(&self) -> Result<Vec<String>> {
        list_dir_names(&self.installed_dir())
    }

    /// Moves an installed package into the trash under a fresh unique name.
    ///
    /// The trash name is `<name>.<uuid-v4>`. The move is a single
    /// rename; nothing is copied or deleted.
    pub fn move_to_trash(&self, installed_path: &Path) -> Result<PathBuf> {
        if !installed_path.exists() {
            return Err(PackageError::filesystem(
                installed_path,
                std::io::Error::new(std::io::ErrorKind::NotFound, "package directory does not exist"),
            ));
        }

        let name = installed_path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .ok_or_else(|| {
                PackageError::filesystem(
                    installed_path,
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no file name"),
                )
            })?;

        self.ensure_trash_dir()?;

        let mut trashed = self.trash_path(&trash_name(&name));
        while trashed.exists() {
            trashed = self.trash_path(&trash_name(&name));
        }

        std::fs::rename(installed_path, &trashed)
            .map_err(|e| PackageError::filesystem(installed_path, e))?;

        info!(from = %installed_path.display(), to = %trashed.display(), "Moved package to trash");
        Ok(trashed)
    }

    /// Reads `<installed_path>/repository/repo.json`.
    ///
    /// Any read or parse failure yields `None`.
    pub fn read_package_metadata(&self, installed_path: &Path) -> Option<InstalledMetadata> {
        let path = metadata_path(installed_path);
        match InstalledMetadata::load(&path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "No readable package metadata");
                None
            }
        }
    }
}

/// Builds `<name>.<uuid-v4>`.
pub fn trash_name(name: &str) -> String {
    format!("{}.{}", name, Uuid::new_v4())
}

fn ensure_dir(path: PathBuf) -> Result<PathBuf> {
    if !path.exists() {
        std::fs::create_dir_all(&path).map_err(|e| PackageError::filesystem(&path, e))?;
    }
    Ok(path)
}

/// Sorted directory names directly under `dir`; empty if `dir` is absent.
pub(crate) fn list_dir_names(dir: &Path) -> Result<Vec<String>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(|e| PackageError::filesystem(dir, e))? {
        let entry = entry.map_err(|e| PackageError::filesystem(dir, e))?;
        if entry.path().is_dir() {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
    }
    names.sort();
    Ok(names)
}
