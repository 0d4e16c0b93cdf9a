//! Catalog store.
//!
//! Caches remote package repositories under `<base>/repos/` and keeps an
//! in-memory snapshot of their metadata documents. The snapshot is an
//! immutable value behind an `Arc`; a reload builds a new one and swaps it in
//! with a single write, so readers see either the old or the new catalog.

use crate::error::{PackageError, Result};
use crate::packages::host::ResponseSink;
use crate::packages::layout::{PackageLayout, list_dir_names};
use crate::packages::manifest::{PackageDescriptor, RepositoryDocument, metadata_path};
use crate::packages::process::CommandOutput;
use crate::packages::vcs::VersionControl;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{info, warn};

/// One loaded catalog repository.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    pub id: String,
    pub packages: Vec<PackageDescriptor>,
}

impl CatalogEntry {
    /// First package whose `pkg_name` equals `pkg_name`.
    pub fn find(&self, pkg_name: &str) -> Option<&PackageDescriptor> {
        self.packages.iter().find(|pkg| pkg.pkg_name == pkg_name)
    }
}

/// Immutable view of every successfully loaded repository.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    entries: BTreeMap<String, CatalogEntry>,
}

impl CatalogSnapshot {
    pub fn get(&self, repo_id: &str) -> Option<&CatalogEntry> {
        self.entries.get(repo_id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Repository ids in sorted order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Result of one reload pass.
#[derive(Debug, Default)]
pub struct ReloadReport {
    pub loaded: Vec<String>,
    pub failed: Vec<(String, PackageError)>,
}

/// Gateway step whose output a refresh returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefreshStep {
    Clone,
    Reset,
    Pull,
}

impl RefreshStep {
    /// The git subcommand name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Clone => "clone",
            Self::Reset => "reset",
            Self::Pull => "pull",
        }
    }
}

/// Output of the last gateway step a refresh ran.
#[derive(Debug, Clone, PartialEq)]
pub struct Refresh {
    pub step: RefreshStep,
    pub output: CommandOutput,
}

/// On-disk catalog cache plus its in-memory snapshot.
pub struct CatalogStore {
    layout: PackageLayout,
    vcs: Arc<dyn VersionControl>,
    snapshot: RwLock<Arc<CatalogSnapshot>>,
}

impl CatalogStore {
    /// Creates a store with an empty snapshot. Call [`reload`](Self::reload)
    /// to pick up repositories already on disk.
    pub fn new(layout: PackageLayout, vcs: Arc<dyn VersionControl>) -> Self {
        Self { layout, vcs, snapshot: RwLock::new(Arc::new(CatalogSnapshot::default())) }
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> Arc<CatalogSnapshot> {
        Arc::clone(&*self.snapshot.read().unwrap_or_else(PoisonError::into_inner))
    }

    /// Clones or updates the repository `repo_id` from `remote_url`.
    ///
    /// A first refresh clones into `<repos>/<repo_id>`; later ones run a hard
    /// reset followed by a pull; a failed reset skips the pull. The output of
    /// the last step run is returned unchanged, tagged with that step. The
    /// snapshot is reloaded only when the gateway reported success.
    pub fn refresh(
        &self,
        repo_id: &str,
        remote_url: &str,
        sink: Option<&mut dyn ResponseSink>,
    ) -> Result<Refresh> {
        let repos_dir = self.layout.ensure_repos_dir()?;
        let repo_path = self.layout.repo_path(repo_id);

        let refresh = if repo_path.exists() {
            info!(repo = repo_id, "Updating catalog repository");
            let reset = self.vcs.reset(&repo_path, true)?;
            if reset.is_error {
                Refresh { step: RefreshStep::Reset, output: reset }
            } else {
                Refresh { step: RefreshStep::Pull, output: self.vcs.pull(&repo_path)? }
            }
        } else {
            info!(repo = repo_id, url = remote_url, "Cloning catalog repository");
            let output = self.vcs.clone_repo(remote_url, repo_id, &repos_dir)?;
            Refresh { step: RefreshStep::Clone, output }
        };

        if refresh.output.is_error {
            warn!(
                repo = repo_id,
                step = refresh.step.as_str(),
                status = refresh.output.exit_status,
                "Catalog refresh failed"
            );
        } else {
            self.reload(sink)?;
        }

        Ok(refresh)
    }

    /// Rescans `<repos>/` and swaps in a fresh snapshot.
    ///
    /// Repositories whose document is missing or malformed are left out of
    /// the snapshot and reported through `sink`, one message each.
    pub fn reload(&self, mut sink: Option<&mut dyn ResponseSink>) -> Result<ReloadReport> {
        let repos_dir = self.layout.ensure_repos_dir()?;
        let mut entries = BTreeMap::new();
        let mut report = ReloadReport::default();

        for repo_id in list_dir_names(&repos_dir)? {
            let path = metadata_path(&repos_dir.join(&repo_id));
            match RepositoryDocument::load(&path) {
                Ok(document) => {
                    entries.insert(
                        repo_id.clone(),
                        CatalogEntry { id: repo_id.clone(), packages: document.packages },
                    );
                    report.loaded.push(repo_id);
                }
                Err(e) => {
                    warn!(repo = %repo_id, error = %e, "Error reloading repo");
                    if let Some(sink) = sink.as_deref_mut() {
                        sink.respond(&format!("Error reloading repo: {}", repo_id));
                    }
                    report.failed.push((repo_id, e));
                }
            }
        }

        let snapshot = Arc::new(CatalogSnapshot { entries });
        *self.snapshot.write().unwrap_or_else(PoisonError::into_inner) = snapshot;

        info!(loaded = report.loaded.len(), failed = report.failed.len(), "Catalog reloaded");
        Ok(report)
    }

    /// Loaded repository by id.
    pub fn get(&self, repo_id: &str) -> Option<CatalogEntry> {
        self.snapshot().get(repo_id).cloned()
    }

    /// First package named `pkg_name` in repository `repo_id`.
    pub fn find_package(&self, pkg_name: &str, repo_id: &str) -> Option<PackageDescriptor> {
        self.snapshot().get(repo_id).and_then(|entry| entry.find(pkg_name)).cloned()
    }
}
