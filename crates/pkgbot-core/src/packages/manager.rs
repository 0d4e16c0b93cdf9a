//! Lifecycle orchestrator.
//!
//! Drives packages through install, upgrade and uninstall:
//!
//! ```text
//! NOT_INSTALLED --install--> INSTALLED --uninstall--> TRASHED
//!                            INSTALLED --upgrade----> INSTALLED
//! ```
//!
//! No state is persisted beyond the filesystem. Batch operations isolate
//! failures per item: every requested name is attempted and reported.

use crate::config::PkgbotConfig;
use crate::error::{PackageError, Result};
use crate::packages::catalog::{CatalogStore, Refresh, ReloadReport};
use crate::packages::deps::{CommandInstaller, DependencyInstaller, DependencyStep};
use crate::packages::host::{ExtensionHost, ResponseSink};
use crate::packages::layout::PackageLayout;
use crate::packages::manifest::{InstalledMetadata, PackageDescriptor, validate_install_name};
use crate::packages::process::CommandOutput;
use crate::packages::resolver::{PackageResolver, Resolution};
use crate::packages::vcs::{GitCli, VersionControl};
use regex::RegexBuilder;
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Reply for `list` when the installed root does not exist.
pub const NO_PACKAGES_INSTALLED: &str = "There are no packages installed";

/// Reply for `upgrade` without a name when nothing is installed.
pub const NOTHING_TO_UPDATE: &str = "Nothing to update. It appears that there are no packages installed.";

/// Reply for the extension reload entry point.
pub const PLUGINS_RELOADED: &str = "Plugins reloaded";

/// Result for one requested name in a batch.
#[derive(Debug)]
pub struct ItemReport<T> {
    pub name: String,
    pub result: Result<T>,
}

impl<T> ItemReport<T> {
    pub fn is_ok(&self) -> bool {
        self.result.is_ok()
    }
}

/// Per-item results of a batch operation, in request order.
#[derive(Debug)]
pub struct BatchReport<T> {
    pub items: Vec<ItemReport<T>>,
}

impl<T> BatchReport<T> {
    fn new() -> Self {
        Self { items: Vec::new() }
    }

    fn push(&mut self, name: impl Into<String>, result: Result<T>) {
        self.items.push(ItemReport { name: name.into(), result });
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn succeeded(&self) -> usize {
        self.items.iter().filter(|item| item.is_ok()).count()
    }

    pub fn has_failures(&self) -> bool {
        self.items.iter().any(|item| !item.is_ok())
    }

    pub fn get(&self, name: &str) -> Option<&ItemReport<T>> {
        self.items.iter().find(|item| item.name == name)
    }
}

/// A completed install.
#[derive(Debug)]
pub struct InstallOutcome {
    pub install_name: String,
    pub path: PathBuf,
    pub clone: CommandOutput,
    /// Post-install dependency step; its failure does not undo the install.
    pub dependencies: DependencyStep,
    /// Default-enable extensions the host accepted.
    pub activated: Vec<String>,
}

/// An installed package as shown by `list`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstalledPackage {
    pub name: String,
    pub path: PathBuf,
    /// `None` when the checkout has no readable metadata document.
    pub metadata: Option<InstalledMetadata>,
}

/// Package lifecycle entry points.
pub struct PackageManager {
    layout: PackageLayout,
    catalog: CatalogStore,
    vcs: Arc<dyn VersionControl>,
    installer: Arc<dyn DependencyInstaller>,
    host: Arc<dyn ExtensionHost>,
    repository_name: String,
    repository_url: String,
}

impl PackageManager {
    /// Creates a manager over `layout` using the default catalog repository.
    ///
    /// The catalog snapshot starts empty; call
    /// [`load_catalog`](Self::load_catalog) to read repositories already on
    /// disk.
    pub fn new(
        layout: PackageLayout,
        vcs: Arc<dyn VersionControl>,
        installer: Arc<dyn DependencyInstaller>,
        host: Arc<dyn ExtensionHost>,
    ) -> Self {
        let catalog = CatalogStore::new(layout.clone(), Arc::clone(&vcs));
        Self {
            layout,
            catalog,
            vcs,
            installer,
            host,
            repository_name: crate::config::DEFAULT_REPOSITORY_NAME.to_string(),
            repository_url: crate::config::DEFAULT_REPOSITORY_URL.to_string(),
        }
    }

    /// Builds a manager from configuration and loads the cached catalog.
    pub fn from_config(config: &PkgbotConfig, host: Arc<dyn ExtensionHost>) -> Result<Self> {
        let git = GitCli::with_program(config.git_program());
        debug!(git = git.program(), base_dir = %config.base_dir().display(), "Opening package manager");
        let vcs: Arc<dyn VersionControl> = Arc::new(git);
        let installer = Arc::new(CommandInstaller::new(config.dependency_installer())?);

        let manager = Self::new(PackageLayout::new(config.base_dir()), vcs, installer, host)
            .with_repository(config.repository_name(), config.repository_url());
        manager.load_catalog(None)?;
        Ok(manager)
    }

    /// Sets the default catalog repository.
    #[must_use]
    pub fn with_repository(mut self, name: impl Into<String>, url: impl Into<String>) -> Self {
        self.repository_name = name.into();
        self.repository_url = url.into();
        self
    }

    pub fn layout(&self) -> &PackageLayout {
        &self.layout
    }

    pub fn catalog(&self) -> &CatalogStore {
        &self.catalog
    }

    pub fn repository_name(&self) -> &str {
        &self.repository_name
    }

    /// Reads every cached catalog repository into the snapshot.
    pub fn load_catalog(&self, sink: Option<&mut dyn ResponseSink>) -> Result<ReloadReport> {
        self.catalog.reload(sink)
    }

    /// Installs every whitespace-separated name or URL in `args`.
    pub fn install(&self, args: &str, sink: &mut dyn ResponseSink) -> BatchReport<InstallOutcome> {
        let resolver = PackageResolver::new(self.catalog.snapshot(), self.repository_name.clone());
        let mut report = BatchReport::new();

        for token in args.split_whitespace() {
            let result = self.install_one(&resolver, token);
            match &result {
                Ok(outcome) => {
                    sink.respond(&format!(
                        "{}\nSuccessfully installed package: {}",
                        outcome.clone.text(),
                        token
                    ));
                    match &outcome.dependencies {
                        DependencyStep::NotRequired => {}
                        DependencyStep::Installed(_) => {
                            sink.respond(&format!("Installed dependencies for {}", outcome.install_name));
                        }
                        DependencyStep::Failed(output) => sink.respond(&format!(
                            "Dependency installation failed for {}:\n{}",
                            outcome.install_name, output
                        )),
                    }
                }
                Err(e) => {
                    warn!(package = token, error = %e, "Install failed");
                    sink.respond(&e.to_string());
                }
            }
            report.push(token, result);
        }

        report
    }

    fn install_one(&self, resolver: &PackageResolver, token: &str) -> Result<InstallOutcome> {
        let resolution = resolver.resolve(token)?;
        let Resolution { url, install_name, .. } = &resolution;

        let path = self.layout.install_path(install_name);
        if path.exists() {
            return Err(PackageError::AlreadyInstalled(install_name.clone()));
        }

        let installed_dir = self.layout.ensure_installed_dir()?;
        info!(package = %install_name, url = %url, "Installing package");
        let clone = self.vcs.clone_repo(url, install_name, &installed_dir)?;
        if clone.is_error {
            return Err(PackageError::Vcs {
                operation: "clone",
                target: token.to_string(),
                output: clone.text(),
            });
        }

        let dependencies = self.install_dependencies(install_name);

        self.host.reload_extensions();
        let activated = resolution
            .default_enable()
            .iter()
            .filter(|extension| {
                let accepted = self.host.activate_extension(extension);
                if !accepted {
                    warn!(package = %install_name, extension = %extension, "Host rejected extension");
                }
                accepted
            })
            .cloned()
            .collect();

        info!(package = %install_name, "Package installed");
        Ok(InstallOutcome { install_name: install_name.clone(), path, clone, dependencies, activated })
    }

    fn install_dependencies(&self, install_name: &str) -> DependencyStep {
        let requirements = self.layout.requirements_path(install_name);
        if !requirements.is_file() {
            debug!(package = install_name, "No requirements file");
            return DependencyStep::NotRequired;
        }

        match self.installer.install(&requirements) {
            Ok(output) if !output.is_error => DependencyStep::Installed(output),
            Ok(output) => {
                warn!(package = install_name, status = output.exit_status, "Dependency installation failed");
                DependencyStep::Failed(output.text())
            }
            Err(e) => {
                warn!(package = install_name, error = %e, "Dependency installer unavailable");
                DependencyStep::Failed(e.to_string())
            }
        }
    }

    /// Upgrades one installed package with a hard reset followed by a pull.
    ///
    /// The tool output is reported as `"<exit> <name>: <stdout><stderr>"`
    /// whether or not it succeeded.
    pub fn upgrade(&self, name: &str, sink: &mut dyn ResponseSink) -> ItemReport<CommandOutput> {
        let result = self.upgrade_one(name, sink);
        ItemReport { name: name.to_string(), result }
    }

    /// Upgrades every installed package, continuing past failures.
    pub fn upgrade_all(&self, sink: &mut dyn ResponseSink) -> BatchReport<CommandOutput> {
        let mut report = BatchReport::new();

        if !self.layout.installed_dir().is_dir() {
            sink.respond(NOTHING_TO_UPDATE);
            return report;
        }

        match self.layout.installed_names() {
            Ok(names) => {
                for name in names {
                    let result = self.upgrade_one(&name, sink);
                    report.push(name, result);
                }
            }
            Err(e) => {
                sink.respond(&e.to_string());
                report.push(self.layout.installed_dir().display().to_string(), Err(e));
            }
        }

        report
    }

    fn upgrade_one(&self, name: &str, sink: &mut dyn ResponseSink) -> Result<CommandOutput> {
        let path = self.layout.install_path(name);
        if validate_install_name(name).is_err() || !path.is_dir() {
            warn!(package = name, "Upgrade requested for package that is not installed");
            sink.respond(&format!(
                "Cannot upgrade \"{}\". Package does not appear to be installed.",
                name
            ));
            return Err(PackageError::NotInstalled(name.to_string()));
        }

        info!(package = name, "Upgrading package");
        let (operation, output) = match self.vcs.reset(&path, true) {
            Ok(reset) if reset.is_error => ("reset", Ok(reset)),
            Ok(_) => ("pull", self.vcs.pull(&path)),
            Err(e) => ("reset", Err(e)),
        };

        let output = match output {
            Ok(output) => output,
            Err(e) => {
                sink.respond(&e.to_string());
                return Err(e);
            }
        };

        sink.respond(&format!("{} {}: {}", output.exit_status, name, output.text()));
        if output.is_error {
            warn!(package = name, status = output.exit_status, operation, "Upgrade failed");
            return Err(PackageError::Vcs { operation, target: name.to_string(), output: output.text() });
        }
        Ok(output)
    }

    /// Moves every whitespace-separated installed package in `args` to trash.
    pub fn uninstall(&self, args: &str, sink: &mut dyn ResponseSink) -> BatchReport<PathBuf> {
        let mut report = BatchReport::new();

        for name in args.split_whitespace() {
            let result = self.uninstall_one(name);
            match &result {
                Ok(_) => sink.respond(&format!("Uninstalled package: {}", name)),
                Err(PackageError::NotInstalled(_)) => {
                    sink.respond(&format!("Unable to find package: {}", name));
                }
                Err(e) => sink.respond(&e.to_string()),
            }
            report.push(name, result);
        }

        report
    }

    fn uninstall_one(&self, name: &str) -> Result<PathBuf> {
        if validate_install_name(name).is_err() || !self.layout.is_installed(name) {
            return Err(PackageError::NotInstalled(name.to_string()));
        }
        self.layout.move_to_trash(&self.layout.install_path(name))
    }

    /// Refreshes the default catalog repository.
    ///
    /// Reports `"<repo>: <stdout><stderr>"`. The snapshot is reloaded only
    /// when the refresh succeeded.
    pub fn update_catalog(&self, sink: &mut dyn ResponseSink) -> Result<CommandOutput> {
        let repo = &self.repository_name;

        match self.catalog.refresh(repo, &self.repository_url, Some(&mut *sink)) {
            Ok(Refresh { step, output }) => {
                sink.respond(&format!("{}: {}", repo, output.text()));
                if output.is_error {
                    return Err(PackageError::Vcs {
                        operation: step.as_str(),
                        target: repo.clone(),
                        output: output.text(),
                    });
                }
                Ok(output)
            }
            Err(e) => {
                sink.respond(&e.to_string());
                Err(e)
            }
        }
    }

    /// Catalog packages whose display name or description matches `query`,
    /// case-insensitively.
    pub fn search_packages(&self, query: &str) -> Result<Vec<PackageDescriptor>> {
        let pattern = RegexBuilder::new(query).case_insensitive(true).build()?;
        Ok(self
            .catalog_packages()?
            .into_iter()
            .filter(|pkg| pattern.is_match(&pkg.name) || pattern.is_match(&pkg.description))
            .collect())
    }

    /// [`search_packages`](Self::search_packages) rendered as rows.
    pub fn search(&self, query: &str) -> Result<String> {
        Ok(self
            .search_packages(query)?
            .iter()
            .map(|pkg| format_row(&pkg.pkg_name, &pkg.version, &pkg.description))
            .collect())
    }

    /// Every package advertised by the default repository.
    pub fn catalog_packages(&self) -> Result<Vec<PackageDescriptor>> {
        self.catalog
            .get(&self.repository_name)
            .map(|entry| entry.packages)
            .ok_or_else(|| PackageError::CatalogUnavailable(self.repository_name.clone()))
    }

    /// [`catalog_packages`](Self::catalog_packages) rendered as rows.
    pub fn list_all(&self) -> Result<String> {
        Ok(self
            .catalog_packages()?
            .iter()
            .map(|pkg| format_row(&pkg.pkg_name, &pkg.version, &pkg.description))
            .collect())
    }

    /// Installed packages in name order with best-effort metadata.
    pub fn installed_packages(&self) -> Result<Vec<InstalledPackage>> {
        Ok(self
            .layout
            .installed_names()?
            .into_iter()
            .map(|name| {
                let path = self.layout.install_path(&name);
                let metadata = self.layout.read_package_metadata(&path);
                InstalledPackage { name, path, metadata }
            })
            .collect())
    }

    /// Installed packages rendered as rows; undescribed ones show `-`.
    pub fn list_installed(&self) -> Result<String> {
        if !self.layout.installed_dir().is_dir() {
            return Ok(NO_PACKAGES_INSTALLED.to_string());
        }

        Ok(self
            .installed_packages()?
            .iter()
            .map(|pkg| match &pkg.metadata {
                Some(metadata) => format_row(&pkg.name, &metadata.version, &metadata.description),
                None => format_row(&pkg.name, "-", "-"),
            })
            .collect())
    }

    /// Asks the host to rescan installed extensions.
    pub fn reload_extensions(&self) -> &'static str {
        self.host.reload_extensions();
        PLUGINS_RELOADED
    }

    /// One help line per entry point.
    pub fn usage() -> &'static [&'static str] {
        &[
            "pkgbot search <query>: Search the repo for packages",
            "pkgbot update: Update the package repo cache",
            "pkgbot upgrade [pkg_name]: Update to latest version of all or specified pkg",
            "pkgbot install <package name|url>...: Install packages",
            "pkgbot uninstall <package name>...: Uninstall packages",
            "pkgbot list: List installed packages",
            "pkgbot list --all: List packages in the repo",
            "pkgbot reload: Reload installed extensions",
        ]
    }
}

/// `"<name> | <version> | <description>\n"`.
fn format_row(name: &str, version: &str, description: &str) -> String {
    format!("{} | {} | {}\n", name, version, description)
}
