//! Package resolver.
//!
//! Turns a raw install token into a clone source and an install-name. Tokens
//! with an `http`/`https` scheme are direct sources; anything else is looked
//! up by `pkg_name` in the default catalog repository.

use crate::error::{PackageError, Result};
use crate::packages::catalog::CatalogSnapshot;
use crate::packages::manifest::{PackageDescriptor, validate_install_name};
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// Where to clone from and what to call the result.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub url: String,
    pub install_name: String,
    pub descriptor: Option<PackageDescriptor>,
}

impl Resolution {
    /// Extensions to activate after install.
    pub fn default_enable(&self) -> &[String] {
        self.descriptor.as_ref().map_or(&[], |d| d.default_enable.as_slice())
    }
}

/// Resolves tokens against one catalog snapshot.
pub struct PackageResolver {
    snapshot: Arc<CatalogSnapshot>,
    repo_id: String,
}

impl PackageResolver {
    pub fn new(snapshot: Arc<CatalogSnapshot>, repo_id: impl Into<String>) -> Self {
        Self { snapshot, repo_id: repo_id.into() }
    }

    /// Classifies `token` and resolves it.
    ///
    /// # Errors
    ///
    /// - `CatalogUnavailable` when a name lookup needs a repository that is
    ///   not loaded
    /// - `NotFound` when the repository has no such package
    /// - `InvalidSource` when no safe install-name can be derived, or when a
    ///   catalog entry's source is not an http(s) URL
    pub fn resolve(&self, token: &str) -> Result<Resolution> {
        let token = token.trim();
        if token.is_empty() {
            return Err(PackageError::InvalidSource(token.to_string()));
        }

        match parse_remote(token) {
            Some(url) => self.resolve_url(token, &url),
            None => self.resolve_name(token),
        }
    }

    fn resolve_url(&self, token: &str, url: &Url) -> Result<Resolution> {
        let descriptor = self
            .snapshot
            .get(&self.repo_id)
            .and_then(|entry| entry.packages.iter().find(|pkg| pkg.repo == token))
            .cloned();

        let install_name = match &descriptor {
            Some(pkg) => pkg.pkg_name.clone(),
            None => install_name_from_url(url)
                .ok_or_else(|| PackageError::InvalidSource(token.to_string()))?,
        };
        validate_install_name(&install_name)
            .map_err(|_| PackageError::InvalidSource(token.to_string()))?;

        debug!(url = token, install_name = %install_name, matched = descriptor.is_some(), "Resolved URL");
        Ok(Resolution { url: token.to_string(), install_name, descriptor })
    }

    fn resolve_name(&self, name: &str) -> Result<Resolution> {
        let entry = self
            .snapshot
            .get(&self.repo_id)
            .ok_or_else(|| PackageError::CatalogUnavailable(self.repo_id.clone()))?;

        let descriptor = entry.find(name).cloned().ok_or_else(|| PackageError::NotFound {
            name: name.to_string(),
            repo: self.repo_id.clone(),
        })?;
        validate_install_name(&descriptor.pkg_name)
            .map_err(|_| PackageError::InvalidSource(name.to_string()))?;
        if parse_remote(&descriptor.repo).is_none() {
            warn!(package = name, repo = %descriptor.repo, "Catalog entry has no http(s) source");
            return Err(PackageError::InvalidSource(descriptor.repo));
        }

        Ok(Resolution {
            url: descriptor.repo.clone(),
            install_name: descriptor.pkg_name.clone(),
            descriptor: Some(descriptor),
        })
    }
}

/// Parses `token` as an `http`/`https` URL.
fn parse_remote(token: &str) -> Option<Url> {
    Url::parse(token).ok().filter(|url| matches!(url.scheme(), "http" | "https"))
}

/// Last non-empty path segment of `url` without a trailing `.git`.
///
/// `https://host/owner/weather.git` yields `weather`; a URL with no path
/// yields `None`.
pub fn install_name_from_url(url: &Url) -> Option<String> {
    let segment = url.path_segments()?.rfind(|s| !s.is_empty())?;
    let name = segment.strip_suffix(".git").unwrap_or(segment);
    if name.is_empty() || validate_install_name(name).is_err() {
        return None;
    }
    Some(name.to_string())
}
