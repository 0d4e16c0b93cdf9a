//! End-to-end lifecycle tests against a directory-backed version control fake.

use pkgbot_core::packages::{
    CommandOutput, DependencyInstaller, ExtensionHost, METADATA_DIR, METADATA_FILE,
    PackageLayout, PackageManager, REQUIREMENTS_FILE, VersionControl,
};
use pkgbot_core::{PackageError, Result};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Serves "remotes" from local directories. A clone copies the directory; a
/// pull copies it again over the checkout and remembers where it came from.
#[derive(Default)]
struct DirectoryVcs {
    remotes: HashMap<String, PathBuf>,
    origins: Mutex<HashMap<PathBuf, PathBuf>>,
}

impl DirectoryVcs {
    fn with_remote(mut self, url: &str, source: PathBuf) -> Self {
        self.remotes.insert(url.to_string(), source);
        self
    }
}

fn copy_dir(from: &Path, to: &Path) {
    fs::create_dir_all(to).unwrap();
    for entry in fs::read_dir(from).unwrap() {
        let entry = entry.unwrap();
        let target = to.join(entry.file_name());
        if entry.path().is_dir() {
            copy_dir(&entry.path(), &target);
        } else {
            fs::copy(entry.path(), target).unwrap();
        }
    }
}

impl VersionControl for DirectoryVcs {
    fn clone_repo(&self, remote: &str, destination: &str, working_dir: &Path) -> Result<CommandOutput> {
        let Some(source) = self.remotes.get(remote) else {
            return Ok(CommandOutput::failure(128, format!("fatal: repository '{}' not found\n", remote)));
        };
        let checkout = working_dir.join(destination);
        copy_dir(source, &checkout);
        self.origins.lock().unwrap().insert(checkout, source.clone());
        Ok(CommandOutput::success(format!("Cloning into '{}'...\n", destination)))
    }

    fn pull(&self, repo_path: &Path) -> Result<CommandOutput> {
        match self.origins.lock().unwrap().get(repo_path) {
            Some(source) => {
                copy_dir(source, repo_path);
                Ok(CommandOutput::success("Fast-forward\n"))
            }
            None => Ok(CommandOutput::failure(1, "fatal: no tracking information\n")),
        }
    }

    fn reset(&self, _repo_path: &Path, _hard: bool) -> Result<CommandOutput> {
        Ok(CommandOutput::success(""))
    }
}

#[derive(Default)]
struct RecordingInstaller {
    requests: Mutex<Vec<PathBuf>>,
}

impl DependencyInstaller for RecordingInstaller {
    fn install(&self, requirements: &Path) -> Result<CommandOutput> {
        self.requests.lock().unwrap().push(requirements.to_path_buf());
        Ok(CommandOutput::success("ok\n"))
    }
}

#[derive(Default)]
struct RecordingHost {
    activated: Mutex<Vec<String>>,
    reloads: Mutex<usize>,
}

impl ExtensionHost for RecordingHost {
    fn reload_extensions(&self) {
        *self.reloads.lock().unwrap() += 1;
    }

    fn activate_extension(&self, name: &str) -> bool {
        self.activated.lock().unwrap().push(name.to_string());
        true
    }
}

fn write_package_source(root: &Path, name: &str, version: &str, requirements: bool) -> PathBuf {
    let source = root.join("remotes").join(name);
    fs::create_dir_all(source.join(METADATA_DIR)).unwrap();
    fs::write(source.join(format!("{}.py", name)), "# plugin\n").unwrap();
    fs::write(
        source.join(METADATA_DIR).join(METADATA_FILE),
        serde_json::json!({ "version": version, "description": format!("{} plugin", name) }).to_string(),
    )
    .unwrap();
    if requirements {
        fs::write(source.join(METADATA_DIR).join(REQUIREMENTS_FILE), "requests\n").unwrap();
    }
    source
}

fn write_catalog_source(root: &Path) -> PathBuf {
    let source = root.join("remotes").join("catalog");
    fs::create_dir_all(source.join(METADATA_DIR)).unwrap();
    let document = serde_json::json!({
        "packages": [
            {
                "pkg_name": "weather",
                "name": "Weather",
                "version": "1.0",
                "description": "Forecasts on demand",
                "repo": "https://example/weather.git",
                "default_enable": ["weather"]
            },
            {
                "pkg_name": "dice",
                "name": "Dice",
                "version": "0.1",
                "description": "Rolls dice",
                "repo": "https://example/dice.git"
            }
        ]
    });
    fs::write(source.join(METADATA_DIR).join(METADATA_FILE), document.to_string()).unwrap();
    source
}

struct Harness {
    temp_dir: TempDir,
    manager: PackageManager,
    installer: Arc<RecordingInstaller>,
    host: Arc<RecordingHost>,
}

fn harness() -> Harness {
    let temp_dir = TempDir::new().unwrap();
    let root = temp_dir.path();

    let vcs = DirectoryVcs::default()
        .with_remote("https://example/catalog.git", write_catalog_source(root))
        .with_remote("https://example/weather.git", write_package_source(root, "weather", "1.0", true))
        .with_remote("https://example/dice.git", write_package_source(root, "dice", "0.1", false));

    let installer = Arc::new(RecordingInstaller::default());
    let host = Arc::new(RecordingHost::default());
    let manager = PackageManager::new(
        PackageLayout::new(root.join("pkgs")),
        Arc::new(vcs),
        installer.clone(),
        host.clone(),
    )
    .with_repository("main", "https://example/catalog.git");

    Harness { temp_dir, manager, installer, host }
}

#[test]
fn test_full_lifecycle() {
    let h = harness();
    let mut messages: Vec<String> = Vec::new();

    // Nothing cached yet
    assert!(matches!(h.manager.search("weather"), Err(PackageError::CatalogUnavailable(_))));

    h.manager.update_catalog(&mut messages).unwrap();
    assert_eq!(messages.last().unwrap(), "main: Cloning into 'main'...\n");
    assert_eq!(h.manager.search("forecast").unwrap(), "weather | 1.0 | Forecasts on demand\n");

    let report = h.manager.install("weather dice", &mut messages);
    assert!(!report.has_failures());
    assert_eq!(
        h.manager.list_installed().unwrap(),
        "dice | 0.1 | dice plugin\nweather | 1.0 | weather plugin\n"
    );

    // Only weather ships requirements
    let requests = h.installer.requests.lock().unwrap().clone();
    assert_eq!(requests, vec![h.manager.layout().requirements_path("weather")]);
    assert_eq!(*h.host.activated.lock().unwrap(), vec!["weather"]);
    assert_eq!(*h.host.reloads.lock().unwrap(), 2);

    let report = h.manager.uninstall("dice", &mut messages);
    assert!(!report.has_failures());
    assert_eq!(h.manager.list_installed().unwrap(), "weather | 1.0 | weather plugin\n");

    let trash: Vec<String> = fs::read_dir(h.manager.layout().trash_dir())
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    assert_eq!(trash.len(), 1);
    assert!(trash[0].starts_with("dice."));
}

#[test]
fn test_upgrade_picks_up_upstream_changes() {
    let h = harness();
    let mut messages: Vec<String> = Vec::new();
    h.manager.update_catalog(&mut messages).unwrap();
    h.manager.install("weather", &mut messages);

    write_package_source(h.temp_dir.path(), "weather", "2.0", true);
    messages.clear();

    let item = h.manager.upgrade("weather", &mut messages);
    assert!(item.is_ok());
    assert_eq!(messages, vec!["0 weather: Fast-forward\n"]);
    assert_eq!(h.manager.list_installed().unwrap(), "weather | 2.0 | weather plugin\n");
}

#[test]
fn test_url_install_of_unknown_remote_leaves_no_trace() {
    let h = harness();
    let mut messages: Vec<String> = Vec::new();

    let report = h.manager.install("https://example/missing.git", &mut messages);

    assert!(report.has_failures());
    assert!(messages[0].contains("repository 'https://example/missing.git' not found"));
    assert!(!h.manager.layout().is_installed("missing"));
    assert_eq!(*h.host.reloads.lock().unwrap(), 0);
}

#[test]
fn test_url_install_uses_catalog_name_when_advertised() {
    let h = harness();
    let mut messages: Vec<String> = Vec::new();
    h.manager.update_catalog(&mut messages).unwrap();

    let report = h.manager.install("https://example/weather.git", &mut messages);
    let outcome = report.items[0].result.as_ref().unwrap();

    assert_eq!(outcome.install_name, "weather");
    assert_eq!(outcome.activated, vec!["weather"]);
}

#[test]
fn test_installed_packages_structured() {
    let h = harness();
    let mut messages: Vec<String> = Vec::new();
    h.manager.update_catalog(&mut messages).unwrap();
    h.manager.install("dice", &mut messages);
    fs::create_dir_all(h.manager.layout().install_path("handmade")).unwrap();

    let installed = h.manager.installed_packages().unwrap();
    let names: Vec<&str> = installed.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["dice", "handmade"]);
    assert_eq!(installed[0].metadata.as_ref().unwrap().version, "0.1");
    assert!(installed[1].metadata.is_none());

    let json = serde_json::to_value(&installed).unwrap();
    assert_eq!(json[0]["metadata"]["version"], "0.1");
    assert!(json[1]["metadata"].is_null());
}
