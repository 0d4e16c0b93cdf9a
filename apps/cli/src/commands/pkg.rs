//! Package command implementations.
//!
//! Each command builds a [`PackageManager`] from the effective configuration,
//! runs one entry point and prints its messages. Batch commands fail with a
//! non-zero exit status when any requested package failed.

use colored::Colorize;
use pkgbot_core::config::PkgbotConfig;
use pkgbot_core::packages::{BatchReport, LoggingHost, PackageManager, ResponseSink};
use std::sync::Arc;

/// Prints manager messages to stdout.
struct ConsoleSink;

impl ResponseSink for ConsoleSink {
    fn respond(&mut self, message: &str) {
        println!("{}", message.trim_end());
    }
}

fn open_manager(config: &PkgbotConfig) -> anyhow::Result<PackageManager> {
    Ok(PackageManager::from_config(config, Arc::new(LoggingHost))?)
}

/// Prints a ✓/✗ line per item and fails if any item failed.
fn summarize<T>(report: &BatchReport<T>, verb: &str) -> anyhow::Result<()> {
    if report.len() > 1 {
        println!();
        for item in &report.items {
            match &item.result {
                Ok(_) => println!("  {} {}", "✓".green(), item.name),
                Err(e) => println!("  {} {} ({})", "✗".red(), item.name, format!("{:?}", e.kind()).bright_black()),
            }
        }
    }

    if report.has_failures() {
        let failed = report.len() - report.succeeded();
        anyhow::bail!("Failed to {} {} of {} package(s)", verb, failed, report.len());
    }
    Ok(())
}

/// Search the default catalog repository.
pub async fn search(config: &PkgbotConfig, query: &str, json_output: bool) -> anyhow::Result<()> {
    let manager = open_manager(config)?;

    if json_output {
        let packages = manager.search_packages(query)?;
        println!("{}", serde_json::to_string_pretty(&packages)?);
        return Ok(());
    }

    let rows = manager.search(query)?;
    if rows.is_empty() {
        println!("{}", format!("No packages match '{}'.", query).yellow());
    } else {
        print!("{}", rows);
    }
    Ok(())
}

/// Install packages by name or URL.
pub async fn install(config: &PkgbotConfig, names: &[String]) -> anyhow::Result<()> {
    let manager = open_manager(config)?;
    let report = manager.install(&names.join(" "), &mut ConsoleSink);
    summarize(&report, "install")
}

/// Refresh the catalog cache.
///
/// The manager already printed the failure details, so an error ends with a
/// one-line summary.
pub async fn update(config: &PkgbotConfig) -> anyhow::Result<()> {
    let manager = open_manager(config)?;
    if let Err(e) = manager.update_catalog(&mut ConsoleSink) {
        anyhow::bail!("Failed to update catalog '{}' ({:?})", manager.repository_name(), e.kind());
    }
    println!("{} Catalog '{}' updated", "✓".green(), manager.repository_name());
    Ok(())
}

/// Upgrade one package or every installed package.
pub async fn upgrade(config: &PkgbotConfig, name: Option<&str>) -> anyhow::Result<()> {
    let manager = open_manager(config)?;
    match name {
        Some(name) => {
            let item = manager.upgrade(name, &mut ConsoleSink);
            if let Err(e) = item.result {
                anyhow::bail!("Failed to upgrade {} ({:?})", item.name, e.kind());
            }
            Ok(())
        }
        None => {
            let report = manager.upgrade_all(&mut ConsoleSink);
            summarize(&report, "upgrade")
        }
    }
}

/// Move installed packages to the trash.
pub async fn uninstall(config: &PkgbotConfig, names: &[String]) -> anyhow::Result<()> {
    let manager = open_manager(config)?;
    let report = manager.uninstall(&names.join(" "), &mut ConsoleSink);
    summarize(&report, "uninstall")
}

/// List installed packages, or the whole catalog with `all`.
pub async fn list(config: &PkgbotConfig, all: bool, json_output: bool) -> anyhow::Result<()> {
    let manager = open_manager(config)?;

    if json_output {
        let json = if all {
            serde_json::to_string_pretty(&manager.catalog_packages()?)?
        } else {
            serde_json::to_string_pretty(&manager.installed_packages()?)?
        };
        println!("{}", json);
        return Ok(());
    }

    let rows = if all { manager.list_all()? } else { manager.list_installed()? };
    if rows.is_empty() {
        println!("{}", "No packages found.".yellow());
    } else {
        println!("{}", rows.trim_end());
    }
    Ok(())
}

/// Ask the host to reload extensions.
pub async fn reload(config: &PkgbotConfig) -> anyhow::Result<()> {
    let manager = open_manager(config)?;
    println!("{} {}", "✓".green(), manager.reload_extensions());
    Ok(())
}

/// Print one help line per entry point.
pub fn usage() {
    for line in PackageManager::usage() {
        println!("{}", line);
    }
}
