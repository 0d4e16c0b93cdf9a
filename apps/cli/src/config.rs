//! CLI configuration loading and merging.

use anyhow::Context;
use pkgbot_core::config::PkgbotConfig;
use std::path::{Path, PathBuf};

/// Load and merge CLI configuration.
///
/// Configuration precedence:
/// 1. CLI arguments (`--base-dir`, `--config`)
/// 2. Environment variables (`PKGBOT_*`)
/// 3. Local config file (./.pkgbotrc)
/// 4. Global config file (~/.pkgbot/config.toml)
/// 5. Defaults
pub fn load_config(explicit: Option<&Path>, base_dir: Option<PathBuf>) -> anyhow::Result<PkgbotConfig> {
    let mut config = PkgbotConfig::discover_and_load();

    if let Some(path) = explicit {
        let file_config = PkgbotConfig::load_from_file(path)
            .with_context(|| format!("Failed to load config file {}", path.display()))?;
        config.merge(&file_config);
    }

    if base_dir.is_some() {
        config.base_dir = base_dir;
    }

    Ok(config)
}
