pub mod schema;
pub mod watcher;

pub use schema::{BatteryConfig, CalibrationConfig, MonitorConfig, UpsConfig};
pub use watcher::ConfigWatcher;

use std::path::{Path, PathBuf};
use ups_core::{Result, UpsError};

/// Load and validate configuration from a TOML file.  Returns
/// `UpsConfig::default()` if the file doesn't exist so the monitor always
/// starts with sensible defaults.
pub fn load(path: impl AsRef<Path>) -> Result<UpsConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Config file not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(UpsConfig::default());
    }

    let raw = std::fs::read_to_string(path)
        .map_err(|e| UpsError::Config(format!("cannot read '{}': {e}", path.display())))?;

    let config: UpsConfig =
        toml::from_str(&raw).map_err(|e| UpsError::Config(format!("TOML parse error: {e}")))?;
    config.validate()?;
    Ok(config)
}

/// Return the config path: `$UPSMON_CONFIG` if set, otherwise
/// `$XDG_CONFIG_HOME/upsmon/upsmon.toml`.
pub fn default_path() -> PathBuf {
    if let Ok(path) = std::env::var("UPSMON_CONFIG") {
        return PathBuf::from(path);
    }
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("upsmon").join("upsmon.toml")
}
