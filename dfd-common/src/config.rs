//! Configuration file resolution and TOML loading

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use std::path::{Path, PathBuf};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "DFD_CONFIG";

/// Config file resolution following priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`DFD_CONFIG`)
/// 3. Platform config directory (`<config_dir>/dfd/config.toml`), if it exists
/// 4. None (compiled defaults are used)
///
/// An explicitly named file (1 or 2) is returned even if it does not exist,
/// so that loading reports the missing file instead of silently using defaults.
pub fn resolve_config_file(cli_arg: Option<&Path>) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: platform config directory
    default_config_file().filter(|path| path.exists())
}

/// Get default configuration file path for the platform
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("dfd").join("config.toml"))
}

/// Load a TOML document into `T`
///
/// `None` yields `T::default()`. A named file that cannot be read or parsed is
/// a configuration error: startup must not continue on a half-read config.
pub fn load_toml<T>(path: Option<&Path>) -> Result<T>
where
    T: DeserializeOwned + Default,
{
    let Some(path) = path else {
        tracing::debug!("No config file found, using compiled defaults");
        return Ok(T::default());
    };

    let content = std::fs::read_to_string(path).map_err(|e| {
        Error::Config(format!("Read config {} failed: {}", path.display(), e))
    })?;
    let config = toml::from_str(&content)?;
    tracing::info!("Configuration loaded from {}", path.display());
    Ok(config)
}

/// Read an environment override, ignoring unset or blank values
pub fn env_override(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
