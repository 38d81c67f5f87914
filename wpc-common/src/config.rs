//! Configuration loading and data folder resolution

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings read from the optional TOML config file
///
/// Everything here can also be supplied through environment variables,
/// which take precedence (see `resolve_data_folder` and
/// `wpc-catalog`'s Redmine config resolution).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TomlConfig {
    /// Data folder holding the SQLite database
    pub data_folder: Option<String>,
    /// Base URL of the Redmine instance (e.g. "https://redmine.example.com")
    pub redmine_url: Option<String>,
    /// Redmine API key
    pub redmine_token: Option<String>,
    /// Default project identifier for sync runs
    pub redmine_default_project: Option<String>,
    /// Default tracker id filter for sync runs
    pub redmine_default_tracker: Option<String>,
}

/// Load the TOML config file if one exists at the platform location
///
/// Resolution order:
/// 1. `WPC_CONFIG` environment variable (explicit path)
/// 2. `~/.config/wpc/config.toml` (or the platform equivalent)
///
/// A missing file is not an error; a present-but-unparsable file is.
pub fn load_toml_config() -> Result<TomlConfig> {
    let path = match config_file_path() {
        Some(path) if path.exists() => path,
        _ => return Ok(TomlConfig::default()),
    };

    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Failed to parse {}: {}", path.display(), e)))
}

fn config_file_path() -> Option<PathBuf> {
    if let Ok(path) = std::env::var("WPC_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|d| d.join("wpc").join("config.toml"))
}

/// Resolve the data folder holding the database
///
/// Priority order:
/// 1. `WPC_DATA_FOLDER` environment variable
/// 2. `data_folder` in the TOML config file
/// 3. OS-dependent default (`~/.local/share/wpc` or platform equivalent)
pub fn resolve_data_folder(toml_config: &TomlConfig) -> PathBuf {
    if let Ok(path) = std::env::var("WPC_DATA_FOLDER") {
        return PathBuf::from(path);
    }

    if let Some(path) = &toml_config.data_folder {
        return PathBuf::from(path);
    }

    dirs::data_local_dir()
        .map(|d| d.join("wpc"))
        .unwrap_or_else(|| PathBuf::from("./wpc_data"))
}

/// Create the data folder if missing and return the database path inside it
pub fn ensure_data_folder(data_folder: &Path) -> Result<PathBuf> {
    std::fs::create_dir_all(data_folder)?;
    Ok(data_folder.join("wpc.db"))
}
