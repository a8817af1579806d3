//! Configuration handling.
//!
//! Defaults work with no file at all; an optional YAML file
//! (`.board-watch.yaml` in the working directory, or
//! `<config dir>/board-watch/config.yaml`) and the `BOARD_WATCH_DB`
//! environment variable override them.

use crate::error::{BoardWatchError, Result};
use crate::store::default_db_path;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Recognized config file name in the working directory.
const LOCAL_CONFIG_NAME: &str = ".board-watch.yaml";

/// Tool configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardWatchConfig {
    /// Path to the SQLite state database. Defaults to the user cache
    /// directory when unset.
    pub database_path: Option<PathBuf>,
    /// Default number of history entries shown by the `history` command.
    pub history_limit: usize,
}

impl Default for BoardWatchConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            history_limit: 20,
        }
    }
}

impl BoardWatchConfig {
    /// Effective database path: explicit CLI value, `BOARD_WATCH_DB`, the
    /// config file, then the per-user default — first match wins.
    #[must_use]
    pub fn database_path(&self, cli_override: Option<&Path>) -> PathBuf {
        if let Some(path) = cli_override {
            return path.to_path_buf();
        }
        if let Ok(path) = std::env::var("BOARD_WATCH_DB") {
            if !path.is_empty() {
                return PathBuf::from(path);
            }
        }
        self.database_path
            .clone()
            .unwrap_or_else(default_db_path)
    }
}

/// Find the active config file: an explicit path wins, then the working
/// directory, then the user config directory.
#[must_use]
pub fn discover_config_file(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }
    let local = PathBuf::from(LOCAL_CONFIG_NAME);
    if local.is_file() {
        return Some(local);
    }
    let user = dirs::config_dir()?.join("board-watch").join("config.yaml");
    user.is_file().then_some(user)
}

/// Load configuration, falling back to defaults when no file is found.
/// Returns the config and the path it was loaded from, if any.
pub fn load_or_default(explicit: Option<&Path>) -> Result<(BoardWatchConfig, Option<PathBuf>)> {
    let Some(path) = discover_config_file(explicit) else {
        return Ok((BoardWatchConfig::default(), None));
    };
    let content =
        std::fs::read_to_string(&path).map_err(|e| BoardWatchError::io(path.clone(), e))?;
    let config: BoardWatchConfig = serde_yaml::from_str(&content)
        .map_err(|e| BoardWatchError::config(format!("{}: {e}", path.display())))?;
    debug!(path = %path.display(), "configuration loaded");
    Ok((config, Some(path)))
}
