//! Application configuration.

use crate::error::{AppError, AppResult};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tactica_core::{BoardConfig, Orientation};
use tactica_render::{ExportConfig, Theme};

/// Settings for the `tactica` binary, read from a JSON file and then
/// overridden by command-line flags.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppConfig {
    /// Where diagrams live. Defaults to the platform data directory.
    pub storage_dir: Option<PathBuf>,
    /// Where printed pages are spooled.
    pub spool_dir: Option<PathBuf>,
    pub owner_id: String,
    pub display_name: String,
    /// Layout boards are opened in.
    pub orientation: Orientation,
    pub board: BoardConfig,
    pub theme: Theme,
    pub export: ExportConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            storage_dir: None,
            spool_dir: None,
            owner_id: "local".to_string(),
            display_name: "Coach".to_string(),
            orientation: Orientation::Horizontal,
            board: BoardConfig::default(),
            theme: Theme::default(),
            export: ExportConfig::default(),
        }
    }
}

impl AppConfig {
    /// `<config dir>/tactica/config.json`, if the platform has a config dir.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tactica").join("config.json"))
    }

    /// Load from `path`, or from the default location when it exists.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(path: Option<&Path>) -> AppResult<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => match Self::default_path().filter(|p| p.exists()) {
                Some(path) => path,
                None => {
                    log::debug!("No config file, using defaults");
                    return Ok(Self::default());
                }
            },
        };
        let json = fs::read_to_string(&path)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        let config = serde_json::from_str(&json)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        log::info!("Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn storage_dir(&self) -> AppResult<PathBuf> {
        self.storage_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("tactica").join("diagrams")))
            .ok_or_else(|| AppError::Config("no storage directory; pass --storage".into()))
    }

    pub fn spool_dir(&self) -> AppResult<PathBuf> {
        self.spool_dir
            .clone()
            .or_else(|| dirs::data_local_dir().map(|dir| dir.join("tactica").join("print")))
            .ok_or_else(|| AppError::Config("no spool directory configured".into()))
    }
}
