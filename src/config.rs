//! Application settings
//!
//! Stored as JSON in the user's config directory:
//! - Linux: ~/.config/playlist-player/config.json
//! - macOS: ~/Library/Application Support/playlist-player/config.json
//! - Windows: %APPDATA%\playlist-player\config.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;
use crate::library::ScanOptions;
use crate::state::playback::DEFAULT_COMPLETION_TAIL_SECS;

const APP_DIR: &str = "playlist-player";
const CONFIG_FILE: &str = "config.json";

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppConfig {
    /// Directory reopened at startup
    pub last_directory: Option<PathBuf>,
    /// Player executable (must speak the mpv JSON IPC protocol)
    pub player_binary: String,
    /// How often the player is polled for progress
    pub poll_interval_ms: u64,
    /// Unplayed tail under which a video is marked watched
    pub completion_tail_secs: f64,
    pub video_extension: String,
    pub subtitle_extension: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        let scan = ScanOptions::default();
        Self {
            last_directory: None,
            player_binary: "mpv".to_string(),
            poll_interval_ms: 250,
            completion_tail_secs: DEFAULT_COMPLETION_TAIL_SECS,
            video_extension: scan.video_extension,
            subtitle_extension: scan.subtitle_extension,
        }
    }
}

impl AppConfig {
    /// Get the path where the config should be stored
    pub fn default_path() -> Result<PathBuf, ConfigError> {
        let mut path = dirs::config_dir().ok_or(ConfigError::NoConfigDir)?;
        path.push(APP_DIR);
        path.push(CONFIG_FILE);
        Ok(path)
    }

    /// Load the config, falling back to defaults on any failure
    pub fn load_or_default() -> Self {
        match Self::default_path().and_then(|path| Self::load_from(&path)) {
            Ok(config) => config,
            Err(e) => {
                log::info!("⚙️  Using default settings ({})", e);
                Self::default()
            }
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&contents)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, serde_json::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn scan_options(&self) -> ScanOptions {
        ScanOptions {
            video_extension: self.video_extension.clone(),
            subtitle_extension: self.subtitle_extension.clone(),
        }
    }
}
