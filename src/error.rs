//! Error types for the playlist player
//!
//! Errors that travel inside iced messages (`ScanError`, `PlayerError`)
//! must be `Clone`, so they carry rendered strings instead of `io::Error`.

use std::path::PathBuf;
use thiserror::Error;

/// Failure to turn a root directory into a playlist
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScanError {
    /// Root is missing, unreadable, or not a directory
    #[error("invalid directory {}: {reason}", path.display())]
    InvalidDirectory { path: PathBuf, reason: String },

    /// The background scan task panicked or was cancelled
    #[error("scan task failed: {0}")]
    Task(String),
}

/// Failure to persist the progress sidecar file
#[derive(Debug, Error)]
pub enum ProgressError {
    #[error("failed to serialize progress: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure to prepare or start playback of a video
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PlayerError {
    #[error("media file not found: {}", .0.display())]
    MediaMissing(PathBuf),

    #[error("failed to start player `{binary}`: {reason}")]
    Spawn { binary: String, reason: String },

    #[error("preparation task failed: {0}")]
    Task(String),
}

/// Failure to read or write the application config
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no config directory available on this platform")]
    NoConfigDir,

    #[error("config I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}
