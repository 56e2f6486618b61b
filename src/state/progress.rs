//! Watched-progress persistence
//!
//! Progress lives in a sidecar file `progress.json` next to the scanned
//! sections. It is loaded once per directory and rewritten in full after
//! every change.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::ProgressError;

/// Name of the sidecar file inside the root directory
pub const PROGRESS_FILE_NAME: &str = "progress.json";

/// Per-video entry in the `dict` map
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
pub struct VideoProgress {
    #[serde(default)]
    pub checked: bool,
    /// Fields written by other tools are kept on rewrite
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// On-disk shape of the sidecar file
#[derive(Serialize, Deserialize, Debug, Clone, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default)]
    pub current_video_id: Option<String>,
    #[serde(default)]
    pub dict: BTreeMap<String, VideoProgress>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Progress {
    pub fn is_checked(&self, video_id: &str) -> bool {
        self.dict.get(video_id).is_some_and(|entry| entry.checked)
    }

    /// Apply a patch in place. Returns true if anything changed.
    pub fn apply(&mut self, patch: &ProgressPatch) -> bool {
        match patch {
            ProgressPatch::SetCurrent(video_id) => {
                if self.current_video_id.as_deref() == Some(video_id.as_str()) {
                    return false;
                }
                self.current_video_id = Some(video_id.clone());
                true
            }
            ProgressPatch::SetChecked { video_id, checked } => match self.dict.get_mut(video_id) {
                Some(entry) if entry.checked == *checked => false,
                Some(entry) => {
                    entry.checked = *checked;
                    true
                }
                // A new `false` entry is still a change: the key now exists on disk
                None => {
                    self.dict.insert(
                        video_id.clone(),
                        VideoProgress {
                            checked: *checked,
                            extra: Map::new(),
                        },
                    );
                    true
                }
            },
        }
    }
}

/// Typed mutation of the progress store
#[derive(Debug, Clone, PartialEq)]
pub enum ProgressPatch {
    /// Mark a video as the one to resume
    SetCurrent(String),
    /// Set the watched flag, keeping other fields of the entry
    SetChecked { video_id: String, checked: bool },
}

/// The progress of one root directory, bound to its sidecar file
#[derive(Debug, Clone)]
pub struct ProgressStore {
    path: PathBuf,
    progress: Progress,
}

impl ProgressStore {
    /// Load progress for `root`.
    ///
    /// A missing or unparsable file is the normal state of a directory
    /// opened for the first time, so both yield the default store.
    pub fn load(root: &Path) -> Self {
        let path = root.join(PROGRESS_FILE_NAME);

        let progress = match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<Progress>(&contents) {
                Ok(progress) => {
                    log::info!(
                        "📖 Loaded progress: {} entries, current = {:?}",
                        progress.dict.len(),
                        progress.current_video_id
                    );
                    progress
                }
                Err(e) => {
                    log::warn!("⚠️  Ignoring unreadable {}: {}", path.display(), e);
                    Progress::default()
                }
            },
            Err(_) => {
                log::info!("📄 No progress file at {}, starting fresh", path.display());
                Progress::default()
            }
        };

        Self { path, progress }
    }

    pub fn progress(&self) -> &Progress {
        &self.progress
    }

    pub fn current_video_id(&self) -> Option<&str> {
        self.progress.current_video_id.as_deref()
    }

    /// Apply `patch` and flush the whole store to disk.
    ///
    /// Returns whether the store changed. Unchanged stores are not
    /// rewritten. On a write error the in-memory change is kept.
    pub fn update(&mut self, patch: ProgressPatch) -> Result<bool, ProgressError> {
        if !self.progress.apply(&patch) {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Write the store as formatted JSON, replacing the file atomically
    fn save(&self) -> Result<(), ProgressError> {
        let json = serde_json::to_string_pretty(&self.progress)?;

        let tmp_path = self.path.with_extension("json.tmp");
        let write_err = |source| ProgressError::Write {
            path: self.path.clone(),
            source,
        };

        {
            let mut file = File::create(&tmp_path).map_err(write_err)?;
            file.write_all(json.as_bytes()).map_err(write_err)?;
            file.sync_all().map_err(write_err)?;
        }
        fs::rename(&tmp_path, &self.path).map_err(write_err)?;

        log::debug!("💾 Saved progress to {}", self.path.display());
        Ok(())
    }
}
