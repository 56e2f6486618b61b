//! External mpv player driven over its JSON IPC socket
//!
//! The player runs as a separate process. Playback position, duration and
//! end-of-file are observed as mpv properties and folded into a
//! `ProgressReport` whenever they change between polls.

use serde_json::{json, Value};
use std::ffi::OsString;
use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, Command, Stdio};

#[cfg(unix)]
use std::os::unix::net::UnixStream;

use crate::error::PlayerError;
use crate::state::data::PlayingVideo;
use crate::state::playback::ProgressReport;

/// Properties observed on connect, by observer id
const OBSERVED: [(u64, &str); 3] = [(1, "time-pos"), (2, "duration"), (3, "eof-reached")];

/// Last known playback properties
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerStatus {
    pub position: f64,
    pub duration: f64,
    pub eof: bool,
}

impl PlayerStatus {
    /// Fold one IPC message into the status
    pub fn apply_event(&mut self, msg: &Value) {
        if msg["event"] != "property-change" {
            return;
        }
        match msg["name"].as_str() {
            Some("time-pos") => {
                if let Some(pos) = msg["data"].as_f64() {
                    self.position = pos;
                }
            }
            Some("duration") => {
                if let Some(dur) = msg["data"].as_f64() {
                    self.duration = dur;
                }
            }
            Some("eof-reached") => {
                // `data` is absent while no file is loaded
                self.eof = msg["data"].as_bool().unwrap_or(false);
                if self.eof {
                    log::info!("🏁 Player reached end of file");
                }
            }
            _ => {}
        }
    }

    /// None until the duration is known.
    ///
    /// Local files are fully available to the player, so the buffered
    /// fraction is always complete.
    pub fn report(&self) -> Option<ProgressReport> {
        if self.duration <= 0.0 {
            return None;
        }
        let played_secs = if self.eof {
            self.duration
        } else {
            self.position.clamp(0.0, self.duration)
        };
        Some(ProgressReport {
            played: if self.eof { 1.0 } else { played_secs / self.duration },
            played_secs,
            loaded: 1.0,
            loaded_secs: self.duration,
        })
    }
}

/// Handle to a running player process
#[derive(Debug)]
pub struct MpvHandle {
    video_id: String,
    process: Child,
    socket_path: PathBuf,
    #[cfg(unix)]
    connection: Option<BufReader<UnixStream>>,
    /// Bytes of an IPC line not terminated yet
    pending: Vec<u8>,
    status: PlayerStatus,
    /// Status at the last report handed out
    reported: Option<PlayerStatus>,
}

impl MpvHandle {
    /// Start the player on `playing`.
    ///
    /// The IPC socket is connected lazily on the first poll, so this
    /// never waits for the player window.
    pub fn spawn(playing: &PlayingVideo, binary: &str) -> Result<Self, PlayerError> {
        let socket_path = std::env::temp_dir().join(format!("playlist-player-mpv-{}.sock", std::process::id()));
        let _ = std::fs::remove_file(&socket_path);

        log::info!("🎬 Starting {} on {}", binary, playing.media_path.display());
        let process = Command::new(binary)
            .args(build_args(playing, &socket_path))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .spawn()
            .map_err(|e| PlayerError::Spawn {
                binary: binary.to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            video_id: playing.video_id.clone(),
            process,
            socket_path,
            #[cfg(unix)]
            connection: None,
            pending: Vec::new(),
            status: PlayerStatus::default(),
            reported: None,
        })
    }

    /// Id of the video this player was started for
    pub fn video_id(&self) -> &str {
        &self.video_id
    }

    /// Drain pending IPC events and report progress.
    ///
    /// Returns None when nothing changed since the last report, so a
    /// player paused at the end does not repeat its final report.
    pub fn poll(&mut self) -> Option<ProgressReport> {
        #[cfg(unix)]
        {
            if self.connection.is_none() {
                self.connect();
            }
            self.drain_events();
        }
        changed_report(self.status, &mut self.reported)
    }

    /// Check if the player is still running
    pub fn is_alive(&mut self) -> bool {
        matches!(self.process.try_wait(), Ok(None))
    }

    #[cfg(unix)]
    fn connect(&mut self) {
        // Socket appears once the player has initialized
        let Ok(stream) = UnixStream::connect(&self.socket_path) else {
            return;
        };
        if let Err(e) = stream.set_nonblocking(true) {
            log::warn!("⚠️  Player IPC stays blocking: {}", e);
            return;
        }

        let mut reader = BufReader::new(stream);
        for (id, property) in OBSERVED {
            let command = json!({ "command": ["observe_property", id, property] });
            if let Err(e) = writeln!(reader.get_mut(), "{}", command) {
                log::warn!("⚠️  Failed to observe {}: {}", property, e);
            }
        }
        log::debug!("🔌 Connected to player IPC at {}", self.socket_path.display());
        self.connection = Some(reader);
    }

    #[cfg(unix)]
    fn drain_events(&mut self) {
        let Some(conn) = self.connection.as_mut() else {
            return;
        };

        loop {
            match conn.read_until(b'\n', &mut self.pending) {
                // Player closed the socket
                Ok(0) => break,
                Ok(_) if self.pending.ends_with(b"\n") => {
                    if let Ok(msg) = serde_json::from_slice::<Value>(&self.pending) {
                        self.status.apply_event(&msg);
                    }
                    self.pending.clear();
                }
                Ok(_) => break,
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    log::warn!("⚠️  Player IPC read failed: {}", e);
                    break;
                }
            }
        }
    }

    /// Kill the player process
    pub fn kill(&mut self) {
        let _ = self.process.kill();
        let _ = self.process.wait();
    }
}

impl Drop for MpvHandle {
    fn drop(&mut self) {
        self.kill();
        let _ = std::fs::remove_file(&self.socket_path);
    }
}

/// Report `status` unless it equals the last reported one
fn changed_report(status: PlayerStatus, reported: &mut Option<PlayerStatus>) -> Option<ProgressReport> {
    if *reported == Some(status) {
        return None;
    }
    let report = status.report()?;
    *reported = Some(status);
    Some(report)
}

/// Command-line arguments for one playback session
pub fn build_args(playing: &PlayingVideo, socket_path: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        format!("--input-ipc-server={}", socket_path.display()).into(),
        "--keep-open=yes".into(),
        "--force-window=yes".into(),
        format!("--title={}", playing.title).into(),
    ];

    if let Some(subtitle) = &playing.subtitle_path {
        let mut arg = OsString::from("--sub-file=");
        arg.push(subtitle);
        args.push(arg);
    }

    // End of options: media paths starting with "-" stay file names
    args.push("--".into());
    args.push(playing.media_path.clone().into_os_string());
    args
}
