//! Playback advance policy
//!
//! A pure state machine deciding what plays next. It never touches the
//! filesystem or the player: callers feed it events and execute the
//! returned effects.

use super::data::{Library, Video};
use super::progress::ProgressPatch;

/// Default unplayed tail (seconds) under which a video counts as watched
pub const DEFAULT_COMPLETION_TAIL_SECS: f64 = 3.0;

/// Playback progress as reported by the player
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProgressReport {
    /// Fraction played, 0.0..=1.0
    pub played: f64,
    pub played_secs: f64,
    /// Fraction buffered, 0.0..=1.0
    pub loaded: f64,
    pub loaded_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub enum PlaybackState {
    #[default]
    Idle,
    /// Media and subtitle track are being prepared
    Loading { video_id: String },
    Playing { video_id: String },
}

impl PlaybackState {
    /// The selected video, if any
    pub fn video_id(&self) -> Option<&str> {
        match self {
            PlaybackState::Idle => None,
            PlaybackState::Loading { video_id } | PlaybackState::Playing { video_id } => {
                Some(video_id)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackEvent {
    /// User clicked a video title
    Select(String),
    /// Directory opened with this persisted current video
    Resume(Option<String>),
    /// Media and subtitle track for this video are ready
    Ready(String),
    /// Preparation or player start failed for this video
    LoadFailed(String),
    /// Progress report from the player for this video
    Progress { video_id: String, report: ProgressReport },
    /// The player window was closed
    Closed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Persist(ProgressPatch),
    /// Build the media/subtitle track for this video
    Prepare(Video),
    /// Stop the current player
    Stop,
}

#[derive(Debug, Clone)]
pub struct PlaybackPolicy {
    state: PlaybackState,
    completion_tail_secs: f64,
    /// Set once the playing video entered its tail and was marked watched.
    /// Cleared when playback leaves the tail or a new video loads.
    in_tail: bool,
}

impl Default for PlaybackPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_COMPLETION_TAIL_SECS)
    }
}

impl PlaybackPolicy {
    pub fn new(completion_tail_secs: f64) -> Self {
        Self {
            state: PlaybackState::Idle,
            completion_tail_secs,
            in_tail: false,
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    /// Drop back to Idle without effects (directory changed)
    pub fn reset(&mut self) {
        self.state = PlaybackState::Idle;
        self.in_tail = false;
    }

    /// Advance the state machine and return the effects to run, in order.
    pub fn handle(&mut self, event: PlaybackEvent, library: &Library) -> Vec<Effect> {
        match event {
            PlaybackEvent::Select(video_id) => {
                // Re-clicking the selected video must not restart it
                if self.state.video_id() == Some(video_id.as_str()) {
                    return Vec::new();
                }
                match library.find(&video_id) {
                    Some(video) => self.start_loading(video),
                    None => {
                        log::warn!("⚠️  Ignoring selection of unknown video {}", video_id);
                        Vec::new()
                    }
                }
            }
            PlaybackEvent::Resume(video_id) => {
                let Some(video_id) = video_id else {
                    return Vec::new();
                };
                if self.state != PlaybackState::Idle {
                    return Vec::new();
                }
                match library.find(&video_id) {
                    Some(video) => {
                        log::info!("▶️  Resuming {}", video.id);
                        self.start_loading(video)
                    }
                    None => {
                        log::info!("⏭️  Saved video {} is gone, staying idle", video_id);
                        Vec::new()
                    }
                }
            }
            PlaybackEvent::Ready(video_id) => {
                if let PlaybackState::Loading { video_id: loading } = &self.state {
                    if *loading == video_id {
                        self.state = PlaybackState::Playing { video_id };
                    }
                }
                Vec::new()
            }
            PlaybackEvent::LoadFailed(video_id) => {
                if self.state.video_id() == Some(video_id.as_str()) {
                    self.state = PlaybackState::Idle;
                }
                Vec::new()
            }
            PlaybackEvent::Progress { video_id, report } => {
                self.on_progress(&video_id, report, library)
            }
            PlaybackEvent::Closed => {
                if matches!(self.state, PlaybackState::Playing { .. }) {
                    self.state = PlaybackState::Idle;
                }
                Vec::new()
            }
        }
    }

    fn start_loading(&mut self, video: &Video) -> Vec<Effect> {
        let mut effects = Vec::with_capacity(3);
        if self.state != PlaybackState::Idle {
            effects.push(Effect::Stop);
        }
        self.state = PlaybackState::Loading {
            video_id: video.id.clone(),
        };
        self.in_tail = false;
        effects.push(Effect::Persist(ProgressPatch::SetCurrent(video.id.clone())));
        effects.push(Effect::Prepare(video.clone()));
        effects
    }

    fn on_progress(&mut self, video_id: &str, report: ProgressReport, library: &Library) -> Vec<Effect> {
        let PlaybackState::Playing { video_id: playing } = &self.state else {
            return Vec::new();
        };
        if playing != video_id {
            return Vec::new();
        }

        let mut effects = Vec::new();

        // Mark watched on entering the tail only, so a manual uncheck
        // while parked at the end is not overridden by the next report
        let in_tail =
            report.loaded >= 1.0 && report.loaded_secs - report.played_secs <= self.completion_tail_secs;
        if in_tail && !self.in_tail {
            effects.push(Effect::Persist(ProgressPatch::SetChecked {
                video_id: video_id.to_string(),
                checked: true,
            }));
        }
        self.in_tail = in_tail;

        if report.played >= 1.0 {
            // Last video of the last section is terminal
            if let Some(next) = library.next_after(video_id) {
                log::info!("⏩ Advancing to {}", next.id);
                let next = next.clone();
                effects.extend(self.start_loading(&next));
            }
        }

        effects
    }
}
