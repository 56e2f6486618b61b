/// Video player integration
///
/// Playback itself happens in an external mpv window; this module starts
/// it and turns its IPC property changes into progress reports.
pub mod mpv;

pub use mpv::MpvHandle;
