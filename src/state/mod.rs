/// State management module
///
/// This module handles all application state, including:
/// - Playlist data structures (data.rs)
/// - Watched-progress persistence (progress.rs)
/// - The playback advance state machine (playback.rs)
pub mod data;
pub mod playback;
pub mod progress;
