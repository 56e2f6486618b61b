/// User interface pieces
///
/// - Duration labels (format.rs)
/// - The playlist sidebar (playlist.rs)
pub mod format;
pub mod playlist;
