/// Course folder reading
///
/// This module handles:
/// - Scanning a root directory into sections and videos
/// - Probing video durations from the MP4 header
/// - Resolving subtitle tracks for playback
pub mod duration;
pub mod scanner;
pub mod subtitle;

pub use scanner::{scan_directory, ScanOptions};
pub use subtitle::prepare_playback;
