//! Shared data structures for the application state
//!
//! These structs represent the playlist that flows between
//! the directory scanner and the UI layer. They are rebuilt
//! from disk on every scan and never persisted themselves.

use std::path::PathBuf;

/// A single playable video inside a section folder
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    /// Stable id: "<sectionFolderName>-<videoFileName>"
    pub id: String,
    /// Folder name of the owning section (e.g., "01 Intro")
    pub section_name: String,
    /// Display name (e.g., "Welcome" for "01 Welcome.mp4")
    pub name: String,
    /// Full path to the media file
    pub path: PathBuf,
    /// Expected subtitle path; the file may not exist
    pub subtitle_path: PathBuf,
    /// Duration from the media header, None when it could not be parsed
    pub duration_secs: Option<u64>,
}

impl Video {
    /// Build the id used as key in the progress file.
    pub fn make_id(folder_name: &str, file_name: &str) -> String {
        format!("{}-{}", folder_name, file_name)
    }
}

/// A folder-derived group of videos
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    /// Folder name on disk
    pub folder_name: String,
    /// Display name with the numeric prefix stripped
    pub name: String,
    pub videos: Vec<Video>,
}

impl Section {
    /// Sum of known durations; unknown durations count as zero
    pub fn total_duration(&self) -> u64 {
        self.videos.iter().filter_map(|v| v.duration_secs).sum()
    }
}

/// The scanned playlist for one root directory
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Library {
    pub root: PathBuf,
    pub sections: Vec<Section>,
}

impl Library {
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// All videos in section order, then file order
    pub fn videos(&self) -> impl Iterator<Item = &Video> {
        self.sections.iter().flat_map(|s| s.videos.iter())
    }

    pub fn find(&self, video_id: &str) -> Option<&Video> {
        self.videos().find(|v| v.id == video_id)
    }

    /// The video following `video_id` in the flattened sequence.
    /// Returns None for the last video or an unknown id.
    pub fn next_after(&self, video_id: &str) -> Option<&Video> {
        let mut videos = self.videos();
        videos.find(|v| v.id == video_id)?;
        videos.next()
    }
}

/// Media and subtitle track ready to hand to the player.
/// Rebuilt on every selection, never serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayingVideo {
    pub video_id: String,
    pub title: String,
    pub media_path: PathBuf,
    /// None when the subtitle file is missing (media-only playback)
    pub subtitle_path: Option<PathBuf>,
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_is_folder_dash_file() {
        assert_eq!(Video::make_id("01 Intro", "01 Welcome.mp4"), "01 Intro-01 Welcome.mp4");
        assert_eq!(
            Video::make_id("01 Intro", "01 Welcome.mp4"),
            Video::make_id("01 Intro", "01 Welcome.mp4")
        );
    }

    #[test]
    fn test_next_after_crosses_sections() {
        let library = fixtures::library();

        let next = library.next_after("01 Intro-02 Setup.mp4").unwrap();
        assert_eq!(next.id, "02 Core-01 Basics.mp4");
    }

    #[test]
    fn test_next_after_last_and_unknown() {
        let library = fixtures::library();

        assert!(library.next_after("02 Core-02 Advanced.mp4").is_none());
        assert!(library.next_after("missing").is_none());
    }

    #[test]
    fn test_total_duration_skips_unknown() {
        let mut library = fixtures::library();
        library.sections[0].videos[1].duration_secs = None;

        assert_eq!(library.sections[0].total_duration(), 60);
        assert_eq!(library.sections[1].total_duration(), 120);
    }
}
