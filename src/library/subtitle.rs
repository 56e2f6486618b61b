//! Subtitle track preparation
//!
//! The player reads SRT natively, so preparing a track means resolving
//! the subtitle next to the video and checking it is actually there.

use std::path::{Path, PathBuf};
use tokio::task;

use crate::error::PlayerError;
use crate::state::data::{PlayingVideo, Video};

/// Subtitle path for a video: same path, subtitle extension
pub fn subtitle_path_for(video_path: &Path, subtitle_extension: &str) -> PathBuf {
    video_path.with_extension(subtitle_extension)
}

/// Build the media + subtitle track for a selected video.
///
/// A missing media file fails the selection. A missing subtitle only
/// degrades to media-only playback.
pub async fn prepare_playback(video: Video) -> Result<PlayingVideo, PlayerError> {
    task::spawn_blocking(move || prepare_playback_blocking(&video))
        .await
        .map_err(|e| PlayerError::Task(e.to_string()))?
}

fn prepare_playback_blocking(video: &Video) -> Result<PlayingVideo, PlayerError> {
    if !video.path.is_file() {
        return Err(PlayerError::MediaMissing(video.path.clone()));
    }

    let subtitle_path = if video.subtitle_path.is_file() {
        Some(video.subtitle_path.clone())
    } else {
        log::warn!(
            "⚠️  No subtitle for {} (expected {}), playing without",
            video.id,
            video.subtitle_path.display()
        );
        None
    };

    Ok(PlayingVideo {
        video_id: video.id.clone(),
        title: video.name.clone(),
        media_path: video.path.clone(),
        subtitle_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn video_in(dir: &Path, file: &str) -> Video {
        let path = dir.join(file);
        Video {
            id: Video::make_id("01 Intro", file),
            section_name: "01 Intro".into(),
            name: "Welcome".into(),
            subtitle_path: subtitle_path_for(&path, "srt"),
            path,
            duration_secs: None,
        }
    }

    #[test]
    fn test_subtitle_path_replaces_extension() {
        assert_eq!(
            subtitle_path_for(Path::new("/c/01 Intro/01 Welcome.mp4"), "srt"),
            PathBuf::from("/c/01 Intro/01 Welcome.srt")
        );
    }

    #[tokio::test]
    async fn test_prepare_with_subtitle() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("01 Welcome.mp4"), b"video").unwrap();
        fs::write(dir.path().join("01 Welcome.srt"), b"1\n00:00:01,000 --> 00:00:02,000\nHi\n").unwrap();

        let playing = prepare_playback(video_in(dir.path(), "01 Welcome.mp4")).await.unwrap();
        assert_eq!(playing.subtitle_path, Some(dir.path().join("01 Welcome.srt")));
        assert_eq!(playing.title, "Welcome");
    }

    #[tokio::test]
    async fn test_missing_subtitle_degrades() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("01 Welcome.mp4"), b"video").unwrap();

        let playing = prepare_playback(video_in(dir.path(), "01 Welcome.mp4")).await.unwrap();
        assert_eq!(playing.media_path, dir.path().join("01 Welcome.mp4"));
        assert!(playing.subtitle_path.is_none());
    }

    #[tokio::test]
    async fn test_missing_media_fails() {
        let dir = TempDir::new().unwrap();
        let video = video_in(dir.path(), "01 Welcome.mp4");

        let err = prepare_playback(video.clone()).await.unwrap_err();
        assert_eq!(err, PlayerError::MediaMissing(video.path));
    }
}
