//! Directory scanner
//!
//! Turns a root directory into a playlist: every immediate subfolder is a
//! section, every video file inside it is a video. Read-only.

use futures::future::join_all;
use regex::Regex;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tokio::task;
use walkdir::WalkDir;

use super::duration::probe_duration;
use super::subtitle::subtitle_path_for;
use crate::error::ScanError;
use crate::state::data::{Library, Section, Video};

/// Leading ordinal such as "01 " in "01 Intro"
static ORDINAL: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d+ ").expect("valid regex"));

/// File extensions recognized by the scanner
#[derive(Debug, Clone, PartialEq)]
pub struct ScanOptions {
    /// Video extension without the dot (e.g., "mp4")
    pub video_extension: String,
    /// Subtitle extension without the dot (e.g., "srt")
    pub subtitle_extension: String,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            video_extension: "mp4".to_string(),
            subtitle_extension: "srt".to_string(),
        }
    }
}

/// Scan `root` and probe every video's duration.
///
/// The whole scan completes before anything is returned, so a partially
/// scanned directory is never published.
pub async fn scan_directory(root: PathBuf, options: ScanOptions) -> Result<Library, ScanError> {
    log::info!("🔍 Scanning folder: {}", root.display());

    let mut library = task::spawn_blocking(move || list_library(&root, &options))
        .await
        .map_err(|e| ScanError::Task(e.to_string()))??;

    // One probe per video, run concurrently; results keep playlist order
    let probes = library
        .videos()
        .map(|video| probe_duration(video.path.clone()))
        .collect::<Vec<_>>();
    let durations = join_all(probes).await;

    let videos = library.sections.iter_mut().flat_map(|s| s.videos.iter_mut());
    for (video, duration) in videos.zip(durations) {
        video.duration_secs = duration;
    }

    log::info!(
        "✅ Scan complete: {} sections, {} videos",
        library.sections.len(),
        library.videos().count()
    );
    Ok(library)
}

/// Blocking directory listing without durations
pub fn list_library(root: &Path, options: &ScanOptions) -> Result<Library, ScanError> {
    // WalkDir reports an unreadable root as just another entry error
    fs::read_dir(root).map_err(|e| ScanError::InvalidDirectory {
        path: root.to_path_buf(),
        reason: e.to_string(),
    })?;

    let sections = list_entries(root)
        .into_iter()
        .filter(|path| path.is_dir())
        .map(|folder| scan_section(&folder, options))
        .collect();

    Ok(Library {
        root: root.to_path_buf(),
        sections,
    })
}

fn scan_section(folder: &Path, options: &ScanOptions) -> Section {
    let folder_name = file_name_of(folder);

    let videos = list_entries(folder)
        .into_iter()
        .filter(|path| path.is_file() && has_extension(path, &options.video_extension))
        .map(|path| {
            let file_name = file_name_of(&path);
            let stem = path
                .file_stem()
                .unwrap_or_default()
                .to_string_lossy()
                .to_string();

            Video {
                id: Video::make_id(&folder_name, &file_name),
                section_name: folder_name.clone(),
                name: display_name(&stem),
                subtitle_path: subtitle_path_for(&path, &options.subtitle_extension),
                path,
                duration_secs: None,
            }
        })
        .collect();

    Section {
        name: display_name(&folder_name),
        folder_name,
        videos,
    }
}

/// Immediate children of `dir`, sorted by file name
fn list_entries(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.into_path()),
            Err(e) => {
                log::warn!("⚠️  Skipping unreadable entry in {}: {}", dir.display(), e);
                None
            }
        })
        .collect()
}

/// Exact, case-sensitive match: "Clip.MP4" is not an "mp4" video
fn has_extension(path: &Path, extension: &str) -> bool {
    path.extension().is_some_and(|ext| ext == extension)
}

fn file_name_of(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

/// Strip the first "digits + space" run: "01 Intro" -> "Intro"
pub fn display_name(name: &str) -> String {
    ORDINAL.replacen(name, 1, "").into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::library::duration::tests::fake_mp4;
    use tempfile::TempDir;

    /// Create `<root>/<section>/<file>` for every pair
    fn course(sections: &[(&str, &[&str])]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (section, files) in sections {
            let folder = dir.path().join(section);
            fs::create_dir(&folder).unwrap();
            for file in *files {
                fs::write(folder.join(file), fake_mp4(90)).unwrap();
            }
        }
        dir
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("01 Intro"), "Intro");
        assert_eq!(display_name("Part 2 of 3"), "Part of 3");
        assert_eq!(display_name("Intro"), "Intro");
    }

    #[tokio::test]
    async fn test_sections_and_videos_in_order() {
        let dir = course(&[
            ("02 Core", &["02 Advanced.mp4", "01 Basics.mp4"]),
            ("01 Intro", &["01 Welcome.mp4", "02 Setup.mp4"]),
            ("03 Extra", &["01 Bonus.mp4", "02 Outro.mp4"]),
        ]);

        let library = scan_directory(dir.path().to_path_buf(), ScanOptions::default())
            .await
            .unwrap();

        assert_eq!(library.sections.len(), 3);
        let names: Vec<_> = library.sections.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["Intro", "Core", "Extra"]);
        for section in &library.sections {
            assert_eq!(section.videos.len(), 2);
        }

        let core = &library.sections[1];
        assert_eq!(core.videos[0].name, "Basics");
        assert_eq!(core.videos[0].id, "02 Core-01 Basics.mp4");
        assert_eq!(core.videos[0].section_name, "02 Core");
        assert_eq!(core.videos[1].id, "02 Core-02 Advanced.mp4");
        assert_eq!(core.videos[0].duration_secs, Some(90));
        assert_eq!(core.total_duration(), 180);
    }

    #[tokio::test]
    async fn test_ids_stable_across_rescans() {
        let dir = course(&[("01 Intro", &["01 Welcome.mp4"])]);

        let first = scan_directory(dir.path().to_path_buf(), ScanOptions::default()).await.unwrap();
        let second = scan_directory(dir.path().to_path_buf(), ScanOptions::default()).await.unwrap();

        assert_eq!(first, second);
    }

    #[test]
    fn test_filters_non_videos_and_root_files() {
        let dir = course(&[("01 Intro", &["01 Welcome.mp4", "notes.txt", "01 Welcome.srt"])]);
        fs::write(dir.path().join("progress.json"), "{}").unwrap();
        fs::write(dir.path().join("trailer.mp4"), b"x").unwrap();
        fs::create_dir(dir.path().join("01 Intro").join("nested")).unwrap();

        let library = list_library(dir.path(), &ScanOptions::default()).unwrap();

        assert_eq!(library.sections.len(), 1);
        let videos = &library.sections[0].videos;
        assert_eq!(videos.len(), 1);
        assert_eq!(
            videos[0].subtitle_path,
            dir.path().join("01 Intro").join("01 Welcome.srt")
        );
    }

    #[test]
    fn test_extension_match_is_case_sensitive() {
        let dir = course(&[("01 Intro", &["01 Welcome.mp4", "02 Loud.MP4", "03 Mixed.Mp4"])]);

        let library = list_library(dir.path(), &ScanOptions::default()).unwrap();

        let ids: Vec<_> = library.videos().map(|v| v.id.as_str()).collect();
        assert_eq!(ids, ["01 Intro-01 Welcome.mp4"]);
    }

    #[test]
    fn test_subtitle_absence_is_not_an_error() {
        let dir = course(&[("01 Intro", &["01 Welcome.mp4"])]);

        let library = list_library(dir.path(), &ScanOptions::default()).unwrap();
        let video = &library.sections[0].videos[0];
        assert!(!video.subtitle_path.exists());
    }

    #[tokio::test]
    async fn test_unparsable_duration_is_unknown() {
        let dir = TempDir::new().unwrap();
        fs::create_dir(dir.path().join("01 Intro")).unwrap();
        fs::write(dir.path().join("01 Intro").join("01 Broken.mp4"), b"garbage").unwrap();

        let library = scan_directory(dir.path().to_path_buf(), ScanOptions::default())
            .await
            .unwrap();
        assert_eq!(library.sections[0].videos[0].duration_secs, None);
        assert_eq!(library.sections[0].total_duration(), 0);
    }

    #[tokio::test]
    async fn test_invalid_directory() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");

        let err = scan_directory(missing.clone(), ScanOptions::default()).await.unwrap_err();
        assert!(matches!(err, ScanError::InvalidDirectory { path, .. } if path == missing));

        let file = dir.path().join("file.mp4");
        fs::write(&file, b"x").unwrap();
        assert!(list_library(&file, &ScanOptions::default()).is_err());
    }

    #[test]
    fn test_empty_root_yields_empty_library() {
        let dir = TempDir::new().unwrap();
        let library = list_library(dir.path(), &ScanOptions::default()).unwrap();
        assert!(library.is_empty());
    }
}
