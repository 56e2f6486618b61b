use env_logger::Builder;
use iced::widget::{button, column, container, row, text, text_input, Column};
use iced::{Alignment, Element, Length, Subscription, Task, Theme};
use log::LevelFilter;
use rfd::FileDialog;
use std::collections::HashSet;
use std::path::PathBuf;
use std::time::Duration;

mod config;
mod error;
mod library;
mod player;
mod state;
mod ui;

use config::AppConfig;
use error::{PlayerError, ScanError};
use player::MpvHandle;
use state::data::{Library, PlayingVideo};
use state::playback::{Effect, PlaybackEvent, PlaybackPolicy, PlaybackState};
use state::progress::{ProgressPatch, ProgressStore};

/// Main application state
struct PlaylistPlayer {
    config: AppConfig,
    /// Where `config` is saved; None disables saving
    config_path: Option<PathBuf>,
    /// Contents of the directory text field
    dir_input: String,
    /// Scanned playlist; empty while on the input screen
    library: Library,
    /// Progress of the open directory
    store: Option<ProgressStore>,
    policy: PlaybackPolicy,
    player: Option<MpvHandle>,
    playing: Option<PlayingVideo>,
    /// Indices of expanded sections
    expanded: HashSet<usize>,
    /// Bumped on every scan; older results are dropped
    scan_generation: u64,
    scanning: bool,
    /// Status message to display to the user
    status: String,
}

/// Application messages (events)
#[derive(Debug, Clone)]
pub enum Message {
    PathChanged(String),
    /// Submit the directory text field
    ConfirmPath,
    /// User clicked "Browse…"
    BrowseFolder,
    ScanComplete {
        generation: u64,
        result: Result<Library, ScanError>,
    },
    /// Back to the directory input screen
    CloseFolder,
    ToggleSection(usize),
    VideoClicked(String),
    CheckToggled(String, bool),
    PlaybackPrepared {
        video_id: String,
        result: Result<PlayingVideo, PlayerError>,
    },
    /// Poll the player for progress
    Tick,
}

impl PlaylistPlayer {
    /// Create a new instance of the application
    fn new() -> (Self, Task<Message>) {
        let config_path = match AppConfig::default_path() {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("⚠️  Settings will not be saved: {}", e);
                None
            }
        };
        let mut app = Self::with_config(AppConfig::load_or_default(), config_path);

        // Reopen the last directory
        let task = match app.config.last_directory.clone() {
            Some(dir) if dir.is_dir() => {
                app.dir_input = dir.display().to_string();
                app.start_scan(dir)
            }
            _ => Task::none(),
        };

        log::info!("🎞️  Playlist Player initialized");
        (app, task)
    }

    fn with_config(config: AppConfig, config_path: Option<PathBuf>) -> Self {
        let policy = PlaybackPolicy::new(config.completion_tail_secs);

        PlaylistPlayer {
            config,
            config_path,
            dir_input: String::new(),
            library: Library::default(),
            store: None,
            policy,
            player: None,
            playing: None,
            expanded: HashSet::new(),
            scan_generation: 0,
            scanning: false,
            status: "Enter the folder that holds your sections.".to_string(),
        }
    }

    /// Handle application messages and update state
    fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::PathChanged(value) => {
                self.dir_input = value;
                Task::none()
            }
            Message::ConfirmPath => {
                let input = self.dir_input.trim();
                if input.is_empty() {
                    return Task::none();
                }
                let root = PathBuf::from(input);
                self.start_scan(root)
            }
            Message::BrowseFolder => {
                // Show the native folder picker dialog
                let folder = FileDialog::new()
                    .set_title("Select Course Folder")
                    .pick_folder();

                match folder {
                    Some(folder) => {
                        self.dir_input = folder.display().to_string();
                        self.start_scan(folder)
                    }
                    None => Task::none(),
                }
            }
            Message::ScanComplete { generation, result } => {
                if generation != self.scan_generation {
                    log::debug!("Dropping result of superseded scan #{}", generation);
                    return Task::none();
                }
                self.scanning = false;

                match result {
                    Ok(library) if library.is_empty() => {
                        log::warn!("⚠️  No section folders in {}", library.root.display());
                        self.status = format!("No section folders in {}.", library.root.display());
                        Task::none()
                    }
                    Ok(library) => self.open_library(library),
                    Err(e) => {
                        log::warn!("⚠️  {}", e);
                        self.dir_input.clear();
                        self.status = "Enter the folder that holds your sections.".to_string();
                        Task::none()
                    }
                }
            }
            Message::CloseFolder => {
                self.stop_player();
                self.policy.reset();
                self.library = Library::default();
                self.store = None;
                self.expanded.clear();
                self.status = "Enter the folder that holds your sections.".to_string();
                Task::none()
            }
            Message::ToggleSection(index) => {
                if !self.expanded.remove(&index) {
                    self.expanded.insert(index);
                }
                Task::none()
            }
            Message::VideoClicked(video_id) => self.dispatch(PlaybackEvent::Select(video_id)),
            Message::CheckToggled(video_id, checked) => {
                self.persist(ProgressPatch::SetChecked { video_id, checked });
                Task::none()
            }
            Message::PlaybackPrepared { video_id, result } => {
                let still_loading = matches!(
                    self.policy.state(),
                    PlaybackState::Loading { video_id: loading } if *loading == video_id
                );
                if !still_loading {
                    return Task::none();
                }

                match result.and_then(|playing| {
                    MpvHandle::spawn(&playing, &self.config.player_binary).map(|handle| (playing, handle))
                }) {
                    Ok((playing, handle)) => {
                        self.status = match &playing.subtitle_path {
                            Some(_) => String::new(),
                            None => "No subtitle file, playing without subtitles.".to_string(),
                        };
                        self.player = Some(handle);
                        self.playing = Some(playing);
                        self.dispatch(PlaybackEvent::Ready(video_id))
                    }
                    Err(e) => {
                        log::error!("❌ Cannot play {}: {}", video_id, e);
                        self.status = format!("Cannot play: {}", e);
                        self.dispatch(PlaybackEvent::LoadFailed(video_id))
                    }
                }
            }
            Message::Tick => {
                let Some(player) = self.player.as_mut() else {
                    return Task::none();
                };

                if !player.is_alive() {
                    log::info!("⏹️  Player window closed");
                    self.player = None;
                    self.playing = None;
                    return self.dispatch(PlaybackEvent::Closed);
                }

                match player.poll() {
                    Some(report) => {
                        let video_id = player.video_id().to_string();
                        self.dispatch(PlaybackEvent::Progress { video_id, report })
                    }
                    None => Task::none(),
                }
            }
        }
    }

    /// Kick off a background scan of `root`
    fn start_scan(&mut self, root: PathBuf) -> Task<Message> {
        self.scan_generation += 1;
        self.scanning = true;
        self.status = format!("Scanning {}...", root.display());

        let generation = self.scan_generation;
        Task::perform(
            library::scan_directory(root, self.config.scan_options()),
            move |result| Message::ScanComplete { generation, result },
        )
    }

    /// Publish a scanned library, load its progress and resume
    fn open_library(&mut self, library: Library) -> Task<Message> {
        self.stop_player();
        self.policy.reset();

        let store = ProgressStore::load(&library.root);
        let current = store.current_video_id().map(String::from);

        // Expand the section holding the resumed video, else the first
        let open_section = current
            .as_deref()
            .and_then(|id| library.sections.iter().position(|s| s.videos.iter().any(|v| v.id == id)))
            .unwrap_or(0);
        self.expanded = HashSet::from([open_section]);

        self.config.last_directory = Some(library.root.clone());
        if let Some(path) = &self.config_path {
            if let Err(e) = self.config.save_to(path) {
                log::warn!("⚠️  Could not remember directory: {}", e);
            }
        }

        self.status = String::new();
        self.library = library;
        self.store = Some(store);

        self.dispatch(PlaybackEvent::Resume(current))
    }

    /// Feed the policy and run the effects it returns
    fn dispatch(&mut self, event: PlaybackEvent) -> Task<Message> {
        let effects = self.policy.handle(event, &self.library);

        let mut tasks = Vec::new();
        for effect in effects {
            match effect {
                Effect::Persist(patch) => self.persist(patch),
                Effect::Stop => self.stop_player(),
                Effect::Prepare(video) => {
                    let video_id = video.id.clone();
                    tasks.push(Task::perform(library::prepare_playback(video), move |result| {
                        Message::PlaybackPrepared {
                            video_id: video_id.clone(),
                            result,
                        }
                    }));
                }
            }
        }
        Task::batch(tasks)
    }

    fn persist(&mut self, patch: ProgressPatch) {
        let Some(store) = self.store.as_mut() else {
            return;
        };
        if let Err(e) = store.update(patch) {
            log::error!("❌ {}", e);
            self.status = "Progress could not be saved.".to_string();
        }
    }

    fn stop_player(&mut self) {
        // Dropping the handle kills the process
        self.player = None;
        self.playing = None;
    }

    /// Build the user interface
    fn view(&self) -> Element<'_, Message> {
        if self.library.is_empty() {
            return self.view_directory_input();
        }

        let progress = match &self.store {
            Some(store) => store.progress(),
            None => return self.view_directory_input(),
        };

        let sidebar = ui::playlist::view(&self.library, progress, &self.expanded);

        row![
            container(self.view_now_playing())
                .width(Length::FillPortion(4))
                .height(Length::Fill)
                .padding(30),
            container(sidebar)
                .width(Length::FillPortion(2))
                .height(Length::Fill),
        ]
        .into()
    }

    fn view_directory_input(&self) -> Element<'_, Message> {
        let submit = button("Submit").padding(10);
        let browse = button("Browse…").padding(10).style(button::secondary);

        let (submit, browse) = if self.scanning {
            (submit, browse)
        } else {
            (submit.on_press(Message::ConfirmPath), browse.on_press(Message::BrowseFolder))
        };

        let content: Column<Message> = column![
            text("Playlist Player").size(48),
            text_input("Enter directory path", &self.dir_input)
                .on_input(Message::PathChanged)
                .on_submit(Message::ConfirmPath)
                .padding(10)
                .width(Length::Fixed(480.0)),
            row![submit, browse].spacing(10),
            text(&self.status).size(16),
        ]
        .spacing(20)
        .padding(40)
        .align_x(Alignment::Center);

        container(content)
            .width(Length::Fill)
            .height(Length::Fill)
            .center_x(Length::Fill)
            .center_y(Length::Fill)
            .into()
    }

    fn view_now_playing(&self) -> Element<'_, Message> {
        let title = match self.policy.state().video_id().and_then(|id| self.library.find(id)) {
            Some(video) => format!("{} · {}", library::scanner::display_name(&video.section_name), video.name),
            None => "Nothing playing".to_string(),
        };

        let state = match self.policy.state() {
            PlaybackState::Idle => "Pick a video from the playlist.".to_string(),
            PlaybackState::Loading { .. } => "Loading...".to_string(),
            PlaybackState::Playing { .. } => match self.playing.as_ref().and_then(|p| p.subtitle_path.as_ref()) {
                Some(subtitle) => format!("Playing in the player window with {}", subtitle.display()),
                None => "Playing in the player window".to_string(),
            },
        };

        column![
            text(title).size(28),
            text(state).size(16),
            text(&self.status).size(14),
            text(self.library.root.display().to_string()).size(12),
            button("Change folder")
                .on_press(Message::CloseFolder)
                .style(button::secondary),
        ]
        .spacing(16)
        .into()
    }

    fn subscription(&self) -> Subscription<Message> {
        if self.player.is_some() {
            iced::time::every(Duration::from_millis(self.config.poll_interval_ms)).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    /// Set the application theme
    fn theme(&self) -> Theme {
        Theme::Dark
    }
}

fn init_logger() {
    Builder::new()
        .filter_level(LevelFilter::Warn)
        .filter_module("playlist_player", LevelFilter::Info)
        .parse_default_env()
        .init();
}

fn main() -> iced::Result {
    init_logger();

    iced::application("Playlist Player", PlaylistPlayer::update, PlaylistPlayer::view)
        .subscription(PlaylistPlayer::subscription)
        .theme(PlaylistPlayer::theme)
        .centered()
        .run_with(PlaylistPlayer::new)
}
