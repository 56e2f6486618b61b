//! Playlist sidebar: collapsible sections with checkable, clickable videos

use iced::widget::{button, checkbox, column, row, scrollable, text, Column};
use iced::{Alignment, Color, Element, Length, Theme};
use std::collections::HashSet;

use super::format::format_duration;
use crate::state::data::{Library, Section};
use crate::state::progress::Progress;
use crate::Message;

const MUTED: Color = Color::from_rgb(0.55, 0.58, 0.62);

type ButtonStyle = fn(&Theme, button::Status) -> button::Style;

/// "3/12 videos | 1h05m"
pub fn section_summary(section: &Section, progress: &Progress) -> String {
    let checked = section
        .videos
        .iter()
        .filter(|video| progress.is_checked(&video.id))
        .count();

    format!(
        "{}/{} videos | {}",
        checked,
        section.videos.len(),
        format_duration(section.total_duration())
    )
}

/// The highlighted video is the persisted resume point, which outlives
/// the player (closed window, failed load)
fn is_current(progress: &Progress, video_id: &str) -> bool {
    progress.current_video_id.as_deref() == Some(video_id)
}

/// Build the sidebar for the whole library
pub fn view<'a>(
    library: &'a Library,
    progress: &'a Progress,
    expanded: &'a HashSet<usize>,
) -> Element<'a, Message> {
    let sections = library
        .sections
        .iter()
        .enumerate()
        .map(|(i, section)| section_view(i, section, progress, expanded.contains(&i)));

    scrollable(Column::with_children(sections).spacing(2))
        .height(Length::Fill)
        .into()
}

fn section_view<'a>(
    index: usize,
    section: &'a Section,
    progress: &'a Progress,
    is_expanded: bool,
) -> Element<'a, Message> {
    let arrow = if is_expanded { "▾" } else { "▸" };

    let header = button(
        row![
            column![
                text(format!("{}. {}", index + 1, section.name)).size(16),
                text(section_summary(section, progress)).size(13).color(MUTED),
            ]
            .width(Length::Fill),
            text(arrow).size(16),
        ]
        .align_y(Alignment::Center),
    )
    .width(Length::Fill)
    .padding(10)
    .on_press(Message::ToggleSection(index))
    .style(button::secondary);

    if !is_expanded {
        return header.into();
    }

    let rows = section.videos.iter().enumerate().map(|(j, video)| {
        let style: ButtonStyle = if is_current(progress, &video.id) { button::primary } else { button::text };
        let id = video.id.clone();

        row![
            checkbox("", progress.is_checked(&video.id))
                .on_toggle(move |checked| Message::CheckToggled(id.clone(), checked)),
            button(column![
                text(format!("{}. {}", j + 1, video.name)),
                text(format_duration(video.duration_secs.unwrap_or(0)))
                    .size(12)
                    .color(MUTED),
            ])
            .width(Length::Fill)
            .on_press(Message::VideoClicked(video.id.clone()))
            .style(style),
        ]
        .spacing(8)
        .padding([2, 8])
        .align_y(Alignment::Center)
        .into()
    });

    column![header, Column::with_children(rows)].into()
}
