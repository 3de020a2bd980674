//! Main content area rendering (playlist header and song list)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Padding, Paragraph, Wrap},
    Frame,
};

use crate::model::{ActiveSection, Catalog, PlaybackInfo, Playlist, UiState};
use super::utils::{
    calculate_song_column_widths, gradient_color, render_scrollable_list, truncate_string,
};

pub fn render_main_content(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    playback: &PlaybackInfo,
    catalog: &Catalog,
) {
    let Some(playlist) = catalog.playlist(playback.active_playlist) else {
        let empty = Paragraph::new("No playlist selected")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, area);
        return;
    };

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5), // Header
            Constraint::Min(0),    // Songs
        ])
        .split(area);

    render_playlist_header(frame, chunks[0], playlist, playback);
    render_song_list(frame, chunks[1], ui_state, playback, playlist);
}

fn render_playlist_header(frame: &mut Frame, area: Rect, playlist: &Playlist, playback: &PlaybackInfo) {
    let accent = gradient_color(&playlist.gradient);
    let owns_current = playback
        .song
        .as_ref()
        .is_some_and(|s| playlist.contains(&s.id));
    let play_hint = if owns_current && playback.is_playing {
        "⏸ P to pause"
    } else {
        "▶ P to play"
    };

    let lines = vec![
        Line::from(Span::styled(
            playlist.name.clone(),
            Style::default().fg(accent).add_modifier(Modifier::BOLD),
        )),
        Line::from(Span::styled(
            playlist.description.clone(),
            Style::default().fg(Color::Gray),
        )),
        Line::from(vec![
            Span::styled(
                format!("{} • {} songs", playlist.author, playlist.songs.len()),
                Style::default().fg(Color::DarkGray),
            ),
            Span::raw("   "),
            Span::styled(play_hint, Style::default().fg(Color::Green)),
        ]),
    ];

    let header = Paragraph::new(lines).wrap(Wrap { trim: true }).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(accent))
            .title(" Playlist ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(header, area);
}

fn render_song_list(
    frame: &mut Frame,
    area: Rect,
    ui_state: &UiState,
    playback: &PlaybackInfo,
    playlist: &Playlist,
) {
    let is_focused = ui_state.active_section == ActiveSection::Songs;
    let current_id = playback.song.as_ref().map(|s| s.id.as_str());

    // Account for borders and padding
    let content_width = area.width.saturating_sub(4) as usize;
    let (num_width, title_width, album_width, duration_width) =
        calculate_song_column_widths(content_width, playlist.songs.len());

    let items: Vec<ListItem> = playlist
        .songs
        .iter()
        .enumerate()
        .map(|(i, song)| {
            let is_current = current_id == Some(song.id.as_str());
            let index = if is_current && playback.is_playing {
                format!("{:>width$}", "▶", width = num_width)
            } else {
                format!("{:>width$}", i + 1, width = num_width)
            };
            let title = truncate_string(&format!("{} - {}", song.title, song.artist), title_width);
            let album = truncate_string(&song.album, album_width);
            let text = format!(
                " {}   {}   {}   {:>width$}",
                index,
                title,
                album,
                song.duration,
                width = duration_width
            );

            let style = if i == ui_state.song_selected && is_focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if is_current {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(text).style(style)
        })
        .collect();

    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Songs ")
        .border_style(border_style);

    render_scrollable_list(frame, area, items, ui_state.song_selected, block);
}
