//! Layout rendering (top bar, sidebar)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, ListItem, Padding, Paragraph},
    Frame,
};

use crate::model::{ActiveSection, Catalog, PlaybackInfo, UiState};
use super::utils::render_scrollable_list;

pub fn render_top_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo, catalog: &Catalog) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // App name + active playlist
            Constraint::Length(30), // Output device
        ])
        .split(area);

    let active_name = catalog
        .playlist(playback.active_playlist)
        .map(|p| p.name.as_str())
        .unwrap_or("");

    let header = Paragraph::new(Line::from(vec![
        Span::styled("mixtape", Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)),
        Span::raw("  ·  "),
        Span::styled(active_name.to_string(), Style::default().fg(Color::White)),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .title(" Now Browsing ")
            .padding(Padding::horizontal(1)),
    );
    frame.render_widget(header, chunks[0]);

    let device = Paragraph::new(format!("🎵 {}", playback.device_name))
        .style(Style::default().fg(Color::Cyan))
        .block(Block::default().borders(Borders::ALL).title(" Device "));
    frame.render_widget(device, chunks[1]);
}

pub fn render_sidebar(frame: &mut Frame, area: Rect, ui_state: &UiState, playback: &PlaybackInfo, catalog: &Catalog) {
    let is_focused = ui_state.active_section == ActiveSection::Playlists;

    let items: Vec<ListItem> = catalog
        .playlists
        .iter()
        .enumerate()
        .map(|(i, playlist)| {
            let style = if i == ui_state.playlist_selected && is_focused {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else if i == playback.active_playlist {
                Style::default().fg(Color::White).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::White)
            };
            let marker = if i == playback.active_playlist { "♪ " } else { "  " };
            ListItem::new(vec![
                Line::from(format!("{}{}", marker, playlist.name)),
                Line::from(Span::styled(
                    format!("  Playlist • {}", playlist.author),
                    Style::default().fg(Color::DarkGray),
                )),
            ])
            .style(style)
        })
        .collect();

    let border_style = if is_focused {
        Style::default().fg(Color::Green)
    } else {
        Style::default()
    };

    let block = Block::default()
        .borders(Borders::ALL)
        .title(" Playlists ")
        .padding(Padding::horizontal(1))
        .border_style(border_style);

    render_scrollable_list(frame, area, items, ui_state.playlist_selected, block);
}
