//! Player bar rendering (progress and volume)

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::Line,
    widgets::{Block, Borders, Gauge},
    Frame,
};

use crate::model::{PlaybackInfo, TransportState};
use super::utils::format_time;

pub fn render_progress_bar(frame: &mut Frame, area: Rect, playback: &PlaybackInfo) {
    let status_text = match &playback.song {
        None => " No song selected".to_string(),
        Some(song) if playback.is_playing => {
            format!(" ▶ {} | {} ({})", song.title, song.artist, song.album)
        }
        Some(song) => format!("⏸  {} | {} ({})", song.title, song.artist, song.album),
    };

    let time_str = format!(
        "{} / {}",
        format_time(playback.current_time),
        format_time(playback.duration)
    );

    let progress_ratio = (playback.progress / 100.0).clamp(0.0, 1.0);

    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Min(0),     // Track progress
            Constraint::Length(18), // Volume
        ])
        .split(area);

    let title = format!("{} ", status_text);
    let transport_info = format!(" {} ", playback.transport.label());
    let transport_style = match playback.transport {
        TransportState::Blocked => Style::default().fg(Color::Red),
        TransportState::PlayRequested => Style::default().fg(Color::Yellow),
        TransportState::Playing | TransportState::Paused => Style::default(),
    };

    let gauge = Gauge::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(title)
                .title_bottom(Line::styled(transport_info, transport_style).right_aligned()),
        )
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(progress_ratio)
        .label(time_str);
    frame.render_widget(gauge, chunks[0]);

    let volume_percent = (playback.volume * 100.0).round() as u16;
    let volume_label = if volume_percent == 0 {
        "Muted".to_string()
    } else {
        format!("{}%", volume_percent)
    };

    let volume = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Vol "))
        .gauge_style(Style::default().fg(Color::Cyan))
        .ratio(f64::from(playback.volume).clamp(0.0, 1.0))
        .label(volume_label);
    frame.render_widget(volume, chunks[1]);
}
