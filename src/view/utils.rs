//! Utility functions for rendering UI components

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    widgets::{Block, List, ListItem, ListState},
    Frame,
};

pub fn render_scrollable_list(
    frame: &mut Frame,
    area: Rect,
    items: Vec<ListItem>,
    selected_index: usize,
    block: Block,
) {
    let list = List::new(items)
        .block(block)
        .highlight_style(Style::default()); // Highlight handled by item styles

    let mut list_state = ListState::default();
    list_state.select(Some(selected_index));

    frame.render_stateful_widget(list, area, &mut list_state);
}

/// Format seconds as `m:ss`. Unknown or negative times read as `0:00`.
pub fn format_time(seconds: f64) -> String {
    if !seconds.is_finite() || seconds < 0.0 {
        return "0:00".to_string();
    }
    let total_seconds = seconds.floor() as u64;
    let minutes = total_seconds / 60;
    let seconds = total_seconds % 60;
    format!("{}:{:02}", minutes, seconds)
}

/// Calculate width needed for index column (log10(n) + padding)
pub fn calculate_num_width(item_count: usize) -> usize {
    if item_count == 0 {
        2
    } else {
        let digits = (item_count as f64).log10().floor() as usize + 1;
        digits + 1
    }
}

pub fn truncate_string(s: &str, max_width: usize) -> String {
    if s.chars().count() > max_width {
        let truncated: String = s.chars().take(max_width.saturating_sub(3)).collect();
        format!("{:<width$}", format!("{}...", truncated), width = max_width)
    } else {
        format!("{:<width$}", s, width = max_width)
    }
}

/// Accent color for a playlist's gradient token, e.g. `from-indigo-900`
pub fn gradient_color(token: &str) -> Color {
    let hue = token
        .strip_prefix("from-")
        .unwrap_or(token)
        .split('-')
        .next()
        .unwrap_or_default();

    match hue {
        "red" | "rose" => Color::Red,
        "orange" | "amber" | "yellow" => Color::Yellow,
        "green" | "emerald" | "lime" | "teal" => Color::Green,
        "blue" | "sky" | "cyan" => Color::Blue,
        "indigo" | "violet" | "purple" => Color::Magenta,
        "pink" | "fuchsia" => Color::LightMagenta,
        _ => Color::Cyan,
    }
}

/// Column widths for the song table
/// Returns (num_width, title_width, album_width, duration_width)
pub fn calculate_song_column_widths(content_width: usize, item_count: usize) -> (usize, usize, usize, usize) {
    // Format: " {num}   {title - artist}   {album}   {duration}"
    let num_width = calculate_num_width(item_count);
    let duration_width = 6;
    let fixed_width = 1 + num_width + 3 + 3 + 3 + duration_width;
    let remaining_width = content_width.saturating_sub(fixed_width);
    let title_width = (remaining_width * 60) / 100;
    let album_width = remaining_width.saturating_sub(title_width);

    (num_width, title_width, album_width, duration_width)
}
