//! Core type definitions for the application

use std::time::Instant;

/// Which pane currently has keyboard focus
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActiveSection {
    Playlists,
    Songs,
}

impl ActiveSection {
    pub fn next(self) -> Self {
        match self {
            ActiveSection::Playlists => ActiveSection::Songs,
            ActiveSection::Songs => ActiveSection::Playlists,
        }
    }

    pub fn prev(self) -> Self {
        // Only two panes, so backward is the same cycle
        self.next()
    }
}

/// UI state for the application
#[derive(Clone, Debug)]
pub struct UiState {
    pub active_section: ActiveSection,
    /// Cursor in the sidebar; not necessarily the active playlist
    pub playlist_selected: usize,
    /// Cursor in the song list of the active playlist
    pub song_selected: usize,
    pub error_message: Option<String>,
    pub error_timestamp: Option<Instant>,
    pub show_help_popup: bool,
}

impl Default for UiState {
    fn default() -> Self {
        Self {
            active_section: ActiveSection::Songs,
            playlist_selected: 0,
            song_selected: 0,
            error_message: None,
            error_timestamp: None,
            show_help_popup: false,
        }
    }
}
