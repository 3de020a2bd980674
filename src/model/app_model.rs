//! Main application model with state management

use std::sync::Arc;
use std::time::{Duration, Instant};

use super::catalog::{Catalog, Song};
use super::playback::{PlaybackCoordinator, PlaybackInfo, PreviousFallback};
use super::types::{ActiveSection, UiState};

const ERROR_DISPLAY_DURATION: Duration = Duration::from_secs(5);

/// Main application model: the playback coordinator plus presentation state
pub struct AppModel {
    playback: PlaybackCoordinator,
    ui_state: UiState,
    device_name: String,
    should_quit: bool,
}

impl AppModel {
    pub fn new(catalog: Arc<Catalog>, volume: f32, previous_fallback: PreviousFallback) -> Self {
        Self {
            playback: PlaybackCoordinator::new(catalog, volume, previous_fallback),
            ui_state: UiState::default(),
            device_name: "No output".to_string(),
            should_quit: false,
        }
    }

    pub fn catalog(&self) -> Arc<Catalog> {
        Arc::clone(self.playback.catalog())
    }

    pub fn playback(&self) -> &PlaybackCoordinator {
        &self.playback
    }

    pub fn playback_mut(&mut self) -> &mut PlaybackCoordinator {
        &mut self.playback
    }

    // ========================================================================
    // Device & Playback State
    // ========================================================================

    pub fn update_device_name(&mut self, name: String) {
        self.device_name = name;
    }

    pub fn get_playback_info(&self) -> PlaybackInfo {
        self.playback.snapshot(&self.device_name)
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn set_should_quit(&mut self, quit: bool) {
        self.should_quit = quit;
    }

    // ========================================================================
    // Navigation
    // ========================================================================

    pub fn get_ui_state(&self) -> UiState {
        self.ui_state.clone()
    }

    pub fn cycle_section_forward(&mut self) {
        self.ui_state.active_section = self.ui_state.active_section.next();
    }

    pub fn cycle_section_backward(&mut self) {
        self.ui_state.active_section = self.ui_state.active_section.prev();
    }

    pub fn set_active_section(&mut self, section: ActiveSection) {
        self.ui_state.active_section = section;
    }

    fn active_song_count(&self) -> usize {
        self.playback
            .catalog()
            .playlist(self.playback.active_playlist())
            .map(|p| p.songs.len())
            .unwrap_or(0)
    }

    pub fn move_selection_up(&mut self) {
        let state = &mut self.ui_state;
        match state.active_section {
            ActiveSection::Playlists => {
                state.playlist_selected = state.playlist_selected.saturating_sub(1);
            }
            ActiveSection::Songs => {
                state.song_selected = state.song_selected.saturating_sub(1);
            }
        }
    }

    pub fn move_selection_down(&mut self) {
        let playlist_count = self.playback.catalog().len();
        let song_count = self.active_song_count();
        let state = &mut self.ui_state;
        match state.active_section {
            ActiveSection::Playlists => {
                if state.playlist_selected + 1 < playlist_count {
                    state.playlist_selected += 1;
                }
            }
            ActiveSection::Songs => {
                if state.song_selected + 1 < song_count {
                    state.song_selected += 1;
                }
            }
        }
    }

    /// Make the highlighted sidebar playlist the active one and move focus to
    /// its songs, placing the cursor on the current song when it is listed
    pub fn open_selected_playlist(&mut self) {
        let index = self.ui_state.playlist_selected;
        self.playback.set_active_playlist(index);

        let catalog = self.catalog();
        let cursor = catalog
            .playlist(self.playback.active_playlist())
            .and_then(|p| {
                let current = self.playback.state().current_song()?;
                p.position_of(&current.id)
            })
            .unwrap_or(0);

        self.ui_state.song_selected = cursor;
        self.ui_state.active_section = ActiveSection::Songs;
        tracing::debug!(playlist = index, "Opened playlist");
    }

    pub fn get_selected_song(&self) -> Option<Song> {
        self.playback
            .catalog()
            .playlist(self.playback.active_playlist())
            .and_then(|p| p.songs.get(self.ui_state.song_selected))
            .cloned()
    }

    /// Keep the song cursor on the playing track when it changes by itself
    pub fn follow_current_song(&mut self) {
        let catalog = self.catalog();
        let position = catalog
            .playlist(self.playback.active_playlist())
            .and_then(|p| {
                let current = self.playback.state().current_song()?;
                p.position_of(&current.id)
            });
        if let Some(position) = position {
            self.ui_state.song_selected = position;
        }
    }

    // ========================================================================
    // Errors & Overlays
    // ========================================================================

    pub fn set_error(&mut self, message: String) {
        self.ui_state.error_message = Some(message);
        self.ui_state.error_timestamp = Some(Instant::now());
    }

    pub fn clear_error(&mut self) {
        self.ui_state.error_message = None;
        self.ui_state.error_timestamp = None;
    }

    pub fn has_error(&self) -> bool {
        self.ui_state.error_message.is_some()
    }

    pub fn auto_clear_old_errors(&mut self) {
        if let Some(timestamp) = self.ui_state.error_timestamp {
            if timestamp.elapsed() >= ERROR_DISPLAY_DURATION {
                self.clear_error();
            }
        }
    }

    pub fn show_help_popup(&mut self) {
        self.ui_state.show_help_popup = true;
    }

    pub fn hide_help_popup(&mut self) {
        self.ui_state.show_help_popup = false;
    }

    pub fn is_help_popup_open(&self) -> bool {
        self.ui_state.show_help_popup
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::catalog::tests::test_playlist;
    use crate::model::playback::DEFAULT_VOLUME;

    fn model() -> AppModel {
        let catalog = Catalog::new(vec![
            test_playlist("p1", &["s1", "s2", "s3"]),
            test_playlist("p2", &["t1", "s2"]),
        ])
        .unwrap();
        AppModel::new(Arc::new(catalog), DEFAULT_VOLUME, PreviousFallback::Ignore)
    }

    #[test]
    fn selection_stays_in_bounds() {
        let mut m = model();
        m.move_selection_up();
        assert_eq!(m.get_ui_state().song_selected, 0);
        for _ in 0..10 {
            m.move_selection_down();
        }
        assert_eq!(m.get_ui_state().song_selected, 2);

        m.set_active_section(ActiveSection::Playlists);
        for _ in 0..10 {
            m.move_selection_down();
        }
        assert_eq!(m.get_ui_state().playlist_selected, 1);
    }

    #[test]
    fn opening_playlist_changes_active_playlist_but_not_song() {
        let mut m = model();
        m.set_active_section(ActiveSection::Playlists);
        m.move_selection_down();
        m.open_selected_playlist();

        assert_eq!(m.playback().active_playlist(), 1);
        assert_eq!(m.get_ui_state().active_section, ActiveSection::Songs);
        assert_eq!(m.get_ui_state().song_selected, 0);
        assert_eq!(m.playback().state().current_song().unwrap().id, "s1");
        assert_eq!(m.get_selected_song().unwrap().id, "t1");
    }

    #[test]
    fn opening_playlist_places_cursor_on_current_song() {
        let mut m = model();
        m.move_selection_down();
        let s2 = m.get_selected_song().unwrap();
        m.playback_mut().select_or_toggle(&s2);

        m.set_active_section(ActiveSection::Playlists);
        m.move_selection_down();
        m.open_selected_playlist();
        assert_eq!(m.get_ui_state().song_selected, 1);
    }

    #[test]
    fn follow_current_song_tracks_advance() {
        let mut m = model();
        m.playback_mut().on_playback_ended();
        m.follow_current_song();
        assert_eq!(m.get_ui_state().song_selected, 1);
    }

    #[test]
    fn errors_set_and_clear() {
        let mut m = model();
        m.set_error("boom".to_string());
        assert!(m.has_error());
        m.auto_clear_old_errors();
        assert!(m.has_error());
        m.clear_error();
        assert!(!m.has_error());
    }

    #[test]
    fn playback_info_carries_device_name() {
        let mut m = model();
        m.update_device_name("Built-in Output".to_string());
        assert_eq!(m.get_playback_info().device_name, "Built-in Output");
    }
}
