//! Key event handling

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyEventKind};

use crate::model::ActiveSection;
use super::AppController;

impl AppController {
    pub async fn handle_key_event(&self, key: KeyEvent) -> Result<()> {
        if key.kind != KeyEventKind::Press {
            return Ok(());
        }

        let mut model = self.model.lock().await;

        // Handle error message first (blocks all other interactions)
        if model.has_error() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Enter) {
                model.clear_error();
            }
            return Ok(());
        }

        // Handle help popup
        if model.is_help_popup_open() {
            if matches!(key.code, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Char('H')) {
                model.hide_help_popup();
            }
            return Ok(());
        }

        let ui_state = model.get_ui_state();

        if key.code == KeyCode::Enter {
            match ui_state.active_section {
                ActiveSection::Playlists => model.open_selected_playlist(),
                ActiveSection::Songs => {
                    drop(model);
                    self.play_selected_song().await;
                }
            }
            return Ok(());
        }

        match key.code {
            KeyCode::Char('q') => {
                tracing::info!("Quit requested");
                model.set_should_quit(true);
            }
            KeyCode::Char('h') | KeyCode::Char('H') => model.show_help_popup(),
            KeyCode::Tab => model.cycle_section_forward(),
            KeyCode::BackTab => model.cycle_section_backward(),
            KeyCode::Up => model.move_selection_up(),
            KeyCode::Down => model.move_selection_down(),
            KeyCode::Char(' ') => {
                drop(model);
                self.toggle_playback().await;
            }
            KeyCode::Char('P') => {
                drop(model);
                self.play_active_playlist().await;
            }
            KeyCode::Char('n') => {
                drop(model);
                self.next_track().await;
            }
            KeyCode::Char('p') => {
                drop(model);
                self.previous_track().await;
            }
            KeyCode::Right => {
                drop(model);
                self.seek_forward().await;
            }
            KeyCode::Left => {
                drop(model);
                self.seek_backward().await;
            }
            KeyCode::Char(c @ '0'..='9') => {
                drop(model);
                let tenths = c.to_digit(10).unwrap_or(0);
                self.seek_to(f64::from(tenths) * 10.0).await;
            }
            KeyCode::Char('+') | KeyCode::Char('=') => {
                drop(model);
                self.volume_up().await;
            }
            KeyCode::Char('-') => {
                drop(model);
                self.volume_down().await;
            }
            KeyCode::Char('m') => {
                drop(model);
                self.toggle_mute().await;
            }
            _ => {}
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyModifiers;

    use super::*;
    use crate::controller::playback::tests::{current_id, settle, setup};
    use crate::controller::testing::Call;

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[tokio::test]
    async fn quit_key_sets_flag() {
        let (controller, _element) = setup();
        controller.handle_key_event(press(KeyCode::Char('q'))).await.unwrap();
        assert!(controller.model.lock().await.should_quit());
    }

    #[tokio::test]
    async fn release_events_are_ignored() {
        let (controller, element) = setup();
        let mut key = press(KeyCode::Char(' '));
        key.kind = KeyEventKind::Release;
        controller.handle_key_event(key).await.unwrap();
        assert!(element.calls().is_empty());
    }

    #[tokio::test]
    async fn space_toggles_playback() {
        let (controller, element) = setup();
        controller.handle_key_event(press(KeyCode::Char(' '))).await.unwrap();
        settle().await;
        controller.handle_key_event(press(KeyCode::Char(' '))).await.unwrap();

        assert_eq!(element.calls(), vec![Call::Play, Call::Pause]);
        assert!(!controller.model.lock().await.playback().state().is_playing());
    }

    #[tokio::test]
    async fn opening_second_playlist_then_selecting_song() {
        let (controller, element) = setup();
        controller.handle_key_event(press(KeyCode::BackTab)).await.unwrap();
        controller.handle_key_event(press(KeyCode::Down)).await.unwrap();
        controller.handle_key_event(press(KeyCode::Enter)).await.unwrap();
        {
            let model = controller.model.lock().await;
            assert_eq!(model.get_ui_state().active_section, ActiveSection::Songs);
            assert_eq!(model.playback().active_playlist(), 1);
        }

        controller.handle_key_event(press(KeyCode::Down)).await.unwrap();
        controller.handle_key_event(press(KeyCode::Enter)).await.unwrap();
        settle().await;

        assert_eq!(current_id(&controller).await, "t2");
        assert_eq!(
            element.calls(),
            vec![Call::SetSource("/tmp/t2.mp3".into()), Call::Play]
        );
    }

    #[tokio::test]
    async fn digit_keys_seek_by_tenths() {
        let (controller, element) = setup();
        controller
            .with_playback(|p| p.on_time_update(0.0, 300.0))
            .await;
        controller.handle_key_event(press(KeyCode::Char('3'))).await.unwrap();
        assert_eq!(element.calls(), vec![Call::SetCurrentTime(90.0)]);
    }

    #[tokio::test]
    async fn error_overlay_swallows_keys_until_dismissed() {
        let (controller, element) = setup();
        controller.model.lock().await.set_error("boom".to_string());

        controller.handle_key_event(press(KeyCode::Char('n'))).await.unwrap();
        assert!(element.calls().is_empty());
        assert_eq!(current_id(&controller).await, "s1");

        controller.handle_key_event(press(KeyCode::Esc)).await.unwrap();
        assert!(!controller.model.lock().await.has_error());
    }

    #[tokio::test]
    async fn mute_round_trip_restores_volume() {
        let (controller, element) = setup();
        controller.handle_key_event(press(KeyCode::Char('m'))).await.unwrap();
        controller.handle_key_event(press(KeyCode::Char('m'))).await.unwrap();
        assert_eq!(element.calls(), vec![Call::SetVolume(0.0), Call::SetVolume(0.5)]);
    }

    #[tokio::test]
    async fn capital_p_plays_playlist_and_lowercase_p_goes_back() {
        let (controller, element) = setup();
        controller
            .handle_key_event(KeyEvent::new(KeyCode::Char('P'), KeyModifiers::SHIFT))
            .await
            .unwrap();
        settle().await;
        assert_eq!(current_id(&controller).await, "s1");
        assert_eq!(element.calls(), vec![Call::Play]);

        controller.handle_key_event(press(KeyCode::Char('p'))).await.unwrap();
        assert_eq!(current_id(&controller).await, "s3");
    }
}
