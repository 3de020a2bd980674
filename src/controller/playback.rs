//! Playback control methods

use crate::error::PlayError;
use crate::model::{Direction, MediaCommand, PlaybackCoordinator};

use super::AppController;

impl AppController {
    /// Run a coordinator operation under the model lock, then apply whatever it
    /// queued to the media element once the lock is released
    pub(crate) async fn with_playback<F>(&self, op: F)
    where
        F: FnOnce(&mut PlaybackCoordinator),
    {
        let commands = {
            let mut model = self.model.lock().await;
            op(model.playback_mut());
            model.follow_current_song();
            model.playback_mut().take_commands()
        };
        self.apply_commands(commands);
    }

    pub(crate) fn apply_commands(&self, commands: Vec<MediaCommand>) {
        for command in commands {
            match command {
                MediaCommand::SetSource(uri) => self.media.set_source(&uri),
                MediaCommand::Play { generation } => {
                    // Fire and forget; only a rejection changes state later
                    let pending = self.media.play();
                    let controller = self.clone();
                    tokio::spawn(async move {
                        let result = pending.await;
                        controller.settle_play(generation, result).await;
                    });
                }
                MediaCommand::Pause => self.media.pause(),
                MediaCommand::SetVolume(volume) => self.media.set_volume(volume),
                MediaCommand::SeekTo(seconds) => self.media.set_current_time(seconds),
            }
        }
    }

    async fn settle_play(&self, generation: u64, result: Result<(), PlayError>) {
        if let Err(e) = &result {
            tracing::debug!(generation, error = %e, "Play request settled with error");
        }
        self.with_playback(|p| p.on_play_settled(generation, result)).await;
    }

    /// Bind the initial song and volume to the element without playing
    pub async fn prime(&self) {
        let device_name = self.media.device_name();
        self.model.lock().await.update_device_name(device_name);
        self.with_playback(|p| p.prime()).await;
    }

    pub async fn toggle_playback(&self) {
        self.with_playback(|p| p.toggle_play()).await;
    }

    pub async fn play_selected_song(&self) {
        let song = self.model.lock().await.get_selected_song();
        if let Some(song) = song {
            tracing::info!(song_id = %song.id, title = %song.title, "Song selected");
            self.with_playback(|p| p.select_or_toggle(&song)).await;
        }
    }

    pub async fn play_active_playlist(&self) {
        self.with_playback(|p| p.play_playlist()).await;
    }

    pub async fn next_track(&self) {
        tracing::debug!("Skipping to next track");
        self.with_playback(|p| p.advance(Direction::Next)).await;
    }

    pub async fn previous_track(&self) {
        tracing::debug!("Skipping to previous track");
        self.with_playback(|p| p.advance(Direction::Previous)).await;
    }

    pub async fn seek_to(&self, percent: f64) {
        self.with_playback(|p| p.seek(percent)).await;
    }

    pub async fn seek_forward(&self) {
        let step = self.steps.seek;
        self.with_playback(|p| p.seek_by(step)).await;
    }

    pub async fn seek_backward(&self) {
        let step = self.steps.seek;
        self.with_playback(|p| p.seek_by(-step)).await;
    }

    pub async fn volume_up(&self) {
        let step = self.steps.volume;
        self.with_playback(|p| p.set_volume(p.state().volume() + step)).await;
    }

    pub async fn volume_down(&self) {
        let step = self.steps.volume;
        self.with_playback(|p| p.set_volume(p.state().volume() - step)).await;
    }

    pub async fn toggle_mute(&self) {
        self.with_playback(|p| p.toggle_mute()).await;
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use std::sync::Arc;

    use tokio::sync::Mutex;

    use super::*;
    use crate::controller::testing::{Call, FakeElement};
    use crate::controller::TransportSteps;
    use crate::model::{
        ActiveSection, AppModel, Catalog, PreviousFallback, TransportState, DEFAULT_VOLUME,
    };
    use crate::model::catalog_tests::test_playlist;

    pub(crate) fn setup() -> (AppController, Arc<FakeElement>) {
        let catalog = Catalog::new(vec![
            test_playlist("p1", &["s1", "s2", "s3"]),
            test_playlist("p2", &["t1", "t2"]),
        ])
        .unwrap();
        let model = AppModel::new(Arc::new(catalog), DEFAULT_VOLUME, PreviousFallback::Ignore);
        let element = Arc::new(FakeElement::default());
        let controller = AppController::new(
            Arc::new(Mutex::new(model)),
            element.clone(),
            TransportSteps::default(),
        );
        (controller, element)
    }

    /// Let spawned play tasks run to completion
    pub(crate) async fn settle() {
        for _ in 0..10 {
            tokio::task::yield_now().await;
        }
    }

    pub(crate) async fn current_id(controller: &AppController) -> String {
        let model = controller.model.lock().await;
        model
            .playback()
            .state()
            .current_song()
            .map(|s| s.id.clone())
            .unwrap_or_default()
    }

    async fn select_song_at(controller: &AppController, index: usize) {
        {
            let mut model = controller.model.lock().await;
            model.set_active_section(ActiveSection::Songs);
            for _ in 0..index {
                model.move_selection_down();
            }
        }
        controller.play_selected_song().await;
    }

    #[tokio::test]
    async fn prime_binds_first_song_without_playing() {
        let (controller, element) = setup();
        controller.prime().await;

        assert_eq!(
            element.calls(),
            vec![
                Call::SetSource("/tmp/s1.mp3".into()),
                Call::SetVolume(DEFAULT_VOLUME),
            ]
        );
        let model = controller.model.lock().await;
        assert_eq!(model.get_playback_info().device_name, "fake output");
        assert!(!model.playback().state().is_playing());
    }

    #[tokio::test]
    async fn selecting_song_rebinds_and_plays() {
        let (controller, element) = setup();
        select_song_at(&controller, 1).await;
        settle().await;

        assert_eq!(
            element.calls(),
            vec![Call::SetSource("/tmp/s2.mp3".into()), Call::Play]
        );
        let model = controller.model.lock().await;
        assert_eq!(model.playback().state().transport(), TransportState::Playing);
    }

    #[tokio::test]
    async fn rejected_start_reverts_to_paused() {
        let (controller, element) = setup();
        element.push_play_result(Err(PlayError::NotAllowed("no device".into())));

        controller.toggle_playback().await;
        assert!(controller.model.lock().await.playback().state().is_playing());

        settle().await;
        assert_eq!(element.calls(), vec![Call::Play, Call::Pause]);
        let model = controller.model.lock().await;
        assert!(!model.playback().state().is_playing());
        assert!(!model.has_error());
    }

    #[tokio::test]
    async fn late_rejection_for_superseded_song_is_ignored() {
        let (controller, element) = setup();
        element.push_play_result(Err(PlayError::NotAllowed("late".into())));

        select_song_at(&controller, 1).await;
        controller.next_track().await;
        settle().await;

        assert_eq!(current_id(&controller).await, "s3");
        let model = controller.model.lock().await;
        assert!(model.playback().state().is_playing());
        assert_eq!(model.playback().state().transport(), TransportState::Playing);
        assert!(!element.calls().contains(&Call::Pause));
    }

    #[tokio::test]
    async fn seek_needs_known_duration() {
        let (controller, element) = setup();
        controller.seek_to(50.0).await;
        assert!(element.calls().is_empty());

        controller
            .with_playback(|p| p.on_time_update(0.0, 200.0))
            .await;
        controller.seek_to(50.0).await;
        assert_eq!(element.calls(), vec![Call::SetCurrentTime(100.0)]);
    }

    #[tokio::test]
    async fn volume_steps_are_clamped() {
        let (controller, element) = setup();
        for _ in 0..20 {
            controller.volume_up().await;
        }
        let volume = controller.model.lock().await.playback().state().volume();
        assert_eq!(volume, 1.0);

        element.clear_calls();
        controller.volume_up().await;
        assert!(element.calls().is_empty());
    }

    #[tokio::test]
    async fn next_and_previous_wrap() {
        let (controller, _element) = setup();
        controller.previous_track().await;
        assert_eq!(current_id(&controller).await, "s3");
        controller.next_track().await;
        assert_eq!(current_id(&controller).await, "s1");
    }

    #[tokio::test]
    async fn song_cursor_follows_track_changes() {
        let (controller, _element) = setup();
        controller.next_track().await;
        assert_eq!(controller.model.lock().await.get_ui_state().song_selected, 1);
    }
}
