//! Media event listener for position, end-of-track and failure reports

use tokio::sync::mpsc::UnboundedReceiver;

use crate::audio::{MediaEvent, SourceEvent};
use crate::model::PlaybackFailure;
use super::AppController;

impl AppController {
    pub fn start_media_event_listener(&self, mut events: UnboundedReceiver<SourceEvent>) {
        let controller = self.clone();
        tracing::info!("Starting media event listener");

        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if controller.model.lock().await.should_quit() {
                    tracing::debug!("Media event listener shutting down");
                    break;
                }
                controller.handle_source_event(event).await;
            }
        });
    }

    /// Apply an event unless its source has been replaced since it was emitted
    pub async fn handle_source_event(&self, event: SourceEvent) {
        let current = self.media.current_source();
        if event.source != current {
            tracing::trace!(source = event.source, current, event = ?event.event, "Dropping event from replaced source");
            return;
        }
        self.handle_media_event(event.event).await;
    }

    pub async fn handle_media_event(&self, event: MediaEvent) {
        match event {
            MediaEvent::TimeUpdate { current_time, duration } => {
                tracing::trace!(current_time, duration, "MediaEvent::TimeUpdate");
                self.with_playback(|p| p.on_time_update(current_time, duration)).await;
            }
            MediaEvent::LoadedMetadata { current_time, duration } => {
                tracing::debug!(current_time, duration, "MediaEvent::LoadedMetadata");
                self.with_playback(|p| p.on_time_update(current_time, duration)).await;
            }
            MediaEvent::Ended => {
                tracing::debug!("MediaEvent::Ended");
                self.with_playback(|p| p.on_playback_ended()).await;
            }
            MediaEvent::Error(error) => {
                let (failure, commands) = {
                    let mut model = self.model.lock().await;
                    let failure = model.playback_mut().on_playback_error(&error);
                    model.set_error(format!("Playback failed: {}", failure.message));
                    (failure, model.playback_mut().take_commands())
                };
                self.apply_commands(commands);
                report_failure(&failure);
            }
        }
    }
}

fn report_failure(failure: &PlaybackFailure) {
    tracing::error!(
        code = failure.code,
        kind = %failure.kind,
        message = %failure.message,
        song_id = failure.song_id.as_deref().unwrap_or("none"),
        "Playback failed"
    );

    match serde_json::to_string(failure) {
        Ok(record) => tracing::info!(target: "mixtape::failures", %record, "Playback failure recorded"),
        Err(e) => tracing::warn!(error = %e, "Failed to serialize playback failure"),
    }
}
