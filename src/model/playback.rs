//! Playback state and the coordinator that owns it
//!
//! The coordinator is the only thing allowed to mutate [`PlaybackState`]. It never
//! talks to the media element itself: every operation queues [`MediaCommand`]s that
//! the controller drains with [`PlaybackCoordinator::take_commands`] and applies.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{MediaError, MediaErrorCode, PlayError};
use super::catalog::{Catalog, Song};

pub const DEFAULT_VOLUME: f32 = 0.5;

/// Play intent as seen against the media element
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TransportState {
    Paused,
    /// Start was requested; the element has not confirmed or rejected it yet
    PlayRequested,
    Playing,
    /// The element refused to start. Behaves exactly like `Paused`.
    Blocked,
}

impl TransportState {
    pub fn label(self) -> &'static str {
        match self {
            TransportState::Paused => "paused",
            TransportState::PlayRequested => "starting",
            TransportState::Playing => "playing",
            TransportState::Blocked => "blocked",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Next,
    Previous,
}

/// What "previous" does when the current song is not in the active playlist
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreviousFallback {
    /// Leave playback untouched
    #[default]
    Ignore,
    /// Start the active playlist from its first track, same as "next"
    Restart,
}

/// Instruction for the media element, in the order it must be applied
#[derive(Clone, Debug, PartialEq)]
pub enum MediaCommand {
    SetSource(String),
    Play { generation: u64 },
    Pause,
    SetVolume(f32),
    SeekTo(f64),
}

/// Serializable summary of a playback failure. Built from primitive fields only.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlaybackFailure {
    pub code: u16,
    pub kind: MediaErrorCode,
    pub message: String,
    pub song_id: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Clone, Debug)]
pub struct PlaybackState {
    current_song: Option<Song>,
    is_playing: bool,
    volume: f32,
    progress: f64,
    current_time: f64,
    duration: f64,
    transport: TransportState,
}

impl PlaybackState {
    fn new(current_song: Option<Song>, volume: f32) -> Self {
        Self {
            current_song,
            is_playing: false,
            volume,
            progress: 0.0,
            current_time: 0.0,
            duration: 0.0,
            transport: TransportState::Paused,
        }
    }

    pub fn current_song(&self) -> Option<&Song> {
        self.current_song.as_ref()
    }

    pub fn is_playing(&self) -> bool {
        self.is_playing
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn duration(&self) -> f64 {
        self.duration
    }

    pub fn transport(&self) -> TransportState {
        self.transport
    }
}

/// Complete playback information for rendering the player bar
#[derive(Clone, Debug)]
pub struct PlaybackInfo {
    pub song: Option<Song>,
    pub is_playing: bool,
    pub transport: TransportState,
    pub volume: f32,
    pub progress: f64,
    pub current_time: f64,
    pub duration: f64,
    pub active_playlist: usize,
    pub device_name: String,
}

pub struct PlaybackCoordinator {
    state: PlaybackState,
    catalog: Arc<Catalog>,
    active_playlist: usize,
    previous_fallback: PreviousFallback,
    play_generation: u64,
    muted_volume: Option<f32>,
    commands: Vec<MediaCommand>,
}

impl PlaybackCoordinator {
    /// Start paused with the first song of the first playlist selected
    pub fn new(catalog: Arc<Catalog>, volume: f32, previous_fallback: PreviousFallback) -> Self {
        let first = catalog.first_song().cloned();
        let volume = if volume.is_finite() { volume.clamp(0.0, 1.0) } else { DEFAULT_VOLUME };
        Self {
            state: PlaybackState::new(first, volume),
            catalog,
            active_playlist: 0,
            previous_fallback,
            play_generation: 0,
            muted_volume: None,
            commands: Vec::new(),
        }
    }

    pub fn state(&self) -> &PlaybackState {
        &self.state
    }

    pub fn catalog(&self) -> &Arc<Catalog> {
        &self.catalog
    }

    pub fn active_playlist(&self) -> usize {
        self.active_playlist
    }

    /// Generation of the most recent play request
    #[cfg(test)]
    pub fn play_generation(&self) -> u64 {
        self.play_generation
    }

    pub fn take_commands(&mut self) -> Vec<MediaCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn snapshot(&self, device_name: &str) -> PlaybackInfo {
        PlaybackInfo {
            song: self.state.current_song().cloned(),
            is_playing: self.state.is_playing(),
            transport: self.state.transport(),
            volume: self.state.volume(),
            progress: self.state.progress(),
            current_time: self.state.current_time(),
            duration: self.state.duration(),
            active_playlist: self.active_playlist,
            device_name: device_name.to_string(),
        }
    }

    /// Bind the pre-selected song and initial volume without starting playback
    pub fn prime(&mut self) {
        if let Some(song) = &self.state.current_song {
            self.commands.push(MediaCommand::SetSource(song.audio_url.clone()));
        }
        self.commands.push(MediaCommand::SetVolume(self.state.volume));
    }

    fn is_current(&self, song_id: &str) -> bool {
        self.state
            .current_song
            .as_ref()
            .is_some_and(|s| s.id == song_id)
    }

    fn set_play_intent(&mut self, playing: bool) {
        self.state.is_playing = playing;
        if playing {
            self.play_generation += 1;
            self.state.transport = TransportState::PlayRequested;
            self.commands.push(MediaCommand::Play {
                generation: self.play_generation,
            });
        } else {
            self.state.transport = TransportState::Paused;
            self.commands.push(MediaCommand::Pause);
        }
    }

    /// Rebind the element to a new song. Position and duration from the old
    /// source are no longer valid.
    fn load_song(&mut self, song: Song) {
        tracing::debug!(song_id = %song.id, title = %song.title, "Loading song");
        self.commands.push(MediaCommand::SetSource(song.audio_url.clone()));
        self.state.current_song = Some(song);
        self.state.progress = 0.0;
        self.state.current_time = 0.0;
        self.state.duration = 0.0;
    }

    pub fn select_or_toggle(&mut self, song: &Song) {
        if self.is_current(&song.id) {
            self.toggle_play();
            return;
        }
        self.load_song(song.clone());
        self.set_play_intent(true);
    }

    pub fn toggle_play(&mut self) {
        if self.state.current_song.is_none() {
            return;
        }
        let playing = !self.state.is_playing;
        tracing::debug!(playing, "Toggling play intent");
        self.set_play_intent(playing);
    }

    /// Position/metadata report from the element. Non-finite values are ignored
    /// per field.
    pub fn on_time_update(&mut self, current_time: f64, duration: f64) {
        if current_time.is_finite() {
            self.state.current_time = current_time.max(0.0);
        } else {
            tracing::trace!("Ignoring non-numeric current time");
        }

        if duration.is_finite() && duration > 0.0 {
            self.state.duration = duration;
            self.state.progress = (self.state.current_time / duration * 100.0).clamp(0.0, 100.0);
        }
    }

    /// Jump to `value` percent of the known duration
    pub fn seek(&mut self, value: f64) {
        if !value.is_finite() || !(self.state.duration > 0.0) {
            tracing::debug!(value, "Seek ignored, duration unknown");
            return;
        }
        let value = value.clamp(0.0, 100.0);
        let target = value / 100.0 * self.state.duration;
        self.commands.push(MediaCommand::SeekTo(target));
        self.state.progress = value;
        self.state.current_time = target;
    }

    /// Move the playhead by `delta` percent
    pub fn seek_by(&mut self, delta: f64) {
        self.seek(self.state.progress + delta);
    }

    pub fn set_volume(&mut self, value: f32) {
        if !value.is_finite() {
            return;
        }
        let value = value.clamp(0.0, 1.0);
        if value == self.state.volume {
            return;
        }
        self.state.volume = value;
        self.commands.push(MediaCommand::SetVolume(value));
    }

    pub fn toggle_mute(&mut self) {
        if self.state.volume > 0.0 {
            self.muted_volume = Some(self.state.volume);
            self.set_volume(0.0);
        } else {
            let restored = self.muted_volume.take().unwrap_or(DEFAULT_VOLUME);
            self.set_volume(restored);
        }
    }

    /// Step through the active playlist, wrapping at both ends
    pub fn advance(&mut self, direction: Direction) {
        let Some(current_id) = self.state.current_song.as_ref().map(|s| s.id.clone()) else {
            return;
        };
        let catalog = Arc::clone(&self.catalog);
        let Some(playlist) = catalog.playlist(self.active_playlist) else {
            return;
        };
        let len = playlist.songs.len();
        if len == 0 {
            return;
        }

        let target = match (playlist.position_of(&current_id), direction) {
            (Some(i), Direction::Next) => (i + 1) % len,
            (Some(i), Direction::Previous) => (i + len - 1) % len,
            (None, Direction::Next) => 0,
            (None, Direction::Previous) => match self.previous_fallback {
                PreviousFallback::Ignore => {
                    tracing::debug!(song_id = %current_id, "Current song not in active playlist, previous ignored");
                    return;
                }
                PreviousFallback::Restart => 0,
            },
        };

        let song = &playlist.songs[target];
        if song.id == current_id {
            // Single-song playlist: restart in place
            self.commands.push(MediaCommand::SeekTo(0.0));
            self.state.current_time = 0.0;
            self.state.progress = 0.0;
        } else {
            self.load_song(song.clone());
        }
        self.set_play_intent(true);
    }

    pub fn on_playback_ended(&mut self) {
        tracing::debug!("Track ended");
        self.advance(Direction::Next);
    }

    pub fn on_playback_error(&mut self, error: &MediaError) -> PlaybackFailure {
        self.set_play_intent(false);
        PlaybackFailure {
            code: error.code.code(),
            kind: error.code,
            message: error.message.clone(),
            song_id: self.state.current_song.as_ref().map(|s| s.id.clone()),
            occurred_at: Utc::now(),
        }
    }

    /// Outcome of a deferred play request. Results for superseded requests
    /// are dropped.
    pub fn on_play_settled(&mut self, generation: u64, result: Result<(), PlayError>) {
        if generation != self.play_generation || self.state.transport != TransportState::PlayRequested {
            tracing::trace!(generation, latest = self.play_generation, "Discarding stale play result");
            return;
        }

        match result {
            Ok(()) => {
                self.state.transport = TransportState::Playing;
            }
            Err(PlayError::NotAllowed(reason)) => {
                tracing::warn!(%reason, "Playback start rejected, reverting to paused");
                self.set_play_intent(false);
                self.state.transport = TransportState::Blocked;
            }
            Err(PlayError::NotSupported(reason)) => {
                tracing::warn!(%reason, "Source could not be played, reverting to paused");
                self.set_play_intent(false);
            }
            Err(PlayError::Aborted) => {
                tracing::debug!("Play request aborted before starting");
            }
        }
    }

    /// Change the ordering context for next/previous
    pub fn set_active_playlist(&mut self, index: usize) {
        if index < self.catalog.len() {
            self.active_playlist = index;
        }
    }

    /// The big play button on a playlist: toggle if this playlist is already
    /// the source of the current song, otherwise start from its first track
    pub fn play_playlist(&mut self) {
        let catalog = Arc::clone(&self.catalog);
        let Some(playlist) = catalog.playlist(self.active_playlist) else {
            return;
        };
        let Some(first) = playlist.songs.first() else {
            return;
        };

        let owns_current = self
            .state
            .current_song
            .as_ref()
            .is_some_and(|s| playlist.contains(&s.id));

        if owns_current {
            self.toggle_play();
        } else {
            self.select_or_toggle(first);
        }
    }
}
