//! Model module - Application state and data types
//!
//! This module contains all the data structures and state management for the application.
//! It is organized into submodules by responsibility:
//!
//! - `types`: UI type definitions (focus, cursors, overlays)
//! - `catalog`: Songs, playlists and the static catalog
//! - `playback`: Playback state and the coordinator that owns it
//! - `app_model`: Main application model tying playback and UI state together

mod types;
mod catalog;
mod playback;
mod app_model;

pub use types::{ActiveSection, UiState};

pub use catalog::{Catalog, Playlist};

pub use playback::{
    Direction, MediaCommand, PlaybackCoordinator, PlaybackFailure, PlaybackInfo,
    PreviousFallback, TransportState, DEFAULT_VOLUME,
};

pub use app_model::AppModel;

#[cfg(test)]
pub(crate) use catalog::tests as catalog_tests;
