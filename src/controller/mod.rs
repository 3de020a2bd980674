//! Controller module - Application logic and event handling
//!
//! This module contains the application controller that handles user input,
//! coordinates between the model and view, and drives the media element.
//! It is organized into submodules by responsibility:
//!
//! - `input`: Key event handling
//! - `playback`: Transport operations and applying media commands
//! - `media_events`: Media element event listener

mod input;
mod playback;
mod media_events;

use std::sync::Arc;
use tokio::sync::Mutex;

use crate::audio::MediaElement;
use crate::model::AppModel;

/// Step sizes for keyboard seeking and volume
#[derive(Clone, Copy, Debug)]
pub struct TransportSteps {
    /// Percent of the track per seek key press
    pub seek: f64,
    pub volume: f32,
}

impl Default for TransportSteps {
    fn default() -> Self {
        Self {
            seek: 5.0,
            volume: 0.05,
        }
    }
}

#[derive(Clone)]
pub struct AppController {
    pub(crate) model: Arc<Mutex<AppModel>>,
    pub(crate) media: Arc<dyn MediaElement>,
    steps: TransportSteps,
}

impl AppController {
    pub fn new(model: Arc<Mutex<AppModel>>, media: Arc<dyn MediaElement>, steps: TransportSteps) -> Self {
        Self { model, media, steps }
    }
}
