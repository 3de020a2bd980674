//! Audio module - the media element the player drives
//!
//! [`MediaElement`] is the minimal contract the controller needs: set a source,
//! play, pause, seek, set volume. Position, end-of-track and failures come back
//! as [`SourceEvent`]s on a channel.
//!
//! - `element`: rodio-backed implementation running on its own audio thread
//! - `source`: fetching source bytes from http(s) URLs or local paths

mod element;
mod source;

use futures::future::BoxFuture;

use crate::error::{MediaError, PlayError};

pub use element::{AudioConfig, RodioElement};

/// Identifies one `set_source` call on an element. Counts up from 1.
pub type SourceId = u64;

/// Events reported by a media element
#[derive(Clone, Debug, PartialEq)]
pub enum MediaEvent {
    /// Periodic position report while playing. Either value may be NaN when
    /// the element does not know it.
    TimeUpdate { current_time: f64, duration: f64 },
    /// A new source finished loading
    LoadedMetadata { current_time: f64, duration: f64 },
    Ended,
    Error(MediaError),
}

/// A [`MediaEvent`] tagged with the source that produced it
#[derive(Clone, Debug, PartialEq)]
pub struct SourceEvent {
    pub source: SourceId,
    pub event: MediaEvent,
}

pub trait MediaElement: Send + Sync {
    /// Rebind to a new source. Resets the playback position.
    fn set_source(&self, uri: &str);

    /// Source bound by the latest `set_source`. Events tagged with any other
    /// id were emitted for a source that has since been replaced.
    fn current_source(&self) -> SourceId;

    /// Ask the element to start. The returned future settles once playback
    /// actually starts or is refused; callers are free to not wait for it.
    fn play(&self) -> BoxFuture<'static, Result<(), PlayError>>;

    fn pause(&self);

    fn set_volume(&self, volume: f32);

    fn set_current_time(&self, seconds: f64);

    fn device_name(&self) -> String;
}
