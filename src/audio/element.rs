//! rodio-backed media element
//!
//! rodio's `OutputStream` is not `Send`, so the output device lives on a
//! dedicated audio thread. [`RodioElement`] is a cheap handle that forwards
//! commands to that thread; sources are fetched on short-lived loader threads
//! and handed back through the same channel.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use anyhow::Context;
use futures::future::{self, BoxFuture, FutureExt};
use rodio::{OutputStream, Sink};
use tokio::sync::mpsc::UnboundedSender;
use tokio::sync::oneshot;

use crate::error::{MediaError, MediaErrorCode, PlayError};
use super::source::{self, SourceBytes, SourceError};
use super::{MediaElement, MediaEvent, SourceEvent, SourceId};

const DEVICE_NAME: &str = "mixtape";

#[derive(Clone, Copy, Debug)]
pub struct AudioConfig {
    /// How often position is reported while playing
    pub tick: Duration,
    pub connect_timeout: Duration,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            tick: Duration::from_millis(250),
            connect_timeout: Duration::from_secs(10),
        }
    }
}

enum WorkerMessage {
    SetSource {
        uri: String,
        load_id: SourceId,
    },
    Play(oneshot::Sender<Result<(), PlayError>>),
    Pause,
    SetVolume(f32),
    Seek(f64),
    Loaded {
        load_id: SourceId,
        result: Result<SourceBytes, SourceError>,
    },
    Shutdown,
}

pub struct RodioElement {
    sender: Sender<WorkerMessage>,
    device_name: String,
    source: AtomicU64,
}

impl RodioElement {
    pub fn spawn(config: AudioConfig, events: UnboundedSender<SourceEvent>) -> anyhow::Result<Self> {
        let (sender, receiver) = mpsc::channel();
        let loopback = sender.clone();

        std::thread::Builder::new()
            .name("mixtape-audio".to_string())
            .spawn(move || {
                let mut worker = AudioWorker::new(config, events, loopback);
                worker.run(receiver);
            })
            .context("Failed to spawn audio thread")?;

        let device_name = Self::detect_device_name();
        tracing::info!(device = %device_name, "Audio element started");

        Ok(Self {
            sender,
            device_name,
            source: AtomicU64::new(0),
        })
    }

    fn detect_device_name() -> String {
        use rodio::cpal::traits::{DeviceTrait, HostTrait};

        rodio::cpal::default_host()
            .default_output_device()
            .and_then(|device| device.name().ok())
            .unwrap_or_else(|| {
                let hostname = hostname::get()
                    .map(|h| h.to_string_lossy().to_string())
                    .unwrap_or_else(|_| "unknown".to_string());
                format!("{}-{}", DEVICE_NAME, hostname)
            })
    }

    fn send(&self, message: WorkerMessage) {
        if self.sender.send(message).is_err() {
            tracing::warn!("Audio thread is gone, command dropped");
        }
    }
}

impl MediaElement for RodioElement {
    fn set_source(&self, uri: &str) {
        // The worker takes the id from the message so both sides agree on it
        let load_id = self.source.fetch_add(1, Ordering::SeqCst) + 1;
        self.send(WorkerMessage::SetSource {
            uri: uri.to_string(),
            load_id,
        });
    }

    fn current_source(&self) -> SourceId {
        self.source.load(Ordering::SeqCst)
    }

    fn play(&self) -> BoxFuture<'static, Result<(), PlayError>> {
        let (reply, settled) = oneshot::channel();
        if self.sender.send(WorkerMessage::Play(reply)).is_err() {
            return future::ready(Err(PlayError::NotAllowed("audio thread stopped".to_string()))).boxed();
        }
        async move { settled.await.unwrap_or(Err(PlayError::Aborted)) }.boxed()
    }

    fn pause(&self) {
        self.send(WorkerMessage::Pause);
    }

    fn set_volume(&self, volume: f32) {
        self.send(WorkerMessage::SetVolume(volume));
    }

    fn set_current_time(&self, seconds: f64) {
        self.send(WorkerMessage::Seek(seconds));
    }

    fn device_name(&self) -> String {
        self.device_name.clone()
    }
}

impl Drop for RodioElement {
    fn drop(&mut self) {
        let _ = self.sender.send(WorkerMessage::Shutdown);
    }
}

struct Output {
    // Dropping the stream silences the sink
    _stream: OutputStream,
    sink: Sink,
}

struct AudioWorker {
    config: AudioConfig,
    events: UnboundedSender<SourceEvent>,
    loopback: Sender<WorkerMessage>,
    client: Option<reqwest::blocking::Client>,
    output: Option<Output>,
    output_error: String,
    volume: f32,
    load_id: SourceId,
    uri: Option<String>,
    /// A loader thread is fetching `uri`
    loading: bool,
    bytes: Option<SourceBytes>,
    duration: f64,
    /// A decoded source is queued in the sink and has not ended
    has_track: bool,
    wants_play: bool,
    pending_play: Option<oneshot::Sender<Result<(), PlayError>>>,
    last_tick: Instant,
}

impl AudioWorker {
    fn new(config: AudioConfig, events: UnboundedSender<SourceEvent>, loopback: Sender<WorkerMessage>) -> Self {
        Self::with_output(config, events, loopback, Self::open_output())
    }

    fn with_output(
        config: AudioConfig,
        events: UnboundedSender<SourceEvent>,
        loopback: Sender<WorkerMessage>,
        output: Result<Output, String>,
    ) -> Self {
        let client = match source::build_http_client(config.connect_timeout) {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::error!(error = %e, "Failed to build HTTP client, remote sources unavailable");
                None
            }
        };

        let (output, output_error) = match output {
            Ok(output) => (Some(output), String::new()),
            Err(e) => {
                tracing::error!(error = %e, "No audio output available");
                (None, e)
            }
        };

        Self {
            config,
            events,
            loopback,
            client,
            output,
            output_error,
            volume: 1.0,
            load_id: 0,
            uri: None,
            loading: false,
            bytes: None,
            duration: f64::NAN,
            has_track: false,
            wants_play: false,
            pending_play: None,
            last_tick: Instant::now(),
        }
    }

    fn open_output() -> Result<Output, String> {
        let (stream, handle) = OutputStream::try_default().map_err(|e| e.to_string())?;
        let sink = Sink::try_new(&handle).map_err(|e| e.to_string())?;
        sink.pause();
        Ok(Output { _stream: stream, sink })
    }

    fn run(&mut self, receiver: Receiver<WorkerMessage>) {
        loop {
            match receiver.recv_timeout(self.config.tick) {
                Ok(WorkerMessage::Shutdown) => break,
                Ok(message) => self.handle(message),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            self.poll_playback();
        }
        self.abort_pending_play();
        tracing::debug!("Audio thread exiting");
    }

    fn handle(&mut self, message: WorkerMessage) {
        match message {
            WorkerMessage::SetSource { uri, load_id } => self.set_source(uri, load_id),
            WorkerMessage::Play(reply) => self.play(reply),
            WorkerMessage::Pause => {
                self.wants_play = false;
                self.abort_pending_play();
                if let Some(output) = &self.output {
                    output.sink.pause();
                }
            }
            WorkerMessage::SetVolume(volume) => {
                self.volume = volume;
                if let Some(output) = &self.output {
                    output.sink.set_volume(volume);
                }
            }
            WorkerMessage::Seek(seconds) => self.seek(seconds),
            WorkerMessage::Loaded { load_id, result } => self.on_loaded(load_id, result),
            WorkerMessage::Shutdown => {}
        }
    }

    fn emit(&self, event: MediaEvent) {
        let _ = self.events.send(SourceEvent {
            source: self.load_id,
            event,
        });
    }

    fn abort_pending_play(&mut self) {
        if let Some(pending) = self.pending_play.take() {
            let _ = pending.send(Err(PlayError::Aborted));
        }
    }

    fn set_source(&mut self, uri: String, load_id: SourceId) {
        self.abort_pending_play();
        self.wants_play = false;
        self.has_track = false;
        self.bytes = None;
        self.duration = f64::NAN;
        self.load_id = load_id;
        self.uri = Some(uri.clone());
        if let Some(output) = &self.output {
            output.sink.clear();
        }
        self.start_load(uri);
    }

    /// Fetch `uri` on a loader thread. Leaves `loading` false when no load
    /// could be started.
    fn start_load(&mut self, uri: String) {
        self.loading = false;
        let Some(client) = self.client.clone() else {
            self.emit(MediaEvent::Error(MediaError::new(
                MediaErrorCode::Network,
                "HTTP client unavailable",
            )));
            return;
        };

        let load_id = self.load_id;
        let loopback = self.loopback.clone();
        tracing::debug!(%uri, load_id, "Loading source");
        let spawned = std::thread::Builder::new()
            .name("mixtape-fetch".to_string())
            .spawn(move || {
                let result = source::fetch(&uri, &client);
                let _ = loopback.send(WorkerMessage::Loaded { load_id, result });
            });

        match spawned {
            Ok(_) => self.loading = true,
            Err(e) => self.emit(MediaEvent::Error(MediaError::new(
                MediaErrorCode::Aborted,
                format!("could not start loader: {}", e),
            ))),
        }
    }

    fn on_loaded(&mut self, load_id: SourceId, result: Result<SourceBytes, SourceError>) {
        if load_id != self.load_id {
            tracing::trace!(load_id, current = self.load_id, "Dropping superseded source");
            return;
        }
        self.loading = false;
        match result {
            Ok(bytes) => {
                self.bytes = Some(bytes);
                self.start_track();
            }
            Err(e) => self.fail(e),
        }
    }

    fn fail(&mut self, error: SourceError) {
        let media_error = error.to_media_error();
        tracing::warn!(code = media_error.code.code(), message = %media_error.message, "Source failed");
        self.wants_play = false;
        if let Some(pending) = self.pending_play.take() {
            let _ = pending.send(Err(PlayError::NotSupported(media_error.message.clone())));
        }
        self.emit(MediaEvent::Error(media_error));
    }

    /// Decode the loaded bytes from the start and queue them in the sink
    fn start_track(&mut self) {
        let Some(bytes) = self.bytes.clone() else {
            return;
        };
        let (decoder, duration) = match source::decode(&bytes) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.fail(e);
                return;
            }
        };
        self.duration = duration;
        self.emit(MediaEvent::LoadedMetadata {
            current_time: 0.0,
            duration,
        });

        let Some(output) = &self.output else {
            return;
        };
        output.sink.clear();
        output.sink.set_volume(self.volume);
        output.sink.append(decoder);
        self.has_track = true;

        if self.wants_play {
            output.sink.play();
            if let Some(pending) = self.pending_play.take() {
                let _ = pending.send(Ok(()));
            }
        } else {
            output.sink.pause();
        }
    }

    fn play(&mut self, reply: oneshot::Sender<Result<(), PlayError>>) {
        self.abort_pending_play();

        // Nothing loaded and nothing on the way: the last load failed
        if self.bytes.is_none() && !self.loading {
            if let Some(uri) = self.uri.clone() {
                tracing::debug!(%uri, "Retrying source");
                self.start_load(uri);
            }
            if !self.loading {
                let _ = reply.send(Err(PlayError::NotSupported("no playable source".to_string())));
                return;
            }
        }

        if self.output.is_none() {
            let _ = reply.send(Err(PlayError::NotAllowed(self.output_error.clone())));
            return;
        }
        self.wants_play = true;

        if self.has_track {
            if let Some(output) = &self.output {
                output.sink.play();
            }
            let _ = reply.send(Ok(()));
            return;
        }

        // Still loading, or the track ended and needs to be decoded again
        self.pending_play = Some(reply);
        if self.bytes.is_some() {
            self.start_track();
        }
    }

    fn seek(&mut self, seconds: f64) {
        if !self.has_track && self.bytes.is_some() {
            self.start_track();
        }
        let Some(output) = &self.output else {
            return;
        };
        if !self.has_track {
            return;
        }
        let target = Duration::from_secs_f64(seconds.max(0.0));
        if let Err(e) = output.sink.try_seek(target) {
            tracing::warn!(error = %e, seconds, "Seek failed");
        }
    }

    fn poll_playback(&mut self) {
        let Some(output) = &self.output else {
            return;
        };
        if !self.has_track {
            return;
        }

        if output.sink.empty() {
            self.has_track = false;
            self.wants_play = false;
            output.sink.pause();
            tracing::debug!("Source drained");
            self.emit(MediaEvent::Ended);
            return;
        }

        if !output.sink.is_paused() && self.last_tick.elapsed() >= self.config.tick {
            self.last_tick = Instant::now();
            self.emit(MediaEvent::TimeUpdate {
                current_time: output.sink.get_pos().as_secs_f64(),
                duration: self.duration,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver};

    use super::*;
    use crate::audio::source::tests::wav_silence;

    /// Worker without an output device; loader results are collected instead
    /// of being fed back automatically
    struct Headless {
        worker: AudioWorker,
        events: UnboundedReceiver<SourceEvent>,
        loads: Receiver<WorkerMessage>,
    }

    impl Headless {
        fn new() -> Self {
            let (events_tx, events) = unbounded_channel();
            let (loopback, loads) = mpsc::channel();
            let worker = AudioWorker::with_output(
                AudioConfig::default(),
                events_tx,
                loopback,
                Err("no device".to_string()),
            );
            Self { worker, events, loads }
        }

        fn drain(&mut self) -> Vec<SourceEvent> {
            let mut out = Vec::new();
            while let Ok(event) = self.events.try_recv() {
                out.push(event);
            }
            out
        }

        fn set_source(&mut self, uri: &str, load_id: SourceId) {
            self.worker.handle(WorkerMessage::SetSource {
                uri: uri.to_string(),
                load_id,
            });
        }

        /// Wait for the loader thread and hand its result to the worker
        fn finish_load(&mut self) {
            let message = self
                .loads
                .recv_timeout(Duration::from_secs(5))
                .expect("loader should report back");
            assert!(matches!(message, WorkerMessage::Loaded { .. }));
            self.worker.handle(message);
        }

        fn play(&mut self) -> Result<(), PlayError> {
            let (reply, mut settled) = oneshot::channel();
            self.worker.handle(WorkerMessage::Play(reply));
            settled.try_recv().expect("play should settle immediately")
        }

        fn park_pending_play(&mut self) -> oneshot::Receiver<Result<(), PlayError>> {
            let (reply, settled) = oneshot::channel();
            self.worker.pending_play = Some(reply);
            settled
        }
    }

    fn missing_file() -> Result<SourceBytes, SourceError> {
        Err(SourceError::Io {
            path: "/no/such/track.mp3".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        })
    }

    #[test]
    fn superseded_loads_are_ignored() {
        let mut h = Headless::new();
        h.set_source("/no/such/first.mp3", 1);
        h.set_source("/no/such/second.mp3", 2);

        h.worker.handle(WorkerMessage::Loaded {
            load_id: 1,
            result: Ok(wav_silence(1)),
        });
        assert!(h.drain().is_empty());
        assert!(h.worker.bytes.is_none());

        h.worker.handle(WorkerMessage::Loaded {
            load_id: 2,
            result: missing_file(),
        });
        let events = h.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, 2);
        assert!(matches!(
            &events[0].event,
            MediaEvent::Error(e) if e.code == MediaErrorCode::Network
        ));
    }

    #[test]
    fn loaded_source_reports_metadata() {
        let mut h = Headless::new();
        h.set_source("/tmp/silence.wav", 3);
        h.worker.handle(WorkerMessage::Loaded {
            load_id: 3,
            result: Ok(wav_silence(1)),
        });

        let events = h.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, 3);
        assert!(matches!(events[0].event, MediaEvent::LoadedMetadata { current_time, .. } if current_time == 0.0));
    }

    #[test]
    fn play_without_output_is_not_allowed() {
        let mut h = Headless::new();
        h.set_source("/no/such/track.mp3", 1);
        assert_eq!(h.play(), Err(PlayError::NotAllowed("no device".to_string())));
    }

    #[test]
    fn play_without_source_is_not_supported() {
        let mut h = Headless::new();
        assert!(matches!(h.play(), Err(PlayError::NotSupported(_))));
    }

    #[test]
    fn play_after_failed_load_fetches_again() {
        let mut h = Headless::new();
        h.set_source("/no/such/track.mp3", 1);
        h.finish_load();
        assert_eq!(h.drain().len(), 1);
        assert!(!h.worker.loading);

        // Settles right away and starts a fresh load for the same source
        assert!(h.play().is_err());
        assert!(h.worker.loading);
        h.finish_load();

        let events = h.drain();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].source, 1);
        assert!(matches!(events[0].event, MediaEvent::Error(_)));
    }

    #[test]
    fn play_without_http_client_settles() {
        let mut h = Headless::new();
        h.worker.client = None;
        h.set_source("https://example.com/track.mp3", 1);
        assert_eq!(h.drain().len(), 1);

        assert!(matches!(h.play(), Err(PlayError::NotSupported(_))));
        assert_eq!(h.drain().len(), 1);
    }

    #[test]
    fn failed_load_rejects_pending_play() {
        let mut h = Headless::new();
        h.set_source("/no/such/track.mp3", 1);
        let mut settled = h.park_pending_play();

        h.worker.handle(WorkerMessage::Loaded {
            load_id: 1,
            result: missing_file(),
        });
        assert!(matches!(settled.try_recv(), Ok(Err(PlayError::NotSupported(_)))));
    }

    #[test]
    fn pause_and_new_source_abort_pending_play() {
        let mut h = Headless::new();
        h.set_source("/no/such/a.mp3", 1);

        let mut settled = h.park_pending_play();
        h.worker.handle(WorkerMessage::Pause);
        assert_eq!(settled.try_recv(), Ok(Err(PlayError::Aborted)));

        let mut settled = h.park_pending_play();
        h.set_source("/no/such/b.mp3", 2);
        assert_eq!(settled.try_recv(), Ok(Err(PlayError::Aborted)));
    }
}
