//! Capture session
//!
//! Owns one camera stream and at most one recording, and drives them
//! through the session state machine:
//!
//! ```text
//! Idle --open--> Ready --start_recording--> Recording --stop_recording--> Stopped
//!   ^              ^                                                        |
//!   |              +----------------------- discard ------------------------+
//!   +------------------------------- save_and_reset -------------------------+
//! ```
//!
//! `close` returns to `Idle` from anywhere.

use super::encoder::{select_format, EncoderEvent, EncoderFactory, EncodingFormat, MediaEncoder};
use super::error::{SessionError, SessionResult, ACQUISITION_FAILURE_MESSAGE};
use super::state::{Segment, SessionEvent, SessionState, SessionStatus};
use crate::capture::traits::{MediaSource, MediaStream, PreviewSink, StreamSettings};
use crate::config::SessionConfig;
use crate::export::sink::ArtifactSink;
use crate::export::types::{suggested_filename, Artifact, SavedArtifact};
use chrono::Utc;
use parking_lot::RwLock;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver};
use tokio::sync::broadcast;
use uuid::Uuid;

/// Encoder plus the segments it has delivered so far
struct ActiveRecording {
    encoder: Box<dyn MediaEncoder>,
    events: UnboundedReceiver<EncoderEvent>,
    segments: Vec<Segment>,
    format: EncodingFormat,
    started_at: Instant,
}

impl ActiveRecording {
    /// Append a delivered chunk. Empty chunks are dropped.
    fn push(&mut self, data: Vec<u8>, event_tx: &broadcast::Sender<SessionEvent>) -> bool {
        if data.is_empty() {
            tracing::debug!("Dropping empty segment");
            return false;
        }

        let index = self.segments.len();
        let bytes = data.len();
        self.segments.push(Segment { index, data });
        tracing::debug!("Segment {} received ({} bytes)", index, bytes);
        let _ = event_tx.send(SessionEvent::SegmentReceived { index, bytes });
        true
    }
}

/// Camera capture session
pub struct CaptureSession {
    /// Identifier for log correlation
    id: Uuid,

    config: SessionConfig,

    source: Arc<dyn MediaSource>,
    encoders: Arc<dyn EncoderFactory>,
    sink: Arc<dyn ArtifactSink>,
    preview: Option<Arc<dyn PreviewSink>>,

    /// Current state, shared with observers
    state: Arc<RwLock<SessionState>>,

    /// Stream held while open
    stream: Option<Box<dyn MediaStream>>,

    /// Encoder held while recording
    recording: Option<ActiveRecording>,

    /// Segments of the last stopped recording
    buffered: Vec<Segment>,
    buffered_format: Option<EncodingFormat>,
    buffered_duration: Duration,

    last_error: Option<String>,

    event_tx: broadcast::Sender<SessionEvent>,
}

impl CaptureSession {
    /// Create an idle session
    pub fn new(
        config: SessionConfig,
        source: Arc<dyn MediaSource>,
        encoders: Arc<dyn EncoderFactory>,
        sink: Arc<dyn ArtifactSink>,
    ) -> Self {
        let (event_tx, _) = broadcast::channel(100);
        Self {
            id: Uuid::new_v4(),
            config,
            source,
            encoders,
            sink,
            preview: None,
            state: Arc::new(RwLock::new(SessionState::Idle)),
            stream: None,
            recording: None,
            buffered: Vec::new(),
            buffered_format: None,
            buffered_duration: Duration::ZERO,
            last_error: None,
            event_tx,
        }
    }

    /// Bind acquired streams to a live preview
    pub fn with_preview(mut self, preview: Arc<dyn PreviewSink>) -> Self {
        self.preview = Some(preview);
        self
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Get the current session state
    pub fn state(&self) -> SessionState {
        *self.state.read()
    }

    /// Shared handle to the state, readable without borrowing the session
    pub fn state_handle(&self) -> Arc<RwLock<SessionState>> {
        Arc::clone(&self.state)
    }

    /// Subscribe to session events
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.event_tx.subscribe()
    }

    /// Segments of the last stopped recording
    pub fn buffered_segments(&self) -> &[Segment] {
        &self.buffered
    }

    pub fn buffered_bytes(&self) -> usize {
        self.buffered.iter().map(Segment::len).sum()
    }

    /// User-facing message of the last failed operation
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Settings granted for the active stream
    pub fn stream_settings(&self) -> Option<StreamSettings> {
        self.stream.as_ref().map(|stream| stream.settings())
    }

    /// Format of the running or last stopped recording
    pub fn recording_format(&self) -> Option<&EncodingFormat> {
        self.recording
            .as_ref()
            .map(|recording| &recording.format)
            .or(self.buffered_format.as_ref())
    }

    /// Elapsed time while recording, final length once stopped
    pub fn recording_duration(&self) -> Option<Duration> {
        match (&self.recording, self.state()) {
            (Some(recording), _) => Some(recording.started_at.elapsed()),
            (None, SessionState::Stopped) => Some(self.buffered_duration),
            _ => None,
        }
    }

    /// Snapshot for display
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            session_id: self.id,
            state: self.state(),
            buffered_segments: self.buffered.len(),
            buffered_bytes: self.buffered_bytes(),
            format: self.recording_format().map(ToString::to_string),
            duration_ms: self.recording_duration().map(|d| d.as_millis() as u64),
            last_error: self.last_error.clone(),
        }
    }

    fn set_state(&self, next: SessionState) {
        let previous = std::mem::replace(&mut *self.state.write(), next);
        if previous != next {
            tracing::debug!(session = %self.id, "State {} -> {}", previous, next);
            let _ = self.event_tx.send(SessionEvent::StateChanged(next));
        }
    }

    /// Log an error, remember it for display and hand it back
    fn report(&mut self, error: SessionError) -> SessionError {
        tracing::warn!(session = %self.id, "{}", error);
        let message = error.to_string();
        let _ = self.event_tx.send(SessionEvent::Error(message.clone()));
        self.last_error = Some(message);
        error
    }

    /// Acquire a stream, trying each configured profile in order.
    ///
    /// On success the stream is bound to the preview and the session is
    /// `Ready`. If every profile is rejected the session stays `Idle`.
    pub async fn open(&mut self) -> SessionResult<StreamSettings> {
        let state = self.state();
        if state != SessionState::Idle {
            return Err(self.report(SessionError::InvalidStateTransition {
                operation: "open",
                state,
            }));
        }

        self.last_error = None;
        let profiles = self.config.profiles.clone();
        tracing::info!(
            session = %self.id,
            "Opening camera with {} profile(s)",
            profiles.len()
        );

        for (attempt, profile) in profiles.iter().enumerate() {
            match self.source.acquire(profile).await {
                Ok(stream) => {
                    let settings = stream.settings();
                    tracing::info!(
                        session = %self.id,
                        "Camera '{}' granted via profile '{}' (attempt {}): {}x{} @ {}fps",
                        stream.id(),
                        profile.name,
                        attempt + 1,
                        settings.resolution.width,
                        settings.resolution.height,
                        settings.frame_rate
                    );
                    if let Some(preview) = &self.preview {
                        preview.attach(stream.as_ref());
                    }
                    self.stream = Some(stream);
                    self.set_state(SessionState::Ready);
                    return Ok(settings);
                }
                Err(e) => {
                    tracing::warn!(
                        session = %self.id,
                        "Camera profile '{}' rejected: {}",
                        profile.name,
                        e
                    );
                }
            }
        }

        Err(self.report(SessionError::AcquisitionFailure(
            ACQUISITION_FAILURE_MESSAGE.to_string(),
        )))
    }

    /// Start recording the open stream in the best supported format
    pub fn start_recording(&mut self) -> SessionResult<EncodingFormat> {
        if self.state() != SessionState::Ready {
            return Err(self.report(SessionError::NotReady));
        }

        let Some(format) =
            select_format(self.encoders.as_ref(), &self.config.format_preferences).cloned()
        else {
            return Err(self.report(SessionError::EncoderUnsupported));
        };

        let created = match self.stream.as_deref() {
            Some(stream) => {
                self.encoders
                    .create(stream, &format, self.config.video_bits_per_second)
            }
            None => return Err(self.report(SessionError::NotReady)),
        };
        let mut encoder = match created {
            Ok(encoder) => encoder,
            Err(e) => return Err(self.report(e.into())),
        };

        let (events_tx, events) = mpsc::unbounded_channel();
        if let Err(e) = encoder.start(self.config.timeslice(), events_tx) {
            encoder.abort();
            return Err(self.report(e.into()));
        }

        tracing::info!(
            session = %self.id,
            "Recording started: {} at {} bps, flushing every {}ms",
            format,
            self.config.video_bits_per_second,
            self.config.timeslice_ms
        );

        self.last_error = None;
        self.recording = Some(ActiveRecording {
            encoder,
            events,
            segments: Vec::new(),
            format: format.clone(),
            started_at: Instant::now(),
        });
        self.set_state(SessionState::Recording);
        Ok(format)
    }

    /// Move segments the encoder has already delivered into the running
    /// recording, without waiting. Returns how many were taken.
    ///
    /// If the encoder stopped by itself, the recording is finished and
    /// the session moves to `Stopped`.
    pub fn poll_segments(&mut self) -> usize {
        let Some(recording) = self.recording.as_mut() else {
            return 0;
        };

        let mut drained = 0;
        let mut ended = false;
        let mut errors = Vec::new();
        loop {
            match recording.events.try_recv() {
                Ok(EncoderEvent::Segment(data)) => {
                    if recording.push(data, &self.event_tx) {
                        drained += 1;
                    }
                }
                Ok(EncoderEvent::Error(message)) => errors.push(message),
                Ok(EncoderEvent::Stopped) | Err(TryRecvError::Disconnected) => {
                    ended = true;
                    break;
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        for message in errors {
            self.encoder_error(message);
        }
        if ended {
            if let Some(recording) = self.recording.take() {
                tracing::warn!(session = %self.id, "Encoder stopped on its own");
                self.finish_recording(recording);
            }
        }
        drained
    }

    /// Finalize the encoder and wait for its last segment.
    ///
    /// Returns the number of buffered segments. If the encoder does not
    /// finish within the configured timeout it is aborted and the
    /// segments received so far are kept.
    pub async fn stop_recording(&mut self) -> SessionResult<usize> {
        if self.state() != SessionState::Recording {
            return Err(self.report(SessionError::NotRecording));
        }
        let Some(mut recording) = self.recording.take() else {
            return Err(self.report(SessionError::NotRecording));
        };

        tracing::info!(session = %self.id, "Stopping recording");
        recording.encoder.finalize();

        let event_tx = self.event_tx.clone();
        let mut errors = Vec::new();
        let drain = async {
            while let Some(event) = recording.events.recv().await {
                match event {
                    EncoderEvent::Segment(data) => {
                        recording.push(data, &event_tx);
                    }
                    EncoderEvent::Error(message) => errors.push(message),
                    EncoderEvent::Stopped => return true,
                }
            }
            false
        };

        let outcome = tokio::time::timeout(self.config.finalize_timeout(), drain).await;
        match outcome {
            Ok(true) => {}
            Ok(false) => {
                tracing::warn!(session = %self.id, "Encoder closed without a stop event");
            }
            Err(_) => {
                tracing::warn!(
                    session = %self.id,
                    "Encoder did not finish within {}ms, aborting",
                    self.config.finalize_timeout_ms
                );
                recording.encoder.abort();
            }
        }

        for message in errors {
            self.encoder_error(message);
        }
        self.finish_recording(recording);
        Ok(self.buffered.len())
    }

    /// Non-fatal encoder problem: the recording keeps going
    fn encoder_error(&mut self, message: String) {
        tracing::warn!(session = %self.id, "Encoder error: {}", message);
        let _ = self.event_tx.send(SessionEvent::Error(message.clone()));
        self.last_error = Some(message);
    }

    fn finish_recording(&mut self, recording: ActiveRecording) {
        let ActiveRecording {
            segments,
            format,
            started_at,
            ..
        } = recording;

        self.buffered_duration = started_at.elapsed();
        self.buffered = segments;
        self.buffered_format = Some(format);

        tracing::info!(
            session = %self.id,
            "Recording stopped: {} segment(s), {} bytes, {}ms",
            self.buffered.len(),
            self.buffered_bytes(),
            self.buffered_duration.as_millis()
        );
        self.set_state(SessionState::Stopped);
    }

    /// Drop the stopped recording.
    ///
    /// Returns to `Ready` while the stream is still live, otherwise
    /// releases it and returns to `Idle`.
    pub fn discard(&mut self) -> SessionResult<SessionState> {
        let state = self.state();
        if state != SessionState::Stopped {
            return Err(self.report(SessionError::InvalidStateTransition {
                operation: "discard",
                state,
            }));
        }

        tracing::info!(
            session = %self.id,
            "Discarding {} segment(s)",
            self.buffered.len()
        );
        self.clear_buffer();

        let live = self.stream.as_ref().is_some_and(|stream| stream.is_live());
        let next = if live {
            SessionState::Ready
        } else {
            self.release_stream();
            SessionState::Idle
        };
        self.set_state(next);
        Ok(next)
    }

    /// Concatenate the stopped recording, hand it to the sink, release
    /// the stream and return to `Idle`.
    ///
    /// A sink failure leaves the session `Stopped` with its buffer intact.
    pub async fn save_and_reset(&mut self) -> SessionResult<SavedArtifact> {
        if self.buffered.is_empty() {
            return Err(self.report(SessionError::EmptyArtifact));
        }
        let state = self.state();
        if state != SessionState::Stopped {
            return Err(self.report(SessionError::InvalidStateTransition {
                operation: "save",
                state,
            }));
        }

        let format = self
            .buffered_format
            .clone()
            .unwrap_or_else(EncodingFormat::generic);
        let artifact = Artifact::from_segments(&self.buffered, &format, self.buffered_duration);
        let name = suggested_filename(&self.config.filename_prefix, format.extension(), Utc::now());

        let saved = match self.sink.save(&artifact, &name).await {
            Ok(saved) => saved,
            Err(e) => return Err(self.report(SessionError::Save(e.to_string()))),
        };

        tracing::info!(
            session = %self.id,
            "Saved {} bytes as {}",
            saved.bytes,
            saved.location
        );
        let _ = self.event_tx.send(SessionEvent::ArtifactSaved(saved.clone()));

        self.clear_buffer();
        self.release_stream();
        self.last_error = None;
        self.set_state(SessionState::Idle);
        Ok(saved)
    }

    /// Release everything and return to `Idle`.
    ///
    /// An active encoder is aborted without waiting for its final
    /// segment. Safe to call in any state, any number of times.
    pub fn close(&mut self) {
        if let Some(mut recording) = self.recording.take() {
            tracing::warn!(
                session = %self.id,
                "Closing during recording, dropping {} segment(s)",
                recording.segments.len()
            );
            recording.encoder.abort();
        }

        self.release_stream();
        self.clear_buffer();
        self.set_state(SessionState::Idle);
    }

    fn clear_buffer(&mut self) {
        self.buffered.clear();
        self.buffered_format = None;
        self.buffered_duration = Duration::ZERO;
    }

    fn release_stream(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            tracing::info!(session = %self.id, "Releasing camera '{}'", stream.id());
            stream.stop();
            if let Some(preview) = &self.preview {
                preview.detach();
            }
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.close();
    }
}
