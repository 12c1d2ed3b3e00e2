//! Scripted collaborators for session tests

use crate::capture::traits::{
    CameraProfile, MediaSource, MediaStream, PreviewSink, SourceError, StreamSettings,
};
use crate::export::sink::ArtifactSink;
use crate::export::types::{Artifact, SaveError, SavedArtifact};
use crate::recorder::encoder::{
    EncoderError, EncoderEvent, EncoderFactory, EncodingFormat, MediaEncoder,
};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;

/// Tracks a current count and its high-water mark
#[derive(Default)]
pub struct Gauge {
    current: AtomicUsize,
    peak: AtomicUsize,
}

impl Gauge {
    fn inc(&self) {
        let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn dec(&self) {
        self.current.fetch_sub(1, Ordering::SeqCst);
    }

    pub fn current(&self) -> usize {
        self.current.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

/// Source that rejects profiles by name
#[derive(Default)]
pub struct FakeSource {
    rejected: Mutex<HashSet<String>>,
    pub requested: Mutex<Vec<String>>,
    pub streams: Arc<Gauge>,
    /// Liveness flag of every stream granted so far
    pub live: Mutex<Vec<Arc<AtomicBool>>>,
}

impl FakeSource {
    pub fn rejecting(names: &[&str]) -> Arc<Self> {
        let source = Self::default();
        source
            .rejected
            .lock()
            .extend(names.iter().map(|name| name.to_string()));
        Arc::new(source)
    }

    pub fn accepting_all() -> Arc<Self> {
        Self::rejecting(&[])
    }

    /// End every granted stream, as if the device went away
    pub fn end_streams(&self) {
        for live in self.live.lock().iter() {
            if live.swap(false, Ordering::SeqCst) {
                self.streams.dec();
            }
        }
    }
}

#[async_trait]
impl MediaSource for FakeSource {
    async fn acquire(&self, profile: &CameraProfile) -> Result<Box<dyn MediaStream>, SourceError> {
        self.requested.lock().push(profile.name.clone());
        if self.rejected.lock().contains(&profile.name) {
            return Err(SourceError::PermissionDenied(profile.name.clone()));
        }
        self.streams.inc();
        let live = Arc::new(AtomicBool::new(true));
        self.live.lock().push(Arc::clone(&live));
        Ok(Box::new(FakeStream {
            id: profile.name.clone(),
            settings: StreamSettings {
                resolution: profile.resolution,
                frame_rate: profile.frame_rate.map(|rate| rate.ideal).unwrap_or(30),
                facing: profile.facing,
                has_audio: profile.audio,
            },
            live,
            gauge: Arc::clone(&self.streams),
        }))
    }
}

pub struct FakeStream {
    id: String,
    settings: StreamSettings,
    live: Arc<AtomicBool>,
    gauge: Arc<Gauge>,
}

impl MediaStream for FakeStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn settings(&self) -> StreamSettings {
        self.settings
    }

    fn is_live(&self) -> bool {
        self.live.load(Ordering::SeqCst)
    }

    fn stop(&mut self) {
        if self.live.swap(false, Ordering::SeqCst) {
            self.gauge.dec();
        }
    }
}

impl Drop for FakeStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Shared view of the encoder a [`FakeEncoderFactory`] last created
#[derive(Default)]
pub struct EncoderProbe {
    sender: Mutex<Option<UnboundedSender<EncoderEvent>>>,
    pub finalized: AtomicBool,
    pub aborted: AtomicBool,
    pub bitrate: AtomicUsize,
    pub timeslice: Mutex<Option<Duration>>,
    pub format: Mutex<Option<EncodingFormat>>,
}

impl EncoderProbe {
    /// Deliver a segment as if the encoder flushed it
    pub fn emit(&self, data: &[u8]) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(EncoderEvent::Segment(data.to_vec()));
        }
    }

    /// Report a non-fatal encoder problem
    pub fn report_error(&self, message: &str) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(EncoderEvent::Error(message.to_string()));
        }
    }

    /// Report that the encoder stopped by itself
    pub fn stop_unprompted(&self) {
        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(EncoderEvent::Stopped);
        }
    }
}

/// How a fake encoder answers `finalize`
#[derive(Clone, Copy, PartialEq, Eq)]
pub enum FinalizeBehavior {
    /// Emit the tail segment, then `Stopped`
    Graceful,
    /// Never answer
    Hang,
}

pub struct FakeEncoderFactory {
    supported: Vec<EncodingFormat>,
    pub fail_create: AtomicBool,
    pub tail: Mutex<Vec<u8>>,
    pub on_finalize: FinalizeBehavior,
    pub probe: Arc<EncoderProbe>,
    pub encoders: Arc<Gauge>,
}

impl FakeEncoderFactory {
    pub fn supporting(formats: &[&str]) -> Self {
        Self {
            supported: formats.iter().map(|f| EncodingFormat::new(*f)).collect(),
            fail_create: AtomicBool::new(false),
            tail: Mutex::new(b"tail".to_vec()),
            on_finalize: FinalizeBehavior::Graceful,
            probe: Arc::new(EncoderProbe::default()),
            encoders: Arc::new(Gauge::default()),
        }
    }

    pub fn all() -> Self {
        Self::supporting(&["video/webm;codecs=vp9", "video/webm;codecs=vp8", "video/webm"])
    }
}

impl EncoderFactory for FakeEncoderFactory {
    fn is_supported(&self, format: &EncodingFormat) -> bool {
        self.supported.contains(format)
    }

    fn create(
        &self,
        _stream: &dyn MediaStream,
        format: &EncodingFormat,
        bits_per_second: u32,
    ) -> Result<Box<dyn MediaEncoder>, EncoderError> {
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(EncoderError::Creation("scripted failure".to_string()));
        }
        self.encoders.inc();
        self.probe.bitrate.store(bits_per_second as usize, Ordering::SeqCst);
        *self.probe.format.lock() = Some(format.clone());
        self.probe.finalized.store(false, Ordering::SeqCst);
        self.probe.aborted.store(false, Ordering::SeqCst);
        Ok(Box::new(FakeEncoder {
            tail: self.tail.lock().clone(),
            on_finalize: self.on_finalize,
            probe: Arc::clone(&self.probe),
            gauge: Arc::clone(&self.encoders),
        }))
    }
}

pub struct FakeEncoder {
    tail: Vec<u8>,
    on_finalize: FinalizeBehavior,
    probe: Arc<EncoderProbe>,
    gauge: Arc<Gauge>,
}

impl MediaEncoder for FakeEncoder {
    fn start(
        &mut self,
        timeslice: Duration,
        events: UnboundedSender<EncoderEvent>,
    ) -> Result<(), EncoderError> {
        *self.probe.timeslice.lock() = Some(timeslice);
        *self.probe.sender.lock() = Some(events);
        Ok(())
    }

    fn finalize(&mut self) {
        self.probe.finalized.store(true, Ordering::SeqCst);
        if self.on_finalize == FinalizeBehavior::Graceful {
            if let Some(sender) = self.probe.sender.lock().take() {
                let _ = sender.send(EncoderEvent::Segment(self.tail.clone()));
                let _ = sender.send(EncoderEvent::Stopped);
            }
        }
    }

    fn abort(&mut self) {
        self.probe.aborted.store(true, Ordering::SeqCst);
        self.probe.sender.lock().take();
    }
}

impl Drop for FakeEncoder {
    fn drop(&mut self) {
        self.gauge.dec();
    }
}

/// Sink that keeps artifacts in memory
#[derive(Default)]
pub struct MemorySink {
    pub saved: Mutex<Vec<(String, Artifact)>>,
    pub fail: AtomicBool,
}

#[async_trait]
impl ArtifactSink for MemorySink {
    async fn save(
        &self,
        artifact: &Artifact,
        suggested_name: &str,
    ) -> Result<SavedArtifact, SaveError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(SaveError::Rejected("disk full".to_string()));
        }
        self.saved
            .lock()
            .push((suggested_name.to_string(), artifact.clone()));
        Ok(SavedArtifact {
            location: format!("memory://{suggested_name}"),
            bytes: artifact.len(),
        })
    }
}

/// Records attach/detach calls
#[derive(Default)]
pub struct FakePreview {
    pub attached: Mutex<Option<String>>,
    pub detach_calls: AtomicUsize,
}

impl PreviewSink for FakePreview {
    fn attach(&self, stream: &dyn MediaStream) {
        *self.attached.lock() = Some(stream.id().to_string());
    }

    fn detach(&self) {
        *self.attached.lock() = None;
        self.detach_calls.fetch_add(1, Ordering::SeqCst);
    }
}
