//! Synthetic camera and encoder
//!
//! A software stand-in for a camera: the source grants streams for the
//! facing modes it was built with, and the encoder emits one filler
//! segment per flush interval from a tokio task. Used for demos and for
//! exercising sessions without hardware.

use super::traits::{
    CameraProfile, FacingMode, MediaSource, MediaStream, SourceError, StreamSettings,
};
use crate::recorder::encoder::{
    EncoderError, EncoderEvent, EncoderFactory, EncodingFormat, MediaEncoder,
};
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc::UnboundedSender, oneshot};
use tokio::task::JoinHandle;

/// Frame rate granted when a profile does not ask for one
const DEFAULT_FRAME_RATE: u32 = 30;

/// Upper bound on a single synthetic segment
const MAX_SEGMENT_BYTES: usize = 64 * 1024;

/// Synthetic camera source
pub struct SyntheticSource {
    cameras: Vec<FacingMode>,
    live_streams: Arc<AtomicUsize>,
    next_id: AtomicU64,
}

impl SyntheticSource {
    /// Source with one camera per listed facing mode
    pub fn new(cameras: impl IntoIterator<Item = FacingMode>) -> Self {
        Self {
            cameras: cameras.into_iter().collect(),
            live_streams: Arc::new(AtomicUsize::new(0)),
            next_id: AtomicU64::new(0),
        }
    }

    /// Streams granted and not yet stopped
    pub fn live_streams(&self) -> usize {
        self.live_streams.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaSource for SyntheticSource {
    async fn acquire(&self, profile: &CameraProfile) -> Result<Box<dyn MediaStream>, SourceError> {
        if !self.cameras.contains(&profile.facing) {
            return Err(SourceError::Unsatisfiable(format!(
                "no {} camera",
                profile.facing
            )));
        }

        let frame_rate = profile
            .frame_rate
            .map(|rate| rate.max.map_or(rate.ideal, |max| rate.ideal.min(max)))
            .unwrap_or(DEFAULT_FRAME_RATE);

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.live_streams.fetch_add(1, Ordering::SeqCst);

        tracing::debug!(
            "Synthetic {} camera granted {}x{} @ {}fps",
            profile.facing,
            profile.resolution.width,
            profile.resolution.height,
            frame_rate
        );

        Ok(Box::new(SyntheticStream {
            id: format!("synthetic-{}-{id}", profile.facing),
            settings: StreamSettings {
                resolution: profile.resolution,
                frame_rate,
                facing: profile.facing,
                has_audio: profile.audio,
            },
            live: true,
            live_streams: Arc::clone(&self.live_streams),
        }))
    }
}

/// Stream handed out by [`SyntheticSource`]
pub struct SyntheticStream {
    id: String,
    settings: StreamSettings,
    live: bool,
    live_streams: Arc<AtomicUsize>,
}

impl MediaStream for SyntheticStream {
    fn id(&self) -> &str {
        &self.id
    }

    fn settings(&self) -> StreamSettings {
        self.settings
    }

    fn is_live(&self) -> bool {
        self.live
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.live_streams.fetch_sub(1, Ordering::SeqCst);
        }
    }
}

impl Drop for SyntheticStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Creates [`SyntheticEncoder`]s for a fixed set of formats
pub struct SyntheticEncoderFactory {
    supported: Vec<EncodingFormat>,
}

impl SyntheticEncoderFactory {
    pub fn new(supported: Vec<EncodingFormat>) -> Self {
        Self { supported }
    }
}

impl Default for SyntheticEncoderFactory {
    fn default() -> Self {
        Self::new(EncodingFormat::default_preferences())
    }
}

impl EncoderFactory for SyntheticEncoderFactory {
    fn is_supported(&self, format: &EncodingFormat) -> bool {
        self.supported.contains(format)
    }

    fn create(
        &self,
        stream: &dyn MediaStream,
        format: &EncodingFormat,
        bits_per_second: u32,
    ) -> Result<Box<dyn MediaEncoder>, EncoderError> {
        if !self.is_supported(format) {
            return Err(EncoderError::Unsupported(format.to_string()));
        }
        if !stream.is_live() {
            return Err(EncoderError::Creation(format!("stream {} has ended", stream.id())));
        }

        Ok(Box::new(SyntheticEncoder {
            bytes_per_second: u64::from(bits_per_second / 8),
            stop_tx: None,
            task: None,
        }))
    }
}

/// Encoder that emits filler bytes sized by bitrate and elapsed time
pub struct SyntheticEncoder {
    bytes_per_second: u64,
    stop_tx: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

fn filler(sequence: u64, elapsed: Duration, bytes_per_second: u64) -> Vec<u8> {
    let len = (bytes_per_second as f64 * elapsed.as_secs_f64()) as usize;
    vec![(sequence % 251) as u8; len.min(MAX_SEGMENT_BYTES)]
}

impl MediaEncoder for SyntheticEncoder {
    fn start(
        &mut self,
        timeslice: Duration,
        events: UnboundedSender<EncoderEvent>,
    ) -> Result<(), EncoderError> {
        if self.task.is_some() {
            return Err(EncoderError::Start("already started".to_string()));
        }
        if timeslice.is_zero() {
            return Err(EncoderError::Start("flush interval must be non-zero".to_string()));
        }
        let runtime = tokio::runtime::Handle::try_current()
            .map_err(|e| EncoderError::Start(format!("no async runtime: {e}")))?;

        let (stop_tx, mut stop_rx) = oneshot::channel();
        let bytes_per_second = self.bytes_per_second;

        let task = runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(
                tokio::time::Instant::now() + timeslice,
                timeslice,
            );
            let mut last_flush = Instant::now();
            let mut sequence = 0u64;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let chunk = filler(sequence, last_flush.elapsed(), bytes_per_second);
                        last_flush = Instant::now();
                        sequence += 1;
                        if events.send(EncoderEvent::Segment(chunk)).is_err() {
                            break;
                        }
                    }
                    _ = &mut stop_rx => {
                        // Final partial segment, possibly empty
                        let chunk = filler(sequence, last_flush.elapsed(), bytes_per_second);
                        let _ = events.send(EncoderEvent::Segment(chunk));
                        let _ = events.send(EncoderEvent::Stopped);
                        break;
                    }
                }
            }
        });

        self.stop_tx = Some(stop_tx);
        self.task = Some(task);
        Ok(())
    }

    fn finalize(&mut self) {
        if let Some(stop_tx) = self.stop_tx.take() {
            let _ = stop_tx.send(());
        }
    }

    fn abort(&mut self) {
        self.stop_tx = None;
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

impl Drop for SyntheticEncoder {
    fn drop(&mut self) {
        // A finalized task finishes on its own; anything else is cancelled
        if self.stop_tx.is_some() {
            self.abort();
        }
    }
}
