//! Encoder seam
//!
//! A session records through a [`MediaEncoder`] created by an
//! [`EncoderFactory`]. Encoders hand segments back over an unbounded
//! channel so delivery order is preserved without locking.

use crate::capture::traits::MediaStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc::UnboundedSender;

/// Encoding format as a MIME type, e.g. `video/webm;codecs=vp9`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EncodingFormat(String);

impl EncodingFormat {
    pub fn new(mime_type: impl Into<String>) -> Self {
        Self(mime_type.into())
    }

    /// Generic WebM container with no codec pinned
    pub fn generic() -> Self {
        Self::new("video/webm")
    }

    /// VP9 → VP8 → generic container
    pub fn default_preferences() -> Vec<Self> {
        vec![
            Self::new("video/webm;codecs=vp9"),
            Self::new("video/webm;codecs=vp8"),
            Self::generic(),
        ]
    }

    /// Full MIME type including parameters
    pub fn mime_type(&self) -> &str {
        &self.0
    }

    /// MIME type without parameters
    pub fn container(&self) -> &str {
        self.0.split(';').next().unwrap_or_default().trim()
    }

    /// Value of the `codecs` parameter, if present
    pub fn codecs(&self) -> Option<&str> {
        self.0
            .split(';')
            .skip(1)
            .filter_map(|param| param.trim().strip_prefix("codecs="))
            .map(|value| value.trim_matches('"'))
            .next()
    }

    /// File extension for artifacts in this format
    pub fn extension(&self) -> &str {
        match self.container().rsplit_once('/') {
            Some((_, subtype)) if !subtype.is_empty() => subtype,
            _ => "bin",
        }
    }
}

impl fmt::Display for EncodingFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Events an encoder emits while running
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EncoderEvent {
    /// A flushed chunk of encoded data
    Segment(Vec<u8>),
    /// Encoder finished; no further events follow
    Stopped,
    /// Non-fatal encoder problem
    Error(String),
}

/// Encoder errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncoderError {
    #[error("Unsupported format: {0}")]
    Unsupported(String),

    #[error("Failed to create encoder: {0}")]
    Creation(String),

    #[error("Failed to start encoder: {0}")]
    Start(String),
}

/// A running (or ready to run) encoder bound to one stream
pub trait MediaEncoder: Send {
    /// Begin encoding, flushing a segment every `timeslice`
    fn start(
        &mut self,
        timeslice: Duration,
        events: UnboundedSender<EncoderEvent>,
    ) -> Result<(), EncoderError>;

    /// Ask for a graceful finish: one more `Segment`, then `Stopped`
    fn finalize(&mut self);

    /// Stop immediately; pending data is dropped and no events follow
    fn abort(&mut self);
}

/// Creates encoders and reports which formats it can produce
pub trait EncoderFactory: Send + Sync {
    fn is_supported(&self, format: &EncodingFormat) -> bool;

    fn create(
        &self,
        stream: &dyn MediaStream,
        format: &EncodingFormat,
        bits_per_second: u32,
    ) -> Result<Box<dyn MediaEncoder>, EncoderError>;
}

/// First format in `preferences` the factory supports
pub fn select_format<'a>(
    factory: &dyn EncoderFactory,
    preferences: &'a [EncodingFormat],
) -> Option<&'a EncodingFormat> {
    preferences.iter().find(|format| factory.is_supported(format))
}
