//! Camera capture sources
//!
//! This module defines the source/stream/preview seams a capture session
//! depends on, and a synthetic camera usable without hardware.

pub mod synthetic;
pub mod traits;

// Re-export traits
pub use traits::{
    CameraProfile, FacingMode, FrameRate, MediaSource, MediaStream, PreviewSink, Resolution,
    SourceError, StreamSettings,
};

pub use synthetic::{SyntheticEncoderFactory, SyntheticSource};
