//! Capture trait definitions
//!
//! Platform-agnostic traits for camera sources and preview sinks, plus the
//! capability requests a session hands to its source.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Which camera a profile asks for
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FacingMode {
    /// Front camera, facing the user
    User,
    /// Rear camera, facing away from the user
    Environment,
}

impl std::fmt::Display for FacingMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FacingMode::User => write!(f, "user"),
            FacingMode::Environment => write!(f, "environment"),
        }
    }
}

/// Video resolution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

/// Frame rate request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameRate {
    /// Preferred rate in frames per second
    pub ideal: u32,

    /// Hard upper bound, if any
    #[serde(default)]
    pub max: Option<u32>,
}

/// One capability request handed to a [`MediaSource`].
///
/// Resolution and frame rate are hints: a source may grant something
/// different and report it through [`StreamSettings`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CameraProfile {
    /// Label used in logs
    pub name: String,

    /// Ideal resolution
    pub resolution: Resolution,

    /// Frame rate request (source default when absent)
    #[serde(default)]
    pub frame_rate: Option<FrameRate>,

    /// Camera to use
    pub facing: FacingMode,

    /// Whether to include an audio track
    #[serde(default)]
    pub audio: bool,
}

impl CameraProfile {
    /// Full HD rear camera at up to 60fps, no audio
    pub fn high_res() -> Self {
        Self {
            name: "high-res".to_string(),
            resolution: Resolution {
                width: 1920,
                height: 1080,
            },
            frame_rate: Some(FrameRate {
                ideal: 60,
                max: Some(60),
            }),
            facing: FacingMode::Environment,
            audio: false,
        }
    }

    /// HD front camera with audio
    pub fn fallback_hd() -> Self {
        Self {
            name: "fallback-hd".to_string(),
            resolution: Resolution {
                width: 1280,
                height: 720,
            },
            frame_rate: None,
            facing: FacingMode::User,
            audio: true,
        }
    }

    /// Primary then fallback
    pub fn default_chain() -> Vec<Self> {
        vec![Self::high_res(), Self::fallback_hd()]
    }
}

/// Settings a source actually granted for a stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreamSettings {
    pub resolution: Resolution,
    pub frame_rate: u32,
    pub facing: FacingMode,
    pub has_audio: bool,
}

/// Reasons a source refuses a profile
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SourceError {
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("No camera satisfies the request: {0}")]
    Unsatisfiable(String),
}

/// A live audio/video stream granted by a [`MediaSource`]
pub trait MediaStream: Send + Sync {
    /// Identifier for logs
    fn id(&self) -> &str;

    /// What the source actually granted
    fn settings(&self) -> StreamSettings;

    /// False once every track has ended
    fn is_live(&self) -> bool;

    /// Stop every track. Calling this on a stopped stream does nothing.
    fn stop(&mut self);
}

/// Grants streams for capability requests
#[async_trait]
pub trait MediaSource: Send + Sync {
    async fn acquire(&self, profile: &CameraProfile) -> Result<Box<dyn MediaStream>, SourceError>;
}

/// Live preview target for an acquired stream
pub trait PreviewSink: Send + Sync {
    /// Bind the stream for display
    fn attach(&self, stream: &dyn MediaStream);

    /// Unbind whatever is displayed
    fn detach(&self);
}
