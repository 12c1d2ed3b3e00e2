//! Capture session state
//!
//! Defines the session state machine, buffered segments and the status
//! snapshot handed to presentation layers.

use crate::export::types::SavedArtifact;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Current state of a capture session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    /// No stream held
    Idle,
    /// Stream acquired, not recording
    Ready,
    /// Encoder running
    Recording,
    /// Encoder finished, segments buffered
    Stopped,
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Idle
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionState::Idle => "idle",
            SessionState::Ready => "ready",
            SessionState::Recording => "recording",
            SessionState::Stopped => "stopped",
        };
        f.write_str(name)
    }
}

/// One flushed chunk of encoded data
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Position within its recording, starting at 0
    pub index: usize,

    /// Encoded bytes
    pub data: Vec<u8>,
}

impl Segment {
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Events emitted by a session
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// State machine moved
    StateChanged(SessionState),
    /// Encoder delivered a segment
    SegmentReceived { index: usize, bytes: usize },
    /// Artifact handed to the sink
    ArtifactSaved(SavedArtifact),
    /// User-facing error message
    Error(String),
}

/// Snapshot of a session for display
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatus {
    /// Session identifier used in logs
    pub session_id: Uuid,

    pub state: SessionState,

    /// Segments waiting to be saved or discarded
    pub buffered_segments: usize,

    /// Total bytes waiting to be saved or discarded
    pub buffered_bytes: usize,

    /// Format of the current or last recording
    pub format: Option<String>,

    /// Elapsed (recording) or final (stopped) duration in milliseconds
    pub duration_ms: Option<u64>,

    /// Message of the last failed operation
    pub last_error: Option<String>,
}
