//! Artifact types
//!
//! This module defines the finished recording handed to a save sink and
//! the errors a sink can report.

use crate::recorder::encoder::EncodingFormat;
use crate::recorder::state::Segment;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// A finished recording: every segment concatenated in delivery order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    /// Concatenated segment bytes
    pub data: Vec<u8>,

    /// Container MIME type (codec parameters stripped)
    pub mime_type: String,

    /// File extension matching the container
    pub extension: String,

    /// Number of segments that went into the artifact
    pub segment_count: usize,

    /// Recording duration
    pub duration: Duration,
}

impl Artifact {
    /// Concatenate segments into one artifact
    pub fn from_segments(segments: &[Segment], format: &EncodingFormat, duration: Duration) -> Self {
        let total: usize = segments.iter().map(Segment::len).sum();
        let mut data = Vec::with_capacity(total);
        for segment in segments {
            data.extend_from_slice(&segment.data);
        }

        Self {
            data,
            mime_type: format.container().to_string(),
            extension: format.extension().to_string(),
            segment_count: segments.len(),
            duration,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Where a sink put an artifact
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedArtifact {
    /// Sink-specific location (a file path for directory sinks)
    pub location: String,

    /// Bytes written
    pub bytes: usize,
}

/// Save errors
#[derive(Error, Debug)]
pub enum SaveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid file name: {0}")]
    InvalidName(String),

    #[error("Rejected by sink: {0}")]
    Rejected(String),
}

/// Suggested file name: `<prefix>_<unix millis>.<extension>`
pub fn suggested_filename(prefix: &str, extension: &str, at: DateTime<Utc>) -> String {
    format!("{}_{}.{}", prefix, at.timestamp_millis(), extension)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn segment(index: usize, data: &[u8]) -> Segment {
        Segment {
            index,
            data: data.to_vec(),
        }
    }

    #[test]
    fn test_artifact_concatenates_in_order() {
        let segments = vec![segment(0, b"ab"), segment(1, b"cd"), segment(2, b"e")];
        let format = EncodingFormat::new("video/webm;codecs=vp8");
        let artifact = Artifact::from_segments(&segments, &format, Duration::from_secs(5));

        assert_eq!(artifact.data, b"abcde");
        assert_eq!(artifact.segment_count, 3);
        assert_eq!(artifact.mime_type, "video/webm");
        assert_eq!(artifact.extension, "webm");
        assert_eq!(artifact.len(), 5);
    }

    #[test]
    fn test_suggested_filename() {
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        assert_eq!(suggested_filename("video", "webm", at), "video_1700000000123.webm");
    }
}
