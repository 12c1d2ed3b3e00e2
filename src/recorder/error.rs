//! Session errors

use super::encoder::EncoderError;
use super::state::SessionState;
use thiserror::Error;

/// Shown to the user when no camera profile could be acquired
pub const ACQUISITION_FAILURE_MESSAGE: &str =
    "Could not access the camera. Check the permissions.";

/// Errors reported by [`CaptureSession`](super::CaptureSession) operations.
///
/// None of these alter the session state except where an operation
/// documents otherwise.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// Every configured camera profile was rejected
    #[error("{0}")]
    AcquisitionFailure(String),

    /// No format in the preference list is supported
    #[error("No supported recording format")]
    EncoderUnsupported,

    #[error("Encoder error: {0}")]
    Encoder(#[from] EncoderError),

    #[error("Camera is not ready")]
    NotReady,

    #[error("Not recording")]
    NotRecording,

    #[error("Cannot {operation} while {state}")]
    InvalidStateTransition {
        operation: &'static str,
        state: SessionState,
    },

    #[error("No recorded video to save")]
    EmptyArtifact,

    #[error("Failed to save recording: {0}")]
    Save(String),
}

impl SessionError {
    /// Stable code for presentation layers
    pub fn code(&self) -> &'static str {
        match self {
            SessionError::AcquisitionFailure(_) => "ACQUISITION_FAILURE",
            SessionError::EncoderUnsupported => "ENCODER_UNSUPPORTED",
            SessionError::Encoder(_) => "ENCODER_ERROR",
            SessionError::NotReady => "NOT_READY",
            SessionError::NotRecording => "NOT_RECORDING",
            SessionError::InvalidStateTransition { .. } => "INVALID_STATE_TRANSITION",
            SessionError::EmptyArtifact => "EMPTY_ARTIFACT",
            SessionError::Save(_) => "SAVE_ERROR",
        }
    }

    /// Operation invoked outside its required state
    pub fn is_invalid_transition(&self) -> bool {
        matches!(
            self,
            SessionError::NotReady
                | SessionError::NotRecording
                | SessionError::InvalidStateTransition { .. }
        )
    }
}

pub type SessionResult<T> = Result<T, SessionError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_transition_family() {
        assert!(SessionError::NotReady.is_invalid_transition());
        assert!(SessionError::NotRecording.is_invalid_transition());
        assert!(SessionError::InvalidStateTransition {
            operation: "discard",
            state: SessionState::Ready,
        }
        .is_invalid_transition());
        assert!(!SessionError::EmptyArtifact.is_invalid_transition());
    }

    #[test]
    fn test_messages() {
        let err = SessionError::InvalidStateTransition {
            operation: "open",
            state: SessionState::Recording,
        };
        assert_eq!(err.to_string(), "Cannot open while recording");
        assert_eq!(
            SessionError::AcquisitionFailure(ACQUISITION_FAILURE_MESSAGE.to_string()).to_string(),
            ACQUISITION_FAILURE_MESSAGE
        );
    }
}
