//! Recording system module
//!
//! This module implements the capture session:
//! - MediaEncoder/EncoderFactory seam and format selection
//! - CaptureSession state machine owning stream, encoder and segment buffer
//! - Session errors, events and status snapshots

pub mod encoder;
pub mod error;
pub mod session;
pub mod state;

pub use encoder::{EncoderError, EncoderEvent, EncoderFactory, EncodingFormat, MediaEncoder};
pub use error::{SessionError, SessionResult};
pub use session::CaptureSession;
pub use state::{Segment, SessionEvent, SessionState, SessionStatus};
