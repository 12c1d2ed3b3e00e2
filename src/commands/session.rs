//! Capture session commands
//!
//! The command surface a UI invokes. Each command locks the shared
//! session for its whole duration, so commands never overlap.

use crate::capture::traits::StreamSettings;
use crate::export::types::SavedArtifact;
use crate::recorder::state::SessionStatus;
use crate::recorder::CaptureSession;
use crate::utils::error::ErrorResponse;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Application state for the capture modal
#[derive(Clone)]
pub struct CaptureState {
    pub session: Arc<Mutex<CaptureSession>>,
}

impl CaptureState {
    pub fn new(session: CaptureSession) -> Self {
        Self {
            session: Arc::new(Mutex::new(session)),
        }
    }
}

/// Open the camera
pub async fn open_camera(state: &CaptureState) -> Result<StreamSettings, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.open().await.map_err(Into::into)
}

/// Start recording; returns the chosen MIME type
pub async fn start_recording(state: &CaptureState) -> Result<String, ErrorResponse> {
    let mut session = state.session.lock().await;
    session
        .start_recording()
        .map(|format| format.to_string())
        .map_err(Into::into)
}

/// Stop recording and wait for the last segment
pub async fn stop_recording(state: &CaptureState) -> Result<SessionStatus, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.stop_recording().await?;
    Ok(session.status())
}

/// Throw away the stopped recording
pub async fn discard_recording(state: &CaptureState) -> Result<SessionStatus, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.discard()?;
    Ok(session.status())
}

/// Save the stopped recording and release the camera
pub async fn save_recording(state: &CaptureState) -> Result<SavedArtifact, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.save_and_reset().await.map_err(Into::into)
}

/// Close the modal, releasing everything
pub async fn close_camera(state: &CaptureState) -> Result<(), ErrorResponse> {
    let mut session = state.session.lock().await;
    session.close();
    Ok(())
}

/// Get the current session status
pub async fn get_session_status(state: &CaptureState) -> Result<SessionStatus, ErrorResponse> {
    let mut session = state.session.lock().await;
    session.poll_segments();
    Ok(session.status())
}
