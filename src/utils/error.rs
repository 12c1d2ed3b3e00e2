//! Error types and handling
//!
//! Common error types used across the application.

use crate::config::ConfigError;
use crate::recorder::error::SessionError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("{0}")]
    Session(#[from] SessionError),
}

/// Error response for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
}

impl From<AppError> for ErrorResponse {
    fn from(error: AppError) -> Self {
        let code = match &error {
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::Session(inner) => inner.code(),
        };

        ErrorResponse {
            code: code.to_string(),
            message: error.to_string(),
        }
    }
}

impl From<SessionError> for ErrorResponse {
    fn from(error: SessionError) -> Self {
        AppError::from(error).into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_errors_keep_their_code() {
        let response = ErrorResponse::from(SessionError::EmptyArtifact);
        assert_eq!(response.code, "EMPTY_ARTIFACT");
        assert_eq!(response.message, "No recorded video to save");
    }

    #[test]
    fn test_config_error_code() {
        let response = ErrorResponse::from(AppError::from(ConfigError::Invalid("x".into())));
        assert_eq!(response.code, "CONFIG_ERROR");
        assert_eq!(response.message, "Config error: Invalid config: x");
    }
}
