//! Session configuration schema
//!
//! Every field has a default, so a partial JSON file only overrides what
//! it names.

use crate::capture::traits::CameraProfile;
use crate::recorder::encoder::EncodingFormat;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a capture session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// Camera profiles, tried in order until one is granted
    #[serde(default = "default_profiles")]
    pub profiles: Vec<CameraProfile>,

    /// Recording formats, most preferred first
    #[serde(default = "default_format_preferences")]
    pub format_preferences: Vec<EncodingFormat>,

    /// Target video bitrate
    #[serde(default = "default_video_bits_per_second")]
    pub video_bits_per_second: u32,

    /// Segment flush interval in milliseconds
    #[serde(default = "default_timeslice_ms")]
    pub timeslice_ms: u64,

    /// How long `stop_recording` waits for the encoder before aborting it
    #[serde(default = "default_finalize_timeout_ms")]
    pub finalize_timeout_ms: u64,

    /// Prefix of suggested artifact file names
    #[serde(default = "default_filename_prefix")]
    pub filename_prefix: String,
}

fn default_profiles() -> Vec<CameraProfile> {
    CameraProfile::default_chain()
}

fn default_format_preferences() -> Vec<EncodingFormat> {
    EncodingFormat::default_preferences()
}

fn default_video_bits_per_second() -> u32 {
    8_000_000
}

fn default_timeslice_ms() -> u64 {
    2000
}

fn default_finalize_timeout_ms() -> u64 {
    5000
}

fn default_filename_prefix() -> String {
    "video".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            profiles: default_profiles(),
            format_preferences: default_format_preferences(),
            video_bits_per_second: default_video_bits_per_second(),
            timeslice_ms: default_timeslice_ms(),
            finalize_timeout_ms: default_finalize_timeout_ms(),
            filename_prefix: default_filename_prefix(),
        }
    }
}

impl SessionConfig {
    pub fn timeslice(&self) -> Duration {
        Duration::from_millis(self.timeslice_ms)
    }

    pub fn finalize_timeout(&self) -> Duration {
        Duration::from_millis(self.finalize_timeout_ms)
    }

    /// Check the values a session cannot run without.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self) -> Result<(), String> {
        if self.profiles.is_empty() {
            return Err("at least one camera profile is required".to_string());
        }
        if self.format_preferences.is_empty() {
            return Err("at least one recording format is required".to_string());
        }
        if self.video_bits_per_second == 0 {
            return Err("videoBitsPerSecond must be greater than zero".to_string());
        }
        if self.timeslice_ms == 0 {
            return Err("timesliceMs must be greater than zero".to_string());
        }
        if self.finalize_timeout_ms == 0 {
            return Err("finalizeTimeoutMs must be greater than zero".to_string());
        }
        let bad_prefix = self.filename_prefix.is_empty()
            || self.filename_prefix.contains(|c: char| c == '/' || c == '\\');
        if bad_prefix {
            return Err(format!("invalid filenamePrefix {:?}", self.filename_prefix));
        }
        Ok(())
    }
}
