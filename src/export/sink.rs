//! Artifact sinks
//!
//! A sink receives one finished artifact and a suggested file name.

use super::types::{Artifact, SaveError, SavedArtifact};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Accepts finished recordings
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn save(&self, artifact: &Artifact, suggested_name: &str)
        -> Result<SavedArtifact, SaveError>;
}

/// Writes artifacts as files in a directory
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    /// The directory is created on first save if missing
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

/// Reject names that would escape the target directory
fn validate_name(name: &str) -> Result<&str, SaveError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(|c: char| matches!(c, '/' | '\\' | '\0'));
    if bad {
        return Err(SaveError::InvalidName(name.to_string()));
    }
    Ok(name)
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn save(
        &self,
        artifact: &Artifact,
        suggested_name: &str,
    ) -> Result<SavedArtifact, SaveError> {
        let name = validate_name(suggested_name)?;

        tokio::fs::create_dir_all(&self.dir).await?;
        let path = self.dir.join(name);
        tokio::fs::write(&path, &artifact.data).await?;

        tracing::info!(
            "Saved {} ({} bytes, {} segments) to {:?}",
            artifact.mime_type,
            artifact.len(),
            artifact.segment_count,
            path
        );

        Ok(SavedArtifact {
            location: path.to_string_lossy().to_string(),
            bytes: artifact.len(),
        })
    }
}
