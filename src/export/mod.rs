//! Artifact export
//!
//! This module turns buffered segments into a single artifact and hands
//! it to a sink for saving.

pub mod sink;
pub mod types;

pub use sink::{ArtifactSink, DirectorySink};
pub use types::{suggested_filename, Artifact, SaveError, SavedArtifact};
