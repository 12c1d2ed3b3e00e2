//! camcorder - camera capture sessions.
//!
//! This is the main library crate. It provides the capture session state
//! machine, the collaborator seams it records through, and a synthetic
//! camera for running without hardware.

pub mod capture;
pub mod commands;
pub mod config;
pub mod export;
pub mod recorder;
pub mod utils;

#[cfg(test)]
mod testing;

use capture::{FacingMode, SyntheticEncoderFactory, SyntheticSource};
use export::DirectorySink;
use recorder::CaptureSession;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Config file read by [`run`] when present
pub const CONFIG_FILE: &str = "camcorder.json";

/// Directory [`run`] saves recordings into
pub const RECORDINGS_DIR: &str = "recordings";

/// Initialize tracing/logging
pub fn init_tracing() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "camcorder=debug,camcorder_lib=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

/// Record a short clip from the synthetic camera.
///
/// The synthetic camera only has a front lens, so opening exercises the
/// fallback profile.
pub async fn run() -> anyhow::Result<()> {
    init_tracing();

    tracing::info!("Starting camcorder v{}", env!("CARGO_PKG_VERSION"));

    let config = config::load_or_default(Path::new(CONFIG_FILE))?;
    let clip_length = config.timeslice() * 3 + Duration::from_millis(500);

    let source = Arc::new(SyntheticSource::new([FacingMode::User]));
    let sink = Arc::new(DirectorySink::new(RECORDINGS_DIR));
    tracing::info!("Saving recordings under {:?}", sink.dir());
    let mut session = CaptureSession::new(
        config,
        source,
        Arc::new(SyntheticEncoderFactory::default()),
        sink,
    );

    let settings = session.open().await?;
    tracing::info!(
        "Previewing {}x{} from the {} camera",
        settings.resolution.width,
        settings.resolution.height,
        settings.facing
    );

    let format = session.start_recording()?;
    tracing::info!("Recording {} for {}ms", format, clip_length.as_millis());
    tokio::time::sleep(clip_length).await;

    let segments = session.stop_recording().await?;
    let saved = session.save_and_reset().await?;
    tracing::info!(
        "Wrote {} segment(s), {} bytes to {}",
        segments,
        saved.bytes,
        saved.location
    );

    session.close();
    Ok(())
}
