//! Session configuration
//!
//! Profile chain, format preferences, bitrate and flush interval, loaded
//! from JSON.

pub mod file;
pub mod schema;

pub use file::{load_or_default, read_config, write_config, ConfigError};
pub use schema::SessionConfig;
