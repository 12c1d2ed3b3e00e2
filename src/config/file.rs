//! Config file read/write operations
//!
//! Session configuration is stored as pretty-printed JSON.

use super::schema::SessionConfig;
use std::fs;
use std::path::Path;
use thiserror::Error;

/// Config-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),

    #[error("Missing config file: {0}")]
    MissingFile(String),
}

/// Read and validate a config file
pub fn read_config(path: &Path) -> Result<SessionConfig, ConfigError> {
    if !path.is_file() {
        return Err(ConfigError::MissingFile(path.to_string_lossy().to_string()));
    }

    let content = fs::read_to_string(path)?;
    let config: SessionConfig = serde_json::from_str(&content)?;
    config.validate().map_err(ConfigError::Invalid)?;

    tracing::debug!(
        "Loaded config from {:?}: {} profile(s), {} format(s)",
        path,
        config.profiles.len(),
        config.format_preferences.len()
    );

    Ok(config)
}

/// Read a config file, falling back to defaults when it does not exist
pub fn load_or_default(path: &Path) -> Result<SessionConfig, ConfigError> {
    match read_config(path) {
        Err(ConfigError::MissingFile(_)) => {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(SessionConfig::default())
        }
        other => other,
    }
}

/// Validate and write a config file, creating parent directories
pub fn write_config(config: &SessionConfig, path: &Path) -> Result<(), ConfigError> {
    config.validate().map_err(ConfigError::Invalid)?;

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let content = serde_json::to_string_pretty(config)?;
    fs::write(path, content)?;

    tracing::debug!("Saved config to {:?}", path);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_write_and_read_config() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("settings").join("camcorder.json");

        let mut config = SessionConfig::default();
        config.timeslice_ms = 1000;
        config.filename_prefix = "clip".to_string();

        write_config(&config, &path).unwrap();
        let loaded = read_config(&path).unwrap();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.json");

        assert!(matches!(read_config(&path), Err(ConfigError::MissingFile(_))));
        assert_eq!(load_or_default(&path).unwrap(), SessionConfig::default());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        fs::write(&path, r#"{"profiles": []}"#).unwrap();

        assert!(matches!(read_config(&path), Err(ConfigError::Invalid(_))));
        assert!(matches!(load_or_default(&path), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_malformed_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "{ not json").unwrap();

        assert!(matches!(read_config(&path), Err(ConfigError::Json(_))));
    }
}
