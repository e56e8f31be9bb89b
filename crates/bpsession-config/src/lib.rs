//! Settings document parsing for bpsession
//!
//! Supports a JSON settings document with:
//! - Loosely-typed on/off values (`true`, `"on"`, `"yes"`, ...)
//! - Normalization into a strict [`LaunchConfig`] at load time
//! - Validation with clear error messages

mod schema;
mod settings;
mod validation;

pub use schema::*;
pub use settings::*;
pub use validation::*;

use serde::Deserialize;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

/// Settings errors
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse JSON: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Validation failed: {errors:?}")]
    ValidationFailed { errors: Vec<ValidationError> },
}

pub type SettingsResult<T> = Result<T, SettingsError>;

/// Load and normalize settings from a JSON file.
///
/// A missing file is not an error: the session starts with defaults.
pub fn load_settings(path: impl AsRef<Path>) -> SettingsResult<LaunchConfig> {
    let path = path.as_ref();
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            info!(path = %path.display(), "No settings file, using defaults");
            return Ok(LaunchConfig::default());
        }
        Err(e) => return Err(e.into()),
    };
    parse_settings(&content)
}

/// Parse and normalize settings from a JSON string
pub fn parse_settings(content: &str) -> SettingsResult<LaunchConfig> {
    let document: serde_json::Value = serde_json::from_str(content)?;
    if !document.is_object() {
        return Err(SettingsError::ParseError(serde::de::Error::custom(
            "settings document must be a JSON object",
        )));
    }
    let raw = RawSettings::deserialize(document)?;

    let errors = validate_settings(&raw);
    if !errors.is_empty() {
        return Err(SettingsError::ValidationFailed { errors });
    }

    let config = LaunchConfig::from_raw(&raw);
    debug!(?config, "Settings resolved");
    Ok(config)
}
