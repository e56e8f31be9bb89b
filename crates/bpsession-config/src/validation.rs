//! Settings validation and truthiness normalization

use crate::schema::RawSettings;
use serde_json::Value;
use thiserror::Error;

/// Validation error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Setting '{key}': cannot interpret {value} as on/off")]
    NotAToggle { key: String, value: String },
}

/// Normalize a loosely-typed settings value into a strict boolean.
///
/// | Value                                                         | Result        |
/// |---------------------------------------------------------------|---------------|
/// | `true`, `"true"`, `"on"`, `"yes"`, `"1"`, `"enabled"`, n != 0 | `Some(true)`  |
/// | `false`, `"false"`, `"off"`, `"no"`, `"0"`, `"disabled"`, `""`, `0`, `null` | `Some(false)` |
/// | anything else                                                 | `None`        |
///
/// String matching ignores case and surrounding whitespace.
pub fn parse_toggle(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Null => Some(false),
        Value::Number(n) => n.as_f64().map(|f| f != 0.0),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "on" | "yes" | "1" | "enabled" => Some(true),
            "false" | "off" | "no" | "0" | "disabled" | "" => Some(false),
            _ => None,
        },
        Value::Array(_) | Value::Object(_) => None,
    }
}

/// Validate raw settings, returning every key whose value is not a toggle
pub fn validate_settings(raw: &RawSettings) -> Vec<ValidationError> {
    let fields = [
        ("compositor", &raw.compositor),
        ("steam_os_mode", &raw.steam_os_mode),
        ("on_deck", &raw.on_deck),
        ("deck_ui_mode", &raw.deck_ui_mode),
    ];

    fields
        .into_iter()
        .filter_map(|(key, value)| {
            let value = value.as_ref()?;
            if parse_toggle(value).is_some() {
                None
            } else {
                Some(ValidationError::NotAToggle {
                    key: key.to_string(),
                    value: value.to_string(),
                })
            }
        })
        .collect()
}
