//! Raw settings schema (as parsed from JSON)

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Raw settings document as parsed from JSON.
///
/// Every key is kept as an untyped value: the document historically accepts
/// booleans as well as strings like `"on"` or `"yes"`. Normalization happens
/// in [`crate::validate_settings`]. Unknown keys are ignored; an explicit
/// `null` is kept as `Some(Value::Null)` rather than treated as absent.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawSettings {
    /// Run the window manager with its compositor enabled
    #[serde(default, deserialize_with = "present")]
    pub compositor: Option<Value>,

    /// Pass the SteamOS console-mode flag to the target application
    #[serde(default, deserialize_with = "present")]
    pub steam_os_mode: Option<Value>,

    /// Running on a handheld (Steam Deck) device
    #[serde(default, deserialize_with = "present")]
    pub on_deck: Option<Value>,

    /// Use the new (Deck) big picture UI; off selects the legacy UI
    #[serde(default, deserialize_with = "present")]
    pub deck_ui_mode: Option<Value>,
}

/// Keep explicit `null` distinct from a missing key
fn present<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}
