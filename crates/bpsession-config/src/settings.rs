//! Validated launch configuration

use crate::schema::RawSettings;
use crate::validation::parse_toggle;
use serde_json::Value;

/// Resolved launch options, immutable for the lifetime of an invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LaunchConfig {
    /// Window manager compositor (`--compositor=on|off`)
    pub compositor: bool,

    /// SteamOS console mode (`-steamos` / `-steamos3`)
    pub steam_os_mode: bool,

    /// Handheld device mode (`-steamdeck`)
    pub on_deck: bool,

    /// New big picture UI; `false` requests `-oldbigpicture`
    pub deck_ui_mode: bool,
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self {
            compositor: false,
            steam_os_mode: false,
            on_deck: false,
            deck_ui_mode: true,
        }
    }
}

impl LaunchConfig {
    /// Convert from raw settings (after validation)
    pub fn from_raw(raw: &RawSettings) -> Self {
        let defaults = Self::default();
        Self {
            compositor: toggle_or(&raw.compositor, defaults.compositor),
            steam_os_mode: toggle_or(&raw.steam_os_mode, defaults.steam_os_mode),
            on_deck: toggle_or(&raw.on_deck, defaults.on_deck),
            deck_ui_mode: toggle_or(&raw.deck_ui_mode, defaults.deck_ui_mode),
        }
    }
}

fn toggle_or(value: &Option<Value>, default: bool) -> bool {
    value.as_ref().and_then(parse_toggle).unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn absent_keys_use_defaults() {
        let config = LaunchConfig::from_raw(&RawSettings::default());
        assert_eq!(config, LaunchConfig::default());
        assert!(config.deck_ui_mode);
        assert!(!config.compositor);
    }

    #[test]
    fn mixed_truthy_values() {
        let raw = RawSettings {
            compositor: Some(json!("on")),
            steam_os_mode: Some(json!("yes")),
            on_deck: Some(json!(true)),
            deck_ui_mode: Some(json!("off")),
        };

        let config = LaunchConfig::from_raw(&raw);
        assert!(config.compositor);
        assert!(config.steam_os_mode);
        assert!(config.on_deck);
        assert!(!config.deck_ui_mode);
    }

    #[test]
    fn null_deck_ui_mode_is_off() {
        let raw = RawSettings {
            deck_ui_mode: Some(Value::Null),
            ..Default::default()
        };
        assert!(!LaunchConfig::from_raw(&raw).deck_ui_mode);
    }
}
