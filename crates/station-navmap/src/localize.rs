//! String lookup for player-facing beacon text.

use rustc_hash::FxHashMap;

use crate::query::Direction;

/// Message key: no eligible beacon.
pub const KEY_NO_BEACONS: &str = "nav-beacon-pos-no-beacons";
/// Message key: target is close to the beacon.
pub const KEY_POS_FORMAT: &str = "nav-beacon-pos-format";
/// Message key: target is some direction away from the beacon.
pub const KEY_POS_FORMAT_DIRECTION: &str = "nav-beacon-pos-format-direction";
/// Message key: modifier for distant targets.
pub const KEY_MOD_FAR: &str = "nav-beacon-pos-format-direction-mod-far";
/// Message key: beacon examine description.
pub const KEY_EXAMINE: &str = "nav-beacon-examine-text";

/// Resolves message keys into display strings.
pub trait Localizer {
    /// Looks up `key` and substitutes `{name}` placeholders from `args`.
    /// Unknown keys resolve to the key itself.
    fn get_string(&self, key: &str, args: &[(&str, String)]) -> String;

    /// Display name of a compass direction.
    fn format_direction(&self, direction: Direction) -> String;
}

/// Built-in English message table.
#[derive(Debug, Clone)]
pub struct EnglishLocalizer {
    table: FxHashMap<String, String>,
}

impl EnglishLocalizer {
    /// Creates the table with the beacon messages.
    pub fn new() -> Self {
        let mut table = FxHashMap::default();
        for (key, template) in [
            (KEY_NO_BEACONS, "Unknown"),
            (KEY_POS_FORMAT, "[color={color}]near {marker}[/color]"),
            (
                KEY_POS_FORMAT_DIRECTION,
                "[color={color}]{modifier}{direction} of {marker}[/color]",
            ),
            (KEY_MOD_FAR, "far "),
            (
                KEY_EXAMINE,
                "It is [color=#FFA500]{enabled}[/color] and labelled [color={color}]\"{label}\"[/color].",
            ),
        ] {
            table.insert(key.to_string(), template.to_string());
        }
        Self { table }
    }

    /// Adds or replaces one entry, e.g. a beacon default-text key.
    pub fn with_entry(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.table.insert(key.into(), template.into());
        self
    }
}

impl Default for EnglishLocalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl Localizer for EnglishLocalizer {
    fn get_string(&self, key: &str, args: &[(&str, String)]) -> String {
        let Some(template) = self.table.get(key) else {
            return key.to_string();
        };
        let mut out = template.clone();
        for (name, value) in args {
            out = out.replace(&format!("{{{name}}}"), value);
        }
        out
    }

    fn format_direction(&self, direction: Direction) -> String {
        match direction {
            Direction::South => "South",
            Direction::SouthEast => "Southeast",
            Direction::East => "East",
            Direction::NorthEast => "Northeast",
            Direction::North => "North",
            Direction::NorthWest => "Northwest",
            Direction::West => "West",
            Direction::SouthWest => "Southwest",
        }
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_placeholders_are_substituted() {
        let loc = EnglishLocalizer::new();
        let text = loc.get_string(
            KEY_POS_FORMAT,
            &[("color", "#ff0000".into()), ("marker", "Bridge".into())],
        );
        assert_eq!(text, "[color=#ff0000]near Bridge[/color]");
    }

    #[test]
    fn test_unknown_key_falls_back_to_key() {
        let loc = EnglishLocalizer::new();
        assert_eq!(loc.get_string("station-beacon-medical", &[]), "station-beacon-medical");

        let loc = loc.with_entry("station-beacon-medical", "Medical");
        assert_eq!(loc.get_string("station-beacon-medical", &[]), "Medical");
    }
}
