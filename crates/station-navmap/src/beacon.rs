//! Beacon capability, the replicated beacon record, and the per-grid
//! beacon registry.
//!
//! Only enabled, anchored beacons that sit on a grid appear in a
//! [`NavMap`]'s registry. Entries are keyed by [`NetEntity`] and rebuilt
//! reactively whenever the beacon's enabled, anchored, or text state changes.

use bevy_ecs::prelude::*;
use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::chunk::Tick;
use crate::common::{Color, NetEntity};
use crate::host::{EntityMeta, NavMapHost, TransformInfo};
use crate::localize::{KEY_EXAMINE, Localizer};
use crate::navmap::NavMap;

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

/// Marks an entity as a nav-map landmark.
#[derive(Component, Debug, Clone, PartialEq)]
pub struct NavMapBeaconComponent {
    /// Display text. Falls back to the entity name when unset or empty.
    pub text: Option<String>,
    /// Message key resolved into `text` at map init when `text` is unset.
    pub default_text: Option<String>,
    /// Marker color.
    pub color: Color,
    /// Whether the beacon is shown.
    pub enabled: bool,
}

impl NavMapBeaconComponent {
    /// Default marker color.
    pub const DEFAULT_COLOR: Color = Color::rgb(0xFF, 0xA5, 0x00);

    /// Enabled beacon with explicit text.
    pub fn new(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: Some(text.into()),
            color,
            ..Default::default()
        }
    }

    /// Enabled beacon whose text is resolved from a message key at map init.
    pub fn with_default_text(key: impl Into<String>) -> Self {
        Self {
            default_text: Some(key.into()),
            ..Default::default()
        }
    }

    /// Explicit text, if set and non-empty.
    pub fn display_text(&self) -> Option<&str> {
        self.text.as_deref().filter(|t| !t.is_empty())
    }

    /// Resolves `default_text` into `text` if no text was set.
    /// Returns whether the text changed.
    pub fn apply_map_init(&mut self, localizer: &dyn Localizer) -> bool {
        if self.text.is_some() {
            return false;
        }
        let Some(key) = &self.default_text else {
            return false;
        };
        self.text = Some(localizer.get_string(key, &[]));
        true
    }

    /// Sets the enabled flag. Returns `false` when it already had that value.
    pub fn set_enabled(&mut self, enabled: bool) -> bool {
        if self.enabled == enabled {
            return false;
        }
        self.enabled = enabled;
        true
    }

    /// Applies a configuration. Returns `false` when nothing differs.
    pub fn configure(&mut self, config: &BeaconConfiguration) -> bool {
        if self.text == config.text && self.color == config.color && self.enabled == config.enabled
        {
            return false;
        }
        self.text = config.text.clone();
        self.color = config.color;
        self.enabled = config.enabled;
        true
    }

    /// Derived visual state.
    pub fn visuals(&self, anchored: bool) -> BeaconVisuals {
        BeaconVisuals {
            enabled: self.enabled && anchored,
        }
    }

    /// Examine description: enabled state, color, and label.
    pub fn examine_text(&self, localizer: &dyn Localizer) -> String {
        let enabled = if self.enabled { "enabled" } else { "disabled" };
        localizer.get_string(
            KEY_EXAMINE,
            &[
                ("enabled", enabled.to_string()),
                ("color", self.color.to_hex_no_alpha()),
                ("label", self.text.clone().unwrap_or_default()),
            ],
        )
    }
}

impl Default for NavMapBeaconComponent {
    fn default() -> Self {
        Self {
            text: None,
            default_text: None,
            color: Self::DEFAULT_COLOR,
            enabled: true,
        }
    }
}

/// Marks a beacon as player-configurable and eligible for nearest-beacon queries.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct ConfigurableNavMapBeacon;

/// Appearance state of a beacon (lit only when enabled and anchored).
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BeaconVisuals {
    /// Whether the beacon renders as active.
    pub enabled: bool,
}

/// Requested beacon settings from a configuration message.
#[derive(Debug, Clone, PartialEq)]
pub struct BeaconConfiguration {
    /// New display text.
    pub text: Option<String>,
    /// New marker color.
    pub color: Color,
    /// New enabled state.
    pub enabled: bool,
}

/// Writes the audit record for an accepted beacon configuration.
pub fn log_configure_audit(actor: &str, beacon: &str, config: &BeaconConfiguration) {
    let text = config.text.as_deref().unwrap_or_default();
    let color = config.color.to_hex_no_alpha();
    let state = if config.enabled { "enabled" } else { "disabled" };
    tracing::info!(
        target: "audit",
        impact = "medium",
        actor,
        beacon,
        text,
        color = %color,
        enabled = config.enabled,
        "{actor} configured nav-map beacon '{beacon}' with text '{text}', color {color}, and {state} it"
    );
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Replicated beacon entry.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct NavMapBeacon {
    /// Network id of the beacon entity.
    pub net_ent: NetEntity,
    /// Marker color.
    pub color: Color,
    /// Display text.
    pub text: String,
    /// Grid-local position.
    pub position: Vec2,
}

/// Builds a registry entry, or `None` if the beacon should not be shown.
pub fn try_create_beacon_data(
    component: &NavMapBeaconComponent,
    transform: &TransformInfo,
    meta: &EntityMeta,
) -> Option<NavMapBeacon> {
    if !component.enabled || transform.grid.is_none() || !transform.anchored {
        return None;
    }

    let text = component
        .display_text()
        .map_or_else(|| meta.name.clone(), str::to_string);

    Some(NavMapBeacon {
        net_ent: meta.net_entity,
        color: component.color,
        text,
        position: transform.local_position,
    })
}

impl NavMap {
    /// Replaces the registry entry of `entity` with a freshly derived one.
    ///
    /// Signals replication only if the entry appeared, vanished, or changed.
    pub fn update_beacon<H: NavMapHost + ?Sized>(
        &mut self,
        host: &H,
        entity: Entity,
        tick: Tick,
    ) -> bool {
        let Some(meta) = host.meta(entity) else {
            return false;
        };
        let fresh = match (host.beacon(entity), host.transform(entity)) {
            (Some(component), Some(transform)) => {
                try_create_beacon_data(component, &transform, &meta)
            }
            _ => None,
        };

        let stale = self.beacons.remove(&meta.net_entity);
        let changed = stale != fresh;
        if let Some(beacon) = fresh {
            self.beacons.insert(meta.net_entity, beacon);
        }

        if !changed {
            return false;
        }
        tracing::debug!(beacon = %meta.net_entity, "beacon entry updated");
        self.mark_dirty(tick)
    }

    /// Registry entry for a beacon.
    pub fn beacon(&self, net_entity: NetEntity) -> Option<&NavMapBeacon> {
        self.beacons.get(&net_entity)
    }

    /// Iterates over all registry entries.
    pub fn beacons(&self) -> impl Iterator<Item = (&NetEntity, &NavMapBeacon)> {
        self.beacons.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::common::MapId;
    use crate::host::mock::MockHost;
    use crate::localize::EnglishLocalizer;

    fn anchored(anchored: bool) -> TransformInfo {
        TransformInfo {
            map: MapId(1),
            parent: Some(MockHost::GRID),
            grid: Some(MockHost::GRID),
            local_position: Vec2::new(3.5, 4.5),
            local_rotation: 0.0,
            anchored,
        }
    }

    fn meta() -> EntityMeta {
        EntityMeta {
            name: "navigation beacon".into(),
            net_entity: NetEntity(11),
        }
    }

    #[test]
    fn test_beacon_requires_enabled_anchored_and_grid() {
        let component = NavMapBeaconComponent::new("Bridge", Color::WHITE);
        assert!(try_create_beacon_data(&component, &anchored(true), &meta()).is_some());
        assert!(try_create_beacon_data(&component, &anchored(false), &meta()).is_none());

        let mut off_grid = anchored(true);
        off_grid.grid = None;
        assert!(try_create_beacon_data(&component, &off_grid, &meta()).is_none());

        let disabled = NavMapBeaconComponent {
            enabled: false,
            ..component
        };
        assert!(try_create_beacon_data(&disabled, &anchored(true), &meta()).is_none());
    }

    #[test]
    fn test_empty_text_falls_back_to_entity_name() {
        let component = NavMapBeaconComponent {
            text: Some(String::new()),
            ..Default::default()
        };
        let beacon = try_create_beacon_data(&component, &anchored(true), &meta()).unwrap();
        assert_eq!(beacon.text, "navigation beacon");
        assert_eq!(beacon.position, Vec2::new(3.5, 4.5));
    }

    #[test]
    fn test_update_signals_only_on_change() {
        let mut host = MockHost::default();
        let entity = host.spawn("beacon");
        host.anchor_at(entity, glam::IVec2::new(2, 2));
        host.beacons
            .insert(entity, NavMapBeaconComponent::new("Cargo", Color::WHITE));

        let mut nav = NavMap::new(Tick(1));
        assert!(nav.update_beacon(&host, entity, Tick(2)));
        assert!(!nav.update_beacon(&host, entity, Tick(3)));
        assert_eq!(nav.last_dirty(), Some(Tick(2)));

        host.beacons.get_mut(&entity).unwrap().color = Color::rgb(1, 2, 3);
        assert!(nav.update_beacon(&host, entity, Tick(4)));

        host.beacons.get_mut(&entity).unwrap().enabled = false;
        assert!(nav.update_beacon(&host, entity, Tick(5)));
        assert_eq!(nav.beacons().count(), 0);
        assert!(!nav.update_beacon(&host, entity, Tick(6)));
    }

    #[test]
    fn test_map_init_resolves_default_text_once() {
        let loc = EnglishLocalizer::new().with_entry("station-beacon-bridge", "Bridge");
        let mut component = NavMapBeaconComponent::with_default_text("station-beacon-bridge");
        assert!(component.apply_map_init(&loc));
        assert_eq!(component.text.as_deref(), Some("Bridge"));
        assert!(!component.apply_map_init(&loc));

        let mut explicit = NavMapBeaconComponent::new("Custom", Color::WHITE);
        explicit.default_text = Some("station-beacon-bridge".into());
        assert!(!explicit.apply_map_init(&loc));
        assert_eq!(explicit.text.as_deref(), Some("Custom"));
    }

    #[test]
    fn test_configure_rejects_identical_settings() {
        let mut component = NavMapBeaconComponent::new("Medbay", Color::WHITE);
        let same = BeaconConfiguration {
            text: Some("Medbay".into()),
            color: Color::WHITE,
            enabled: true,
        };
        assert!(!component.configure(&same));

        let changed = BeaconConfiguration {
            enabled: false,
            ..same
        };
        assert!(component.configure(&changed));
        assert!(!component.enabled);
        assert_eq!(component.visuals(true), BeaconVisuals { enabled: false });
    }

    #[test]
    fn test_examine_text_mentions_state_color_and_label() {
        let component = NavMapBeaconComponent::new("Engineering", Color::rgb(0x10, 0x20, 0x30));
        let text = component.examine_text(&EnglishLocalizer::new());
        assert!(text.contains("enabled"));
        assert!(text.contains("#102030"));
        assert!(text.contains("\"Engineering\""));
    }

    #[test]
    fn test_beacon_record_json_shape() {
        let beacon = NavMapBeacon {
            net_ent: NetEntity(4),
            color: Color::WHITE,
            text: "Bridge".into(),
            position: Vec2::new(1.0, 2.0),
        };
        let json = serde_json::to_value(&beacon).unwrap();
        assert_eq!(json["net_ent"], 4);
        assert_eq!(json["text"], "Bridge");
        assert_eq!(json["color"]["r"], 255);
    }
}
