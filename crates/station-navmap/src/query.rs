//! Nearest-beacon search and relative-position descriptions.

use std::f32::consts::{FRAC_PI_2, TAU};

use bevy_ecs::entity::Entity;
use serde::{Deserialize, Serialize};
use station_config::BeaconConfig;

use crate::common::{Color, MapCoordinates, NetEntity};
use crate::host::NavMapHost;
use crate::localize::{KEY_MOD_FAR, KEY_NO_BEACONS, KEY_POS_FORMAT, KEY_POS_FORMAT_DIRECTION, Localizer};

/// Eight-way compass direction. Discriminants follow angle order, starting
/// at South and turning through East.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    South = 0,
    SouthEast = 1,
    East = 2,
    NorthEast = 3,
    North = 4,
    NorthWest = 5,
    West = 6,
    SouthWest = 7,
}

impl Direction {
    /// All directions in discriminant order.
    pub const ALL: [Direction; 8] = [
        Self::South,
        Self::SouthEast,
        Self::East,
        Self::NorthEast,
        Self::North,
        Self::NorthWest,
        Self::West,
        Self::SouthWest,
    ];

    /// Nearest octant to a world angle (0 = South, π/2 = East).
    pub fn from_angle(theta: f32) -> Self {
        let segment = TAU / 8.0;
        let angle = theta.rem_euclid(TAU);
        let index = ((angle + segment / 2.0) / segment).floor() as usize % 8;
        Self::ALL[index]
    }
}

/// World angle of a vector: 0 points to −y, increasing toward +x.
pub fn to_world_angle(v: glam::Vec2) -> f32 {
    v.y.atan2(v.x) + FRAC_PI_2
}

/// Result of a nearest-beacon search.
#[derive(Debug, Clone, PartialEq)]
pub struct NearestBeacon {
    /// Beacon entity.
    pub entity: Entity,
    /// Network id of the beacon.
    pub net_entity: NetEntity,
    /// Grid the beacon sits on.
    pub grid: Option<Entity>,
    /// Beacon display text.
    pub text: String,
    /// Marker color.
    pub color: Color,
    /// World position of the beacon.
    pub coordinates: MapCoordinates,
    /// Squared distance to the query point.
    pub distance_squared: f32,
}

/// Finds the closest visible configurable beacon on the query's map.
///
/// Equidistant beacons resolve to the lowest network id.
pub fn find_nearest_beacon<H: NavMapHost + ?Sized>(
    host: &H,
    coordinates: MapCoordinates,
) -> Option<NearestBeacon> {
    let mut best: Option<NearestBeacon> = None;

    for entity in host.configurable_beacons() {
        let Some(component) = host.beacon(entity) else {
            continue;
        };
        if !component.enabled {
            continue;
        }
        let Some(text) = component.display_text() else {
            continue;
        };
        let Some(transform) = host.transform(entity) else {
            continue;
        };
        if !transform.anchored {
            continue;
        }
        let Some(position) = host.map_coordinates(entity) else {
            continue;
        };
        if position.map != coordinates.map {
            continue;
        }
        let Some(meta) = host.meta(entity) else {
            continue;
        };

        let distance_squared = (coordinates.position - position.position).length_squared();
        let better = best.as_ref().is_none_or(|b| {
            distance_squared < b.distance_squared
                || (distance_squared == b.distance_squared && meta.net_entity < b.net_entity)
        });
        if better {
            best = Some(NearestBeacon {
                entity,
                net_entity: meta.net_entity,
                grid: transform.grid,
                text: text.to_string(),
                color: component.color,
                coordinates: position,
                distance_squared,
            });
        }
    }

    best
}

/// Describes where `coordinates` lies relative to the nearest beacon.
///
/// The direction is measured in the frame of the beacon's grid, so a rotated
/// station still reports its own north.
pub fn describe_nearest_beacon<H: NavMapHost + ?Sized>(
    host: &H,
    coordinates: MapCoordinates,
    localizer: &dyn Localizer,
    distances: &BeaconConfig,
) -> String {
    let Some(nearest) = find_nearest_beacon(host, coordinates) else {
        return localizer.get_string(KEY_NO_BEACONS, &[]);
    };

    let grid_rotation = nearest
        .grid
        .and_then(|grid| host.transform(grid))
        .map_or(0.0, |t| t.local_rotation);

    let offset = coordinates.position - nearest.coordinates.position;
    let direction = Direction::from_angle(to_world_angle(offset) - grid_rotation);
    let length = offset.length();
    let color = nearest.color.to_hex_no_alpha();

    if length < distances.close_distance {
        return localizer.get_string(
            KEY_POS_FORMAT,
            &[("color", color), ("marker", nearest.text)],
        );
    }

    let modifier = if length > distances.far_distance {
        localizer.get_string(KEY_MOD_FAR, &[])
    } else {
        String::new()
    };

    localizer.get_string(
        KEY_POS_FORMAT_DIRECTION,
        &[
            ("modifier", modifier),
            (
                "direction",
                localizer.format_direction(direction).to_lowercase(),
            ),
            ("color", color),
            ("marker", nearest.text),
        ],
    )
}

#[cfg(test)]
mod tests {
    use glam::{IVec2, Vec2};

    use super::*;
    use crate::beacon::NavMapBeaconComponent;
    use crate::common::MapId;
    use crate::host::TransformInfo;
    use crate::host::mock::MockHost;
    use crate::localize::EnglishLocalizer;

    fn beacon_at(host: &mut MockHost, name: &str, position: Vec2) -> Entity {
        let entity = host.spawn(name);
        host.anchor_at(entity, IVec2::ZERO);
        host.transforms.get_mut(&entity).unwrap().local_position = position;
        host.beacons
            .insert(entity, NavMapBeaconComponent::new(name, Color::WHITE));
        host.configurable.insert(entity);
        entity
    }

    fn query(position: Vec2) -> MapCoordinates {
        MapCoordinates::new(position, MapId(1))
    }

    fn describe(host: &MockHost, position: Vec2) -> String {
        describe_nearest_beacon(
            host,
            query(position),
            &EnglishLocalizer::new(),
            &BeaconConfig::default(),
        )
    }

    #[test]
    fn test_octant_quantization() {
        assert_eq!(Direction::from_angle(to_world_angle(Vec2::new(0.0, -1.0))), Direction::South);
        assert_eq!(Direction::from_angle(to_world_angle(Vec2::new(1.0, 0.0))), Direction::East);
        assert_eq!(Direction::from_angle(to_world_angle(Vec2::new(0.0, 1.0))), Direction::North);
        assert_eq!(Direction::from_angle(to_world_angle(Vec2::new(-1.0, 0.0))), Direction::West);
        assert_eq!(Direction::from_angle(to_world_angle(Vec2::new(1.0, 1.0))), Direction::NorthEast);
        assert_eq!(Direction::from_angle(to_world_angle(Vec2::new(-1.0, -1.0))), Direction::SouthWest);
        assert_eq!(Direction::from_angle(-TAU), Direction::South);
    }

    #[test]
    fn test_nearest_of_three_beacons() {
        let mut host = MockHost::default();
        let near = beacon_at(&mut host, "Bridge", Vec2::new(5.0, 0.0));
        beacon_at(&mut host, "Cargo", Vec2::new(-20.0, 0.0));
        beacon_at(&mut host, "Medbay", Vec2::new(0.0, 50.0));

        let found = find_nearest_beacon(&host, query(Vec2::ZERO)).unwrap();
        assert_eq!(found.entity, near);
        assert_eq!(found.distance_squared, 25.0);
        assert_eq!(describe(&host, Vec2::ZERO), "[color=#ffffff]near Bridge[/color]");
    }

    #[test]
    fn test_mid_distance_has_plain_direction() {
        let mut host = MockHost::default();
        beacon_at(&mut host, "Cargo", Vec2::new(-20.0, 0.0));
        assert_eq!(
            describe(&host, Vec2::ZERO),
            "[color=#ffffff]east of Cargo[/color]"
        );
    }

    #[test]
    fn test_far_distance_has_modifier() {
        let mut host = MockHost::default();
        beacon_at(&mut host, "Medbay", Vec2::new(0.0, 50.0));
        assert_eq!(
            describe(&host, Vec2::ZERO),
            "[color=#ffffff]far south of Medbay[/color]"
        );
    }

    #[test]
    fn test_grid_rotation_is_removed() {
        let mut host = MockHost::default();
        beacon_at(&mut host, "Cargo", Vec2::new(-20.0, 0.0));
        host.transforms.insert(
            MockHost::GRID,
            TransformInfo {
                map: MapId(1),
                parent: None,
                grid: None,
                local_position: Vec2::ZERO,
                local_rotation: FRAC_PI_2,
                anchored: false,
            },
        );
        // World east, seen from a grid turned a quarter toward east, is grid south.
        assert_eq!(
            describe(&host, Vec2::ZERO),
            "[color=#ffffff]south of Cargo[/color]"
        );
    }

    #[test]
    fn test_ineligible_beacons_are_skipped() {
        let mut host = MockHost::default();
        let disabled = beacon_at(&mut host, "Off", Vec2::new(1.0, 0.0));
        host.beacons.get_mut(&disabled).unwrap().enabled = false;
        let loose = beacon_at(&mut host, "Loose", Vec2::new(2.0, 0.0));
        host.transforms.get_mut(&loose).unwrap().anchored = false;
        let blank = beacon_at(&mut host, "Blank", Vec2::new(3.0, 0.0));
        host.beacons.get_mut(&blank).unwrap().text = None;
        let elsewhere = beacon_at(&mut host, "Elsewhere", Vec2::new(0.5, 0.0));
        host.transforms.get_mut(&elsewhere).unwrap().map = MapId(2);
        let plain = beacon_at(&mut host, "Plain", Vec2::new(4.0, 0.0));
        host.configurable.remove(&plain);

        assert!(find_nearest_beacon(&host, query(Vec2::ZERO)).is_none());
        assert_eq!(describe(&host, Vec2::ZERO), "Unknown");
    }

    #[test]
    fn test_equidistant_tie_goes_to_lowest_net_id() {
        let mut host = MockHost::default();
        let first = beacon_at(&mut host, "A", Vec2::new(3.0, 0.0));
        beacon_at(&mut host, "B", Vec2::new(-3.0, 0.0));
        beacon_at(&mut host, "C", Vec2::new(0.0, 3.0));

        let found = find_nearest_beacon(&host, query(Vec2::ZERO)).unwrap();
        assert_eq!(found.entity, first);
        assert_eq!(found.net_entity, NetEntity(1));
    }
}
