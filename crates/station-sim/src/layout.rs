//! Demo station: two walled rooms joined by a corridor, with airlocks,
//! windows, three beacons, and one region.

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};
use station_navmap::ecs::{NavMapEvents, StationBuilder, new_region};
use station_navmap::{Color, MapId, NavMapBeaconComponent, NetEntity, UiKey, ecs};

/// Map every demo entity lives on.
pub const STATION_MAP: MapId = MapId(1);

/// Message key the medbay beacon resolves at map init.
pub const MEDBAY_TEXT_KEY: &str = "station-beacon-medbay";

/// UI key of the demo region overlay.
pub const REGION_UI_KEY: &str = "station-map";

/// Entities the mutation schedule works on.
pub struct Station {
    pub grid: Entity,
    pub bridge_beacon: Entity,
    pub medbay_beacon: Entity,
    pub cargo_beacon: Entity,
    pub airlock: Entity,
    pub region_owner: NetEntity,
}

/// Builds the station and queues its map-init and grid events.
pub fn build(world: &mut World) -> Station {
    let bridge_door = IVec2::new(10, 4);
    let medbay_door = IVec2::new(21, 4);

    let mut builder = StationBuilder::new(world, STATION_MAP, "NT Demo Station")
        .at(Vec2::new(100.0, -40.0), 0.0);

    builder
        .room(IVec2::new(0, 0), IVec2::new(10, 8), &[bridge_door])
        .room(IVec2::new(21, 0), IVec2::new(31, 8), &[medbay_door])
        .floor_rect(IVec2::new(11, 2), IVec2::new(20, 6));
    for x in 11..=20 {
        builder.window(IVec2::new(x, 2));
        builder.window(IVec2::new(x, 6));
    }
    // Cargo bay, open to space on every side.
    builder.floor_rect(IVec2::new(12, -6), IVec2::new(19, -3));

    let airlock = builder.airlock(bridge_door);
    builder.airlock(medbay_door);

    let bridge_beacon = builder.beacon(
        IVec2::new(5, 4),
        NavMapBeaconComponent::new("Bridge", Color::rgb(0x33, 0x66, 0xFF)),
    );
    let medbay_beacon = builder.beacon(
        IVec2::new(26, 4),
        NavMapBeaconComponent::with_default_text(MEDBAY_TEXT_KEY),
    );
    let cargo_beacon = builder.beacon(
        IVec2::new(16, -5),
        NavMapBeaconComponent::new("Cargo", NavMapBeaconComponent::DEFAULT_COLOR),
    );
    let grid = builder.finish();

    let region_owner = world
        .resource_mut::<ecs::NetEntityAllocator>()
        .allocate();
    tracing::debug!(
        pending = world.resource::<NavMapEvents>().pending_len(),
        "demo station queued"
    );

    Station {
        grid,
        bridge_beacon,
        medbay_beacon,
        cargo_beacon,
        airlock,
        region_owner,
    }
}

/// Declares the medbay region. Call after the grid has its nav-map.
pub fn declare_region(world: &mut World, station: &Station) -> bool {
    let props = new_region(
        world,
        station.region_owner,
        UiKey::new(REGION_UI_KEY),
        [IVec2::new(26, 2)],
    )
    .with_color(Color::rgb(0x4C, 0xAF, 0x50));

    match ecs::add_or_update_region(world, station.grid, station.region_owner, props) {
        Ok(signalled) => signalled,
        Err(err) => {
            tracing::error!(%err, "failed to declare demo region");
            false
        }
    }
}
