//! Station assembly and engine-side mutation helpers.
//!
//! These play the host engine's part: they edit grid tiles and anchored
//! entities directly, then queue the matching [`NavMapInput`]s so the next
//! [`nav_map_system`](super::nav_map_system) run updates the nav-map. Used
//! by the headless harness and the integration tests.

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};

use super::components::{
    Airtight, MapGrid, MetaData, NavMapDoor, NetEntityAllocator, Tags, Tile, Transform, WarpPoint,
};
use super::events::{
    AirtightChanged, BeaconConfigureMessage, NavMapEvents, NavMapInput, StationGridAdded,
    TileChanged,
};
use crate::beacon::{BeaconConfiguration, ConfigurableNavMapBeacon, NavMapBeaconComponent};
use crate::common::{MapId, NetEntity};

/// Default floor tile used by the builders.
pub const PLATING: Tile = Tile::new(1);

fn next_net_entity(world: &mut World) -> NetEntity {
    world
        .get_resource_or_insert_with(NetEntityAllocator::default)
        .allocate()
}

fn queue(world: &mut World, input: NavMapInput) {
    match world.get_resource_mut::<NavMapEvents>() {
        Some(mut events) => events.send(input),
        None => tracing::warn!(?input, "nav-map events not registered, input dropped"),
    }
}

fn spawn_anchored(
    world: &mut World,
    grid: Entity,
    tile: IVec2,
    name: &str,
    extra: impl Bundle,
) -> Entity {
    let map = world.get::<Transform>(grid).map_or(MapId::default(), |t| t.map);
    let net_entity = next_net_entity(world);
    let entity = world
        .spawn((
            Transform::on_grid(map, grid, tile, true),
            MetaData {
                name: name.to_string(),
                net_entity,
            },
            extra,
        ))
        .id();
    if let Some(mut map_grid) = world.get_mut::<MapGrid>(grid) {
        map_grid.anchor(tile, entity);
    }
    entity
}

fn wall_bundle(tag: &str) -> (Airtight, Tags) {
    (Airtight::full(), Tags::new([tag]))
}

fn airlock_bundle() -> (Airtight, NavMapDoor, Tags) {
    (Airtight::full(), NavMapDoor, Tags::new(["Airlock"]))
}

fn beacon_bundle(
    beacon: NavMapBeaconComponent,
) -> (NavMapBeaconComponent, ConfigurableNavMapBeacon, WarpPoint) {
    (beacon, ConfigurableNavMapBeacon, WarpPoint::default())
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Assembles a grid before it joins a station.
///
/// Placement does not queue events; [`StationBuilder::finish`] queues map
/// init for every beacon followed by [`StationGridAdded`].
pub struct StationBuilder<'w> {
    world: &'w mut World,
    grid: Entity,
    beacons: Vec<Entity>,
}

impl<'w> StationBuilder<'w> {
    /// Spawns an empty grid at the map origin.
    pub fn new(world: &'w mut World, map: MapId, name: &str) -> Self {
        let net_entity = next_net_entity(world);
        let grid = world
            .spawn((
                MapGrid::new(),
                Transform::grid_root(map, Vec2::ZERO, 0.0),
                MetaData {
                    name: name.to_string(),
                    net_entity,
                },
            ))
            .id();
        Self {
            world,
            grid,
            beacons: Vec::new(),
        }
    }

    /// Places the grid in the world.
    pub fn at(mut self, position: Vec2, rotation: f32) -> Self {
        if let Some(mut transform) = self.world.get_mut::<Transform>(self.grid) {
            transform.local_position = position;
            transform.local_rotation = rotation;
        }
        self
    }

    /// The grid entity.
    pub fn grid(&self) -> Entity {
        self.grid
    }

    /// Lays plating over an inclusive rectangle.
    pub fn floor_rect(&mut self, min: IVec2, max: IVec2) -> &mut Self {
        if let Some(mut map_grid) = self.world.get_mut::<MapGrid>(self.grid) {
            for x in min.x..=max.x {
                for y in min.y..=max.y {
                    map_grid.set_tile(IVec2::new(x, y), PLATING);
                }
            }
        }
        self
    }

    /// Places a wall.
    pub fn wall(&mut self, tile: IVec2) -> Entity {
        spawn_anchored(self.world, self.grid, tile, "wall", wall_bundle("Wall"))
    }

    /// Places a window.
    pub fn window(&mut self, tile: IVec2) -> Entity {
        spawn_anchored(self.world, self.grid, tile, "window", wall_bundle("Window"))
    }

    /// Places an airlock.
    pub fn airlock(&mut self, tile: IVec2) -> Entity {
        spawn_anchored(self.world, self.grid, tile, "airlock", airlock_bundle())
    }

    /// Floors an inclusive rectangle and walls its border, leaving the
    /// interior and the `doors` tiles open.
    pub fn room(&mut self, min: IVec2, max: IVec2, doors: &[IVec2]) -> &mut Self {
        self.floor_rect(min, max);
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                let tile = IVec2::new(x, y);
                let border = x == min.x || x == max.x || y == min.y || y == max.y;
                if border && !doors.contains(&tile) {
                    self.wall(tile);
                }
            }
        }
        self
    }

    /// Places a configurable beacon.
    pub fn beacon(&mut self, tile: IVec2, beacon: NavMapBeaconComponent) -> Entity {
        let entity = spawn_anchored(
            self.world,
            self.grid,
            tile,
            "navigation beacon",
            beacon_bundle(beacon),
        );
        self.beacons.push(entity);
        entity
    }

    /// Queues map init for the beacons, then the station-grid event.
    pub fn finish(mut self) -> Entity {
        for beacon in &self.beacons {
            queue(self.world, NavMapInput::MapInit(*beacon));
        }
        queue(
            self.world,
            NavMapInput::StationGridAdded(StationGridAdded { grid: self.grid }),
        );
        self.grid
    }
}

// ---------------------------------------------------------------------------
// Runtime mutations
// ---------------------------------------------------------------------------

/// Replaces a tile and queues a [`TileChanged`].
pub fn set_tile(world: &mut World, grid: Entity, tile: IVec2, new_tile: Tile) {
    let Some(mut map_grid) = world.get_mut::<MapGrid>(grid) else {
        return;
    };
    let old = map_grid.set_tile(tile, new_tile);
    let empty_changed = old.is_space() != new_tile.is_space();
    queue(
        world,
        NavMapInput::TileChanged(TileChanged {
            grid,
            tile,
            empty_changed,
        }),
    );
}

/// Spawns an anchored wall at runtime and queues an [`AirtightChanged`].
pub fn build_wall(world: &mut World, grid: Entity, tile: IVec2) -> Entity {
    let entity = spawn_anchored(world, grid, tile, "wall", wall_bundle("Wall"));
    queue(
        world,
        NavMapInput::AirtightChanged(AirtightChanged {
            entity,
            grid,
            tile,
            air_blocked_changed: false,
        }),
    );
    entity
}

/// Anchors or unanchors an entity in place.
///
/// Queues an anchor-state change, plus an [`AirtightChanged`] for
/// airtight entities.
pub fn set_anchored(world: &mut World, entity: Entity, anchored: bool) {
    let Some(mut transform) = world.get_mut::<Transform>(entity) else {
        return;
    };
    if transform.anchored == anchored {
        return;
    }
    transform.anchored = anchored;
    let (grid, tile) = (transform.grid, transform.tile());
    let Some(grid) = grid else {
        return;
    };

    if let Some(mut map_grid) = world.get_mut::<MapGrid>(grid) {
        if anchored {
            map_grid.anchor(tile, entity);
        } else {
            map_grid.unanchor(tile, entity);
        }
    }

    queue(world, NavMapInput::AnchorStateChanged(entity));
    if world.get::<Airtight>(entity).is_some() {
        queue(
            world,
            NavMapInput::AirtightChanged(AirtightChanged {
                entity,
                grid,
                tile,
                air_blocked_changed: false,
            }),
        );
    }
}

/// Opens or seals a door and queues the air-blocked toggle.
pub fn set_air_blocked(world: &mut World, entity: Entity, blocked: bool) {
    let Some(mut airtight) = world.get_mut::<Airtight>(entity) else {
        return;
    };
    if airtight.air_blocked == blocked {
        return;
    }
    airtight.air_blocked = blocked;

    let Some((grid, tile)) = world
        .get::<Transform>(entity)
        .and_then(|t| t.grid.map(|g| (g, t.tile())))
    else {
        return;
    };
    queue(
        world,
        NavMapInput::AirtightChanged(AirtightChanged {
            entity,
            grid,
            tile,
            air_blocked_changed: true,
        }),
    );
}

/// Queues a player beacon configuration request.
pub fn send_beacon_configure(
    world: &mut World,
    actor: Entity,
    beacon: Entity,
    config: BeaconConfiguration,
) {
    queue(
        world,
        NavMapInput::BeaconConfigure(BeaconConfigureMessage {
            actor,
            beacon,
            config,
        }),
    );
}

/// Spawns a named actor (player) entity.
pub fn spawn_actor(world: &mut World, name: &str) -> Entity {
    let net_entity = next_net_entity(world);
    world
        .spawn(MetaData {
            name: name.to_string(),
            net_entity,
        })
        .id()
}
