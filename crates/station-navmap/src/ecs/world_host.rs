//! [`NavMapHost`] over a bevy [`World`].

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};

use super::components::{Airtight, MapGrid, MetaData, NavMapDoor, Tags, Transform};
use crate::beacon::{ConfigurableNavMapBeacon, NavMapBeaconComponent};
use crate::common::MapCoordinates;
use crate::host::{EntityMeta, NavMapHost, TransformInfo};
use crate::tile::AtmosDirection;

/// Deepest transform chain followed when resolving world positions.
const MAX_HIERARCHY_DEPTH: usize = 16;

/// Read-only host view of a world.
pub struct WorldHost<'w> {
    world: &'w World,
}

impl<'w> WorldHost<'w> {
    /// Wraps a world.
    pub fn new(world: &'w World) -> Self {
        Self { world }
    }

    /// World-space position and rotation of an entity.
    pub fn world_transform(&self, entity: Entity) -> Option<(Vec2, f32)> {
        let own = self.world.get::<Transform>(entity)?;
        let mut position = own.local_position;
        let mut rotation = own.local_rotation;
        let mut parent = own.parent;

        for _ in 0..MAX_HIERARCHY_DEPTH {
            let Some(p) = parent else {
                break;
            };
            let Some(pt) = self.world.get::<Transform>(p) else {
                break;
            };
            position = pt.local_position + Vec2::from_angle(pt.local_rotation).rotate(position);
            rotation += pt.local_rotation;
            parent = pt.parent;
        }

        Some((position, rotation))
    }

    fn sorted_matching(&self, keep: impl Fn(&EntityRef) -> bool) -> Vec<Entity> {
        let mut found: Vec<Entity> = self
            .world
            .iter_entities()
            .filter(|e| keep(e))
            .map(|e| e.id())
            .collect();
        found.sort();
        found
    }
}

impl NavMapHost for WorldHost<'_> {
    fn grid_tiles(&self, grid: Entity) -> Vec<IVec2> {
        self.world
            .get::<MapGrid>(grid)
            .map(|g| g.tiles().collect())
            .unwrap_or_default()
    }

    fn is_space(&self, grid: Entity, tile: IVec2) -> bool {
        self.world
            .get::<MapGrid>(grid)
            .is_none_or(|g| g.tile(tile).is_space())
    }

    fn anchored_entities(&self, grid: Entity, tile: IVec2) -> Vec<Entity> {
        self.world
            .get::<MapGrid>(grid)
            .map(|g| g.anchored_at(tile).to_vec())
            .unwrap_or_default()
    }

    fn airtight_directions(&self, entity: Entity) -> Option<AtmosDirection> {
        self.world
            .get::<Airtight>(entity)
            .map(|a| a.air_blocked_direction)
    }

    fn is_airlock(&self, entity: Entity) -> bool {
        self.world.get::<NavMapDoor>(entity).is_some()
    }

    fn has_any_tag(&self, entity: Entity, tags: &[String]) -> bool {
        self.world
            .get::<Tags>(entity)
            .is_some_and(|own| own.has_any(tags))
    }

    fn transform(&self, entity: Entity) -> Option<TransformInfo> {
        self.world.get::<Transform>(entity).map(|t| TransformInfo {
            map: t.map,
            parent: t.parent,
            grid: t.grid,
            local_position: t.local_position,
            local_rotation: t.local_rotation,
            anchored: t.anchored,
        })
    }

    fn meta(&self, entity: Entity) -> Option<EntityMeta> {
        self.world.get::<MetaData>(entity).map(|m| EntityMeta {
            name: m.name.clone(),
            net_entity: m.net_entity,
        })
    }

    fn beacon(&self, entity: Entity) -> Option<&NavMapBeaconComponent> {
        self.world.get::<NavMapBeaconComponent>(entity)
    }

    fn beacons_parented_to(&self, grid: Entity) -> Vec<Entity> {
        self.sorted_matching(|e| {
            e.contains::<NavMapBeaconComponent>()
                && e.get::<Transform>().and_then(|t| t.parent) == Some(grid)
        })
    }

    fn configurable_beacons(&self) -> Vec<Entity> {
        self.sorted_matching(|e| {
            e.contains::<NavMapBeaconComponent>() && e.contains::<ConfigurableNavMapBeacon>()
        })
    }

    fn map_coordinates(&self, entity: Entity) -> Option<MapCoordinates> {
        let map = self.world.get::<Transform>(entity)?.map;
        let (position, _) = self.world_transform(entity)?;
        Some(MapCoordinates::new(position, map))
    }
}
