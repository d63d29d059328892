//! Capability queries the nav-map core needs from its host engine.
//!
//! Core handlers never touch engine storage directly; they ask a
//! [`NavMapHost`]. The ECS layer implements it over a bevy `World`
//! (see [`crate::ecs::WorldHost`]).

use bevy_ecs::entity::Entity;
use glam::{IVec2, Vec2};

use crate::beacon::NavMapBeaconComponent;
use crate::common::{MapCoordinates, MapId, NetEntity};
use crate::tile::{AtmosDirection, NavMapChunkType};

/// Snapshot of an entity's transform as the core sees it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformInfo {
    /// Map the entity lives on.
    pub map: MapId,
    /// Direct parent in the transform hierarchy.
    pub parent: Option<Entity>,
    /// Grid the entity belongs to, if any.
    pub grid: Option<Entity>,
    /// Position relative to the parent, in tiles.
    pub local_position: Vec2,
    /// Rotation relative to the parent, in radians.
    pub local_rotation: f32,
    /// Whether the entity is anchored to its grid.
    pub anchored: bool,
}

impl TransformInfo {
    /// Grid tile containing the local position.
    pub fn tile(&self) -> IVec2 {
        self.local_position.floor().as_ivec2()
    }
}

/// Identity data of an entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityMeta {
    /// Generic display name.
    pub name: String,
    /// Stable network id.
    pub net_entity: NetEntity,
}

/// Read-only view of the host engine.
pub trait NavMapHost {
    /// Every non-space tile of `grid`.
    fn grid_tiles(&self, grid: Entity) -> Vec<IVec2>;

    /// Returns `true` if `tile` on `grid` has no floor.
    fn is_space(&self, grid: Entity, tile: IVec2) -> bool;

    /// Entities anchored at `tile` on `grid`.
    fn anchored_entities(&self, grid: Entity, tile: IVec2) -> Vec<Entity>;

    /// Blocked directions of an airtight entity, `None` if not airtight.
    fn airtight_directions(&self, entity: Entity) -> Option<AtmosDirection>;

    /// Returns `true` if the entity is airlock-capable.
    fn is_airlock(&self, entity: Entity) -> bool;

    /// Returns `true` if the entity carries any of `tags`.
    fn has_any_tag(&self, entity: Entity, tags: &[String]) -> bool;

    /// Transform of the entity.
    fn transform(&self, entity: Entity) -> Option<TransformInfo>;

    /// Name and network id of the entity.
    fn meta(&self, entity: Entity) -> Option<EntityMeta>;

    /// Beacon capability of the entity.
    fn beacon(&self, entity: Entity) -> Option<&NavMapBeaconComponent>;

    /// Beacon-capable entities whose transform parent is `grid`.
    fn beacons_parented_to(&self, grid: Entity) -> Vec<Entity>;

    /// Every entity that is both beacon-capable and configurable.
    fn configurable_beacons(&self) -> Vec<Entity>;

    /// World position and map of the entity.
    fn map_coordinates(&self, entity: Entity) -> Option<MapCoordinates>;

    /// Category the entity contributes to its tile.
    ///
    /// Airlock capability wins over wall tags; anything else contributes nothing.
    fn chunk_type(&self, entity: Entity, wall_tags: &[String]) -> NavMapChunkType {
        if self.is_airlock(entity) {
            NavMapChunkType::Airlock
        } else if self.has_any_tag(entity, wall_tags) {
            NavMapChunkType::Wall
        } else {
            NavMapChunkType::Invalid
        }
    }
}

#[cfg(test)]
pub(crate) mod mock {
    //! In-memory single-grid host for unit tests.

    use rustc_hash::{FxHashMap, FxHashSet};

    use super::*;

    #[derive(Default)]
    pub(crate) struct MockHost {
        pub floors: FxHashSet<IVec2>,
        pub anchored: FxHashMap<IVec2, Vec<Entity>>,
        pub airtight: FxHashMap<Entity, AtmosDirection>,
        pub doors: FxHashSet<Entity>,
        pub tags: FxHashMap<Entity, Vec<String>>,
        pub transforms: FxHashMap<Entity, TransformInfo>,
        pub metas: FxHashMap<Entity, EntityMeta>,
        pub beacons: FxHashMap<Entity, NavMapBeaconComponent>,
        pub configurable: FxHashSet<Entity>,
        next: u32,
    }

    impl MockHost {
        pub(crate) const GRID: Entity = Entity::from_raw(1000);

        pub(crate) fn spawn(&mut self, name: &str) -> Entity {
            self.next += 1;
            let entity = Entity::from_raw(self.next);
            self.metas.insert(
                entity,
                EntityMeta {
                    name: name.to_string(),
                    net_entity: NetEntity(u64::from(self.next)),
                },
            );
            entity
        }

        pub(crate) fn floor(&mut self, tile: IVec2) {
            self.floors.insert(tile);
        }

        pub(crate) fn anchor_at(&mut self, entity: Entity, tile: IVec2) {
            self.anchored.entry(tile).or_default().push(entity);
            self.transforms.insert(
                entity,
                TransformInfo {
                    map: MapId(1),
                    parent: Some(Self::GRID),
                    grid: Some(Self::GRID),
                    local_position: tile.as_vec2() + Vec2::splat(0.5),
                    local_rotation: 0.0,
                    anchored: true,
                },
            );
        }

        pub(crate) fn wall(&mut self, tile: IVec2, dirs: AtmosDirection) -> Entity {
            let entity = self.spawn("wall");
            self.airtight.insert(entity, dirs);
            self.tags.insert(entity, vec!["Wall".to_string()]);
            self.anchor_at(entity, tile);
            entity
        }

        pub(crate) fn door(&mut self, tile: IVec2, dirs: AtmosDirection) -> Entity {
            let entity = self.spawn("airlock");
            self.airtight.insert(entity, dirs);
            self.doors.insert(entity);
            self.anchor_at(entity, tile);
            entity
        }
    }

    impl NavMapHost for MockHost {
        fn grid_tiles(&self, _grid: Entity) -> Vec<IVec2> {
            self.floors.iter().copied().collect()
        }

        fn is_space(&self, _grid: Entity, tile: IVec2) -> bool {
            !self.floors.contains(&tile)
        }

        fn anchored_entities(&self, _grid: Entity, tile: IVec2) -> Vec<Entity> {
            self.anchored.get(&tile).cloned().unwrap_or_default()
        }

        fn airtight_directions(&self, entity: Entity) -> Option<AtmosDirection> {
            self.airtight.get(&entity).copied()
        }

        fn is_airlock(&self, entity: Entity) -> bool {
            self.doors.contains(&entity)
        }

        fn has_any_tag(&self, entity: Entity, tags: &[String]) -> bool {
            self.tags
                .get(&entity)
                .is_some_and(|own| own.iter().any(|t| tags.contains(t)))
        }

        fn transform(&self, entity: Entity) -> Option<TransformInfo> {
            self.transforms.get(&entity).copied()
        }

        fn meta(&self, entity: Entity) -> Option<EntityMeta> {
            self.metas.get(&entity).cloned()
        }

        fn beacon(&self, entity: Entity) -> Option<&NavMapBeaconComponent> {
            self.beacons.get(&entity)
        }

        fn beacons_parented_to(&self, grid: Entity) -> Vec<Entity> {
            let mut found: Vec<Entity> = self
                .beacons
                .keys()
                .copied()
                .filter(|e| self.transforms.get(e).and_then(|t| t.parent) == Some(grid))
                .collect();
            found.sort();
            found
        }

        fn configurable_beacons(&self) -> Vec<Entity> {
            let mut found: Vec<Entity> = self
                .configurable
                .iter()
                .copied()
                .filter(|e| self.beacons.contains_key(e))
                .collect();
            found.sort();
            found
        }

        fn map_coordinates(&self, entity: Entity) -> Option<MapCoordinates> {
            self.transforms
                .get(&entity)
                .map(|t| MapCoordinates::new(t.local_position, t.map))
        }
    }
}
