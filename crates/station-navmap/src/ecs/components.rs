//! Host-engine components the nav-map layer reads.

use bevy_ecs::prelude::*;
use glam::{IVec2, Vec2};
use rustc_hash::{FxHashMap, FxHashSet};

use crate::common::{MapId, NetEntity};
use crate::tile::AtmosDirection;

/// A tile definition reference. Id 0 is space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Tile {
    /// Tile definition id.
    pub type_id: u16,
}

impl Tile {
    /// No floor.
    pub const SPACE: Self = Self { type_id: 0 };

    /// Creates a tile of the given definition.
    pub const fn new(type_id: u16) -> Self {
        Self { type_id }
    }

    /// Returns `true` for space.
    pub const fn is_space(self) -> bool {
        self.type_id == 0
    }
}

/// A grid: its tiles and the entities anchored to them.
#[derive(Component, Debug, Clone, Default)]
pub struct MapGrid {
    tiles: FxHashMap<IVec2, Tile>,
    anchored: FxHashMap<IVec2, Vec<Entity>>,
}

impl MapGrid {
    /// Creates an empty grid.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tile at `pos`, space when unset.
    pub fn tile(&self, pos: IVec2) -> Tile {
        self.tiles.get(&pos).copied().unwrap_or(Tile::SPACE)
    }

    /// Sets a tile and returns the previous one. Space removes the entry.
    pub fn set_tile(&mut self, pos: IVec2, tile: Tile) -> Tile {
        let old = if tile.is_space() {
            self.tiles.remove(&pos)
        } else {
            self.tiles.insert(pos, tile)
        };
        old.unwrap_or(Tile::SPACE)
    }

    /// Positions of every non-space tile.
    pub fn tiles(&self) -> impl Iterator<Item = IVec2> + '_ {
        self.tiles.keys().copied()
    }

    /// Number of non-space tiles.
    pub fn tile_count(&self) -> usize {
        self.tiles.len()
    }

    /// Records `entity` as anchored at `pos`.
    pub fn anchor(&mut self, pos: IVec2, entity: Entity) {
        let list = self.anchored.entry(pos).or_default();
        if !list.contains(&entity) {
            list.push(entity);
        }
    }

    /// Removes `entity` from the anchored list at `pos`.
    pub fn unanchor(&mut self, pos: IVec2, entity: Entity) {
        if let Some(list) = self.anchored.get_mut(&pos) {
            list.retain(|e| *e != entity);
            if list.is_empty() {
                self.anchored.remove(&pos);
            }
        }
    }

    /// Entities anchored at `pos`.
    pub fn anchored_at(&self, pos: IVec2) -> &[Entity] {
        self.anchored.get(&pos).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// Position in the transform hierarchy.
#[derive(Component, Debug, Clone, Copy, PartialEq)]
pub struct Transform {
    /// Map the entity lives on.
    pub map: MapId,
    /// Transform parent.
    pub parent: Option<Entity>,
    /// Owning grid.
    pub grid: Option<Entity>,
    /// Position relative to the parent.
    pub local_position: Vec2,
    /// Rotation relative to the parent, radians.
    pub local_rotation: f32,
    /// Anchored to the grid.
    pub anchored: bool,
}

impl Transform {
    /// Root transform of a grid.
    pub fn grid_root(map: MapId, position: Vec2, rotation: f32) -> Self {
        Self {
            map,
            parent: None,
            grid: None,
            local_position: position,
            local_rotation: rotation,
            anchored: false,
        }
    }

    /// Transform of an entity placed at the centre of `tile` on `grid`.
    pub fn on_grid(map: MapId, grid: Entity, tile: IVec2, anchored: bool) -> Self {
        Self {
            map,
            parent: Some(grid),
            grid: Some(grid),
            local_position: tile.as_vec2() + Vec2::splat(0.5),
            local_rotation: 0.0,
            anchored,
        }
    }

    /// Grid tile containing the local position.
    pub fn tile(&self) -> IVec2 {
        self.local_position.floor().as_ivec2()
    }
}

/// Atmospheric blocking.
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Airtight {
    /// Directions blocked when the entity is sealed.
    pub air_blocked_direction: AtmosDirection,
    /// Whether it currently blocks air (doors toggle this).
    pub air_blocked: bool,
}

impl Airtight {
    /// Blocks every direction.
    pub fn full() -> Self {
        Self {
            air_blocked_direction: AtmosDirection::ALL,
            air_blocked: true,
        }
    }
}

/// Airlock capability.
#[derive(Component, Debug, Clone, Copy, Default)]
pub struct NavMapDoor;

/// Prototype tags.
#[derive(Component, Debug, Clone, Default)]
pub struct Tags(pub FxHashSet<String>);

impl Tags {
    /// Tag set from names.
    pub fn new<I, S>(tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(tags.into_iter().map(Into::into).collect())
    }

    /// Returns `true` if any of `tags` is present.
    pub fn has_any(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.0.contains(t))
    }
}

/// Name and network identity.
#[derive(Component, Debug, Clone, PartialEq, Eq)]
pub struct MetaData {
    /// Generic display name.
    pub name: String,
    /// Stable network id.
    pub net_entity: NetEntity,
}

/// Ghost-warp destination kept in sync with the beacon label.
#[derive(Component, Debug, Clone, Default, PartialEq, Eq)]
pub struct WarpPoint {
    /// Location label.
    pub location: Option<String>,
}

/// Hands out network ids.
#[derive(Resource, Debug, Default)]
pub struct NetEntityAllocator {
    next: u64,
}

impl NetEntityAllocator {
    /// Next unused id, starting at 1.
    pub fn allocate(&mut self) -> NetEntity {
        self.next += 1;
        NetEntity(self.next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_tile_reports_previous() {
        let mut grid = MapGrid::new();
        let pos = IVec2::new(1, -1);
        assert_eq!(grid.set_tile(pos, Tile::new(3)), Tile::SPACE);
        assert_eq!(grid.set_tile(pos, Tile::SPACE), Tile::new(3));
        assert_eq!(grid.tile_count(), 0);
    }

    #[test]
    fn test_anchor_index() {
        let mut world = World::new();
        let a = world.spawn_empty().id();
        let b = world.spawn_empty().id();
        let mut grid = MapGrid::new();
        grid.anchor(IVec2::ZERO, a);
        grid.anchor(IVec2::ZERO, a);
        grid.anchor(IVec2::ZERO, b);
        assert_eq!(grid.anchored_at(IVec2::ZERO), &[a, b]);

        grid.unanchor(IVec2::ZERO, a);
        grid.unanchor(IVec2::ZERO, b);
        assert!(grid.anchored_at(IVec2::ZERO).is_empty());
    }

    #[test]
    fn test_entity_on_grid_sits_in_tile_centre() {
        let grid = Entity::from_raw(7);
        let t = Transform::on_grid(MapId(1), grid, IVec2::new(-2, 3), true);
        assert_eq!(t.local_position, Vec2::new(-1.5, 3.5));
        assert_eq!(t.tile(), IVec2::new(-2, 3));
    }
}
