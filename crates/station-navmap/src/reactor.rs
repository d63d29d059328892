//! Incremental maintenance of a nav-map as its grid mutates.
//!
//! Two event kinds drive the reactor: a tile gaining or losing its floor, and
//! an anchored airtight entity changing what it blocks. Each handler edits the
//! single affected tile, prunes the chunk if it emptied, and stamps it dirty.
//! Every handler returns `true` when replication was signalled.

use bevy_ecs::entity::Entity;
use glam::IVec2;

use crate::chunk::Tick;
use crate::host::NavMapHost;
use crate::navmap::NavMap;
use crate::tile::{FLOOR_MASK, NavMapChunkType, apply_airlock_precedence, chunk_origin};

/// Grid mutation handlers bound to one host, tick, and wall tag set.
pub struct Reactor<'a, H: NavMapHost + ?Sized> {
    host: &'a H,
    wall_tags: &'a [String],
    tick: Tick,
}

impl<'a, H: NavMapHost + ?Sized> Reactor<'a, H> {
    /// Creates a reactor for the current tick.
    pub fn new(host: &'a H, wall_tags: &'a [String], tick: Tick) -> Self {
        Self {
            host,
            wall_tags,
            tick,
        }
    }

    /// Handles a tile whose floor state may have changed.
    ///
    /// Only empty/non-empty transitions are processed. A tile that became
    /// space is zeroed; a tile that gained floor is rebuilt from scratch.
    pub fn on_tile_changed(
        &self,
        nav: &mut NavMap,
        grid: Entity,
        tile: IVec2,
        empty_changed: bool,
    ) -> bool {
        if !empty_changed {
            return false;
        }

        let origin = chunk_origin(tile);
        let signalled = if self.host.is_space(grid, tile) {
            let Some(chunk) = nav.chunks.get_mut(&origin) else {
                return false;
            };
            *chunk.tile_mut(tile) = 0;
            nav.prune_if_empty(origin, self.tick) || nav.dirty_chunk(origin, self.tick)
        } else {
            self.refresh_tile_entity_contents(nav, grid, tile, true);
            nav.dirty_chunk(origin, self.tick)
        };

        nav.refresh_regions_in_chunk(origin);
        signalled
    }

    /// Handles an airtight entity change at `tile`.
    ///
    /// A pure door open/close toggle (`air_blocked_changed`) is ignored: the
    /// map records structure, not door state.
    pub fn on_airtight_changed(
        &self,
        nav: &mut NavMap,
        grid: Entity,
        tile: IVec2,
        air_blocked_changed: bool,
    ) -> bool {
        if air_blocked_changed {
            return false;
        }

        let origin = chunk_origin(tile);
        let existed = nav.chunk(origin).is_some();
        let value = self.refresh_tile_entity_contents(nav, grid, tile, false);
        if value == 0 && !existed {
            nav.chunks.remove(&origin);
            return false;
        }
        let signalled = if value == 0 && nav.prune_if_empty(origin, self.tick) {
            true
        } else {
            nav.dirty_chunk(origin, self.tick)
        };

        nav.refresh_regions_in_chunk(origin);
        signalled
    }

    /// Recomputes the wall and airlock bits of `tile` from the entities
    /// anchored there, returning the new packed value.
    ///
    /// With `set_floor` the floor field is set in full; otherwise the
    /// existing floor bits are kept.
    pub fn refresh_tile_entity_contents(
        &self,
        nav: &mut NavMap,
        grid: Entity,
        tile: IVec2,
        set_floor: bool,
    ) -> u32 {
        let mut value = if set_floor {
            FLOOR_MASK
        } else {
            nav.tile(tile) & FLOOR_MASK
        };

        for entity in self.host.anchored_entities(grid, tile) {
            let Some(directions) = self.host.airtight_directions(entity) else {
                continue;
            };
            let category = self.host.chunk_type(entity, self.wall_tags);
            if category == NavMapChunkType::Invalid {
                continue;
            }
            value |= category.encode(directions);
        }

        let value = apply_airlock_precedence(value);
        *nav.ensure_chunk(chunk_origin(tile)).tile_mut(tile) = value;
        value
    }

    /// Rebuilds the whole nav-map of `grid`: chunks, beacons, and region fills.
    ///
    /// Every touched chunk is stamped with the current tick; replication is
    /// signalled once.
    pub fn refresh_grid(&self, nav: &mut NavMap, grid: Entity) -> bool {
        nav.clear_chunks_and_beacons();

        for beacon in self.host.beacons_parented_to(grid) {
            nav.update_beacon(self.host, beacon, self.tick);
        }

        for tile in self.host.grid_tiles(grid) {
            nav.ensure_chunk(chunk_origin(tile)).last_update = Some(self.tick);
            self.refresh_tile_entity_contents(nav, grid, tile, true);
        }

        nav.refresh_all_regions();

        tracing::info!(
            ?grid,
            chunks = nav.chunk_count(),
            beacons = nav.beacons.len(),
            tick = %self.tick,
            "refreshed nav-map"
        );
        nav.mark_dirty(self.tick)
    }
}
