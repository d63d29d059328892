//! The per-grid nav-map component and its chunk store.
//!
//! A [`NavMap`] owns its chunks, beacon records, and region tables outright.
//! Mutating operations return `true` when the change must be replicated;
//! the ECS layer turns each such signal into one `NavMapDirtied` event.

use bevy_ecs::prelude::*;
use glam::IVec2;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::beacon::NavMapBeacon;
use crate::chunk::{NavMapChunk, Tick};
use crate::common::NetEntity;
use crate::region::{NavMapRegionOverlay, NavMapRegionProperties};
use crate::tile::chunk_origin;

/// Navigation data for one grid.
#[derive(Component, Debug, Clone, Default)]
pub struct NavMap {
    /// Sparse chunk store. Never holds an all-zero chunk after a reactor pass.
    pub(crate) chunks: FxHashMap<IVec2, NavMapChunk>,
    /// Visible beacons keyed by their entity's network id.
    pub(crate) beacons: FxHashMap<NetEntity, NavMapBeacon>,
    /// Declared regions keyed by owner.
    pub(crate) region_properties: FxHashMap<NetEntity, NavMapRegionProperties>,
    /// Locally computed region fills keyed by owner.
    pub(crate) region_overlays: FxHashMap<NetEntity, NavMapRegionOverlay>,
    /// Chunks each region owner's fill touches.
    pub(crate) region_owner_to_chunks: FxHashMap<NetEntity, FxHashSet<IVec2>>,
    /// Region owners whose fill touches each chunk.
    pub(crate) chunk_to_region_owners: FxHashMap<IVec2, FxHashSet<NetEntity>>,
    /// Tick the component was created on. Observers older than this get full state.
    creation_tick: Tick,
    /// Tick of the most recent replication signal.
    last_dirty: Option<Tick>,
}

impl NavMap {
    /// Creates an empty nav-map stamped with its creation tick.
    pub fn new(creation_tick: Tick) -> Self {
        Self {
            creation_tick,
            ..Default::default()
        }
    }

    /// Tick this nav-map was created on.
    pub fn creation_tick(&self) -> Tick {
        self.creation_tick
    }

    /// Tick of the most recent replication signal, if any.
    pub fn last_dirty(&self) -> Option<Tick> {
        self.last_dirty
    }

    /// Records a replication signal for the whole component.
    pub fn mark_dirty(&mut self, tick: Tick) -> bool {
        self.last_dirty = Some(tick);
        true
    }

    // --- Chunk store ---

    /// Returns the chunk at `origin`, creating a zeroed one if absent.
    pub fn ensure_chunk(&mut self, origin: IVec2) -> &mut NavMapChunk {
        self.chunks
            .entry(origin)
            .or_insert_with(|| NavMapChunk::new(origin))
    }

    /// Stamps the chunk with `tick` and signals replication, unless it was
    /// already stamped this tick. Unknown origins never signal.
    pub fn dirty_chunk(&mut self, origin: IVec2, tick: Tick) -> bool {
        let Some(chunk) = self.chunks.get_mut(&origin) else {
            return false;
        };
        if chunk.last_update == Some(tick) {
            return false;
        }
        chunk.last_update = Some(tick);
        self.mark_dirty(tick)
    }

    /// Removes the chunk if every tile is zero. Returns whether it was pruned.
    pub fn prune_if_empty(&mut self, origin: IVec2, tick: Tick) -> bool {
        match self.chunks.get(&origin) {
            Some(chunk) if chunk.is_empty() => {
                self.chunks.remove(&origin);
                tracing::debug!(?origin, "pruned empty nav-map chunk");
                self.mark_dirty(tick)
            }
            _ => false,
        }
    }

    /// Drops every chunk and beacon record ahead of a full grid refresh.
    pub(crate) fn clear_chunks_and_beacons(&mut self) {
        self.chunks.clear();
        self.beacons.clear();
    }

    /// Chunk at `origin`.
    pub fn chunk(&self, origin: IVec2) -> Option<&NavMapChunk> {
        self.chunks.get(&origin)
    }

    /// Iterates over all `(origin, chunk)` pairs.
    pub fn chunks(&self) -> impl Iterator<Item = (&IVec2, &NavMapChunk)> {
        self.chunks.iter()
    }

    /// Number of stored chunks.
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Packed value of a grid tile, 0 when its chunk is absent.
    pub fn tile(&self, tile: IVec2) -> u32 {
        self.chunks
            .get(&chunk_origin(tile))
            .map_or(0, |chunk| chunk.tile(tile))
    }

    /// Returns `true` if an all-zero chunk is present (never expected).
    pub fn has_empty_chunk(&self) -> bool {
        self.chunks.values().any(NavMapChunk::is_empty)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::FLOOR_MASK;

    #[test]
    fn test_ensure_chunk_is_idempotent() {
        let mut nav = NavMap::new(Tick(1));
        let origin = IVec2::new(3, -2);
        *nav.ensure_chunk(origin).tile_mut(IVec2::new(24, -16)) = FLOOR_MASK;

        let again = nav.ensure_chunk(origin);
        assert_eq!(again.origin, origin);
        assert_eq!(again.tile(IVec2::new(24, -16)), FLOOR_MASK);
        assert_eq!(nav.chunk_count(), 1);
    }

    #[test]
    fn test_dirty_chunk_coalesces_within_tick() {
        let mut nav = NavMap::new(Tick(1));
        let origin = IVec2::ZERO;
        nav.ensure_chunk(origin);

        assert!(nav.dirty_chunk(origin, Tick(5)));
        assert!(!nav.dirty_chunk(origin, Tick(5)));
        assert_eq!(nav.last_dirty(), Some(Tick(5)));

        assert!(nav.dirty_chunk(origin, Tick(6)));
        assert_eq!(nav.chunk(origin).unwrap().last_update, Some(Tick(6)));
    }

    #[test]
    fn test_new_chunk_signals_on_tick_zero() {
        let mut nav = NavMap::new(Tick::ZERO);
        let origin = IVec2::ZERO;
        *nav.ensure_chunk(origin).tile_mut(IVec2::new(1, 1)) = FLOOR_MASK;

        assert!(nav.dirty_chunk(origin, Tick::ZERO));
        assert_eq!(nav.last_dirty(), Some(Tick::ZERO));
        assert!(!nav.dirty_chunk(origin, Tick::ZERO));
    }

    #[test]
    fn test_dirty_unknown_chunk_is_silent() {
        let mut nav = NavMap::new(Tick(1));
        assert!(!nav.dirty_chunk(IVec2::new(9, 9), Tick(2)));
        assert_eq!(nav.last_dirty(), None);
    }

    #[test]
    fn test_prune_only_removes_empty_chunks() {
        let mut nav = NavMap::new(Tick(1));
        let empty = IVec2::new(0, 0);
        let full = IVec2::new(1, 0);
        nav.ensure_chunk(empty);
        *nav.ensure_chunk(full).tile_mut(IVec2::new(8, 0)) = FLOOR_MASK;

        assert!(nav.prune_if_empty(empty, Tick(2)));
        assert!(!nav.prune_if_empty(full, Tick(2)));
        assert!(!nav.prune_if_empty(IVec2::new(5, 5), Tick(2)));
        assert!(nav.chunk(empty).is_none());
        assert!(nav.chunk(full).is_some());
        assert!(!nav.has_empty_chunk());
    }

    #[test]
    fn test_tile_lookup_of_absent_chunk_is_zero() {
        let nav = NavMap::new(Tick::ZERO);
        assert_eq!(nav.tile(IVec2::new(-40, 12)), 0);
    }
}
