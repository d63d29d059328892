//! Named regions and their locally computed flood-fill overlays.
//!
//! A region is declared by its owner with a set of seed tiles and growth
//! limits. The overlay is derived by flooding outward over floor tiles,
//! stopping at walls and airlocks. Two reverse indices (owner → chunks,
//! chunk → owners) let chunk edits recompute only the overlays they touch,
//! and let removal unlink an owner in one pass.

use std::collections::VecDeque;

use glam::IVec2;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::chunk::Tick;
use crate::common::{Color, NetEntity};
use crate::navmap::NavMap;
use crate::tile::{
    ALL_DIR_MASK, AtmosDirection, FLOOR_MASK, NavMapChunkType, blocked_directions, chunk_origin,
};

/// Default cap on filled tiles.
pub const DEFAULT_MAX_AREA: u32 = 625;
/// Default cap on distance from the seed, in tiles.
pub const DEFAULT_MAX_RADIUS: u32 = 25;

/// UI context a region belongs to.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct UiKey(pub String);

impl UiKey {
    /// Creates a key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }
}

/// Replicated declaration of a region.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct NavMapRegionProperties {
    /// Owning entity.
    pub owner: NetEntity,
    /// UI context.
    pub ui_key: UiKey,
    /// Tiles the fill starts from.
    pub seeds: FxHashSet<IVec2>,
    /// Overlay color.
    pub color: Color,
    /// Maximum number of tiles assigned to the region.
    pub max_area: u32,
    /// Maximum distance from the originating seed.
    pub max_radius: u32,
}

impl NavMapRegionProperties {
    /// Region with default color and limits.
    pub fn new(owner: NetEntity, ui_key: UiKey, seeds: impl IntoIterator<Item = IVec2>) -> Self {
        Self {
            owner,
            ui_key,
            seeds: seeds.into_iter().collect(),
            color: Color::WHITE,
            max_area: DEFAULT_MAX_AREA,
            max_radius: DEFAULT_MAX_RADIUS,
        }
    }

    /// Overrides the growth limits.
    pub fn with_limits(mut self, max_area: u32, max_radius: u32) -> Self {
        self.max_area = max_area;
        self.max_radius = max_radius;
        self
    }

    /// Overrides the color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }
}

/// Tiles covered by a region, computed locally from the chunk store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavMapRegionOverlay {
    /// UI context, copied from the properties.
    pub ui_key: UiKey,
    /// Overlay color, copied from the properties.
    pub color: Color,
    /// Filled grid tiles.
    pub tiles: FxHashSet<IVec2>,
}

// ---------------------------------------------------------------------------
// Flood fill
// ---------------------------------------------------------------------------

struct FloodResult {
    tiles: FxHashSet<IVec2>,
    chunks: FxHashSet<IVec2>,
}

/// A tile can hold region area if it has floor and is not sealed on all sides.
fn fillable(value: u32) -> bool {
    value & FLOOR_MASK != 0
        && (value & NavMapChunkType::Wall.mask()) >> NavMapChunkType::Wall.bit_offset()
            != ALL_DIR_MASK
        && (value & NavMapChunkType::Airlock.mask()) >> NavMapChunkType::Airlock.bit_offset()
            != ALL_DIR_MASK
}

fn edge_blocked(from: u32, to: u32, dir: AtmosDirection) -> bool {
    blocked_directions(from).contains(dir) || blocked_directions(to).contains(dir.opposite())
}

fn flood_fill(nav: &NavMap, props: &NavMapRegionProperties) -> FloodResult {
    let mut tiles = FxHashSet::default();
    let mut chunks = FxHashSet::default();
    let mut visited = FxHashSet::default();
    let mut queue = VecDeque::new();
    let max_radius_sq = i64::from(props.max_radius) * i64::from(props.max_radius);
    let max_area = props.max_area as usize;

    let mut seeds: Vec<IVec2> = props.seeds.iter().copied().collect();
    seeds.sort_by_key(|s| (s.x, s.y));
    for seed in seeds {
        chunks.insert(chunk_origin(seed));
        if fillable(nav.tile(seed)) && visited.insert(seed) {
            queue.push_back((seed, seed));
        }
    }

    while let Some((tile, seed)) = queue.pop_front() {
        if tiles.len() >= max_area {
            break;
        }
        tiles.insert(tile);
        let value = nav.tile(tile);

        for dir in AtmosDirection::CARDINALS {
            let next = tile + dir.offset();
            chunks.insert(chunk_origin(next));
            if visited.contains(&next) {
                continue;
            }
            let d = (next - seed).as_i64vec2();
            if d.length_squared() > max_radius_sq {
                continue;
            }
            let next_value = nav.tile(next);
            if !fillable(next_value) || edge_blocked(value, next_value, dir) {
                continue;
            }
            visited.insert(next);
            queue.push_back((next, seed));
        }
    }

    FloodResult { tiles, chunks }
}

// ---------------------------------------------------------------------------
// Registry operations
// ---------------------------------------------------------------------------

impl NavMap {
    /// Inserts or replaces a region. Signals replication when it was absent
    /// or differs from the stored one; the overlay is always recomputed.
    pub fn add_or_update_region(
        &mut self,
        owner: NetEntity,
        properties: NavMapRegionProperties,
        tick: Tick,
    ) -> bool {
        let dirty = self.region_properties.get(&owner) != Some(&properties);
        self.region_properties.insert(owner, properties);
        self.recompute_region(owner);

        if !dirty {
            return false;
        }
        tracing::debug!(%owner, "region updated");
        self.mark_dirty(tick)
    }

    /// Removes a region, its overlay, and every reverse-index link to it.
    pub fn remove_region(&mut self, owner: NetEntity, tick: Tick) -> bool {
        let removed = self.region_properties.remove(&owner).is_some()
            | self.region_overlays.remove(&owner).is_some();
        if !removed {
            return false;
        }

        self.unlink_region(owner);
        tracing::debug!(%owner, "region removed");
        self.mark_dirty(tick)
    }

    /// Overlays whose UI key matches, keyed by owner.
    pub fn region_overlays_by_ui_key(
        &self,
        ui_key: &UiKey,
    ) -> FxHashMap<NetEntity, NavMapRegionOverlay> {
        self.region_overlays
            .iter()
            .filter(|(_, overlay)| &overlay.ui_key == ui_key)
            .map(|(owner, overlay)| (*owner, overlay.clone()))
            .collect()
    }

    /// Declared properties of a region.
    pub fn region(&self, owner: NetEntity) -> Option<&NavMapRegionProperties> {
        self.region_properties.get(&owner)
    }

    /// Current overlay of a region.
    pub fn region_overlay(&self, owner: NetEntity) -> Option<&NavMapRegionOverlay> {
        self.region_overlays.get(&owner)
    }

    /// Chunks linked to a region owner.
    pub fn region_chunks(&self, owner: NetEntity) -> Option<&FxHashSet<IVec2>> {
        self.region_owner_to_chunks.get(&owner)
    }

    /// Region owners linked to a chunk.
    pub fn chunk_region_owners(&self, origin: IVec2) -> Option<&FxHashSet<NetEntity>> {
        self.chunk_to_region_owners.get(&origin)
    }

    /// Recomputes every overlay linked to the chunk at `origin`.
    pub fn refresh_regions_in_chunk(&mut self, origin: IVec2) {
        let Some(owners) = self.chunk_to_region_owners.get(&origin) else {
            return;
        };
        let mut owners: Vec<NetEntity> = owners.iter().copied().collect();
        owners.sort();
        for owner in owners {
            self.recompute_region(owner);
        }
    }

    /// Recomputes every overlay.
    pub fn refresh_all_regions(&mut self) {
        let mut owners: Vec<NetEntity> = self.region_properties.keys().copied().collect();
        owners.sort();
        for owner in owners {
            self.recompute_region(owner);
        }
    }

    fn recompute_region(&mut self, owner: NetEntity) {
        self.unlink_region(owner);
        let Some(props) = self.region_properties.get(&owner) else {
            return;
        };

        let FloodResult { tiles, chunks } = flood_fill(self, props);
        let overlay = NavMapRegionOverlay {
            ui_key: props.ui_key.clone(),
            color: props.color,
            tiles,
        };

        for origin in &chunks {
            self.chunk_to_region_owners
                .entry(*origin)
                .or_default()
                .insert(owner);
        }
        self.region_owner_to_chunks.insert(owner, chunks);
        self.region_overlays.insert(owner, overlay);
    }

    fn unlink_region(&mut self, owner: NetEntity) {
        let Some(chunks) = self.region_owner_to_chunks.remove(&owner) else {
            return;
        };
        for origin in chunks {
            if let Some(owners) = self.chunk_to_region_owners.get_mut(&origin) {
                owners.remove(&owner);
                if owners.is_empty() {
                    self.chunk_to_region_owners.remove(&origin);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tile::{CHUNK_SIZE, WALL_MASK};

    fn floor_rect(nav: &mut NavMap, min: IVec2, max: IVec2) {
        for x in min.x..=max.x {
            for y in min.y..=max.y {
                let tile = IVec2::new(x, y);
                *nav.ensure_chunk(chunk_origin(tile)).tile_mut(tile) = FLOOR_MASK;
            }
        }
    }

    fn set(nav: &mut NavMap, tile: IVec2, value: u32) {
        *nav.ensure_chunk(chunk_origin(tile)).tile_mut(tile) = value;
    }

    fn region(owner: u64, seed: IVec2) -> NavMapRegionProperties {
        NavMapRegionProperties::new(NetEntity(owner), UiKey::new("crew-monitor"), [seed])
    }

    #[test]
    fn test_fill_stops_at_wall() {
        let mut nav = NavMap::new(Tick(1));
        floor_rect(&mut nav, IVec2::new(0, 0), IVec2::new(6, 2));
        for y in 0..=2 {
            set(&mut nav, IVec2::new(3, y), FLOOR_MASK | WALL_MASK);
        }

        nav.add_or_update_region(NetEntity(1), region(1, IVec2::new(0, 1)), Tick(2));
        let overlay = nav.region_overlay(NetEntity(1)).unwrap();
        assert_eq!(overlay.tiles.len(), 9);
        assert!(overlay.tiles.iter().all(|t| t.x < 3));
    }

    #[test]
    fn test_directional_wall_blocks_only_its_edge() {
        let mut nav = NavMap::new(Tick(1));
        floor_rect(&mut nav, IVec2::new(0, 0), IVec2::new(1, 0));
        set(
            &mut nav,
            IVec2::new(1, 0),
            FLOOR_MASK | NavMapChunkType::Wall.encode(AtmosDirection::WEST),
        );

        nav.add_or_update_region(NetEntity(1), region(1, IVec2::ZERO), Tick(2));
        assert_eq!(nav.region_overlay(NetEntity(1)).unwrap().tiles.len(), 1);
    }

    #[test]
    fn test_fill_respects_area_and_radius() {
        let mut nav = NavMap::new(Tick(1));
        floor_rect(&mut nav, IVec2::new(-20, -20), IVec2::new(20, 20));

        nav.add_or_update_region(NetEntity(1), region(1, IVec2::ZERO).with_limits(10, 25), Tick(2));
        assert_eq!(nav.region_overlay(NetEntity(1)).unwrap().tiles.len(), 10);

        nav.add_or_update_region(NetEntity(2), region(2, IVec2::ZERO).with_limits(10_000, 2), Tick(2));
        let tiles = &nav.region_overlay(NetEntity(2)).unwrap().tiles;
        assert_eq!(tiles.len(), 13);
        assert!(tiles.iter().all(|t| t.length_squared() <= 4));
    }

    #[test]
    fn test_upsert_signals_only_on_change() {
        let mut nav = NavMap::new(Tick(1));
        floor_rect(&mut nav, IVec2::ZERO, IVec2::new(2, 2));

        assert!(nav.add_or_update_region(NetEntity(5), region(5, IVec2::ZERO), Tick(2)));
        assert!(!nav.add_or_update_region(NetEntity(5), region(5, IVec2::ZERO), Tick(3)));
        assert!(nav.add_or_update_region(
            NetEntity(5),
            region(5, IVec2::ZERO).with_color(Color::rgb(9, 9, 9)),
            Tick(4)
        ));
        assert_eq!(nav.last_dirty(), Some(Tick(4)));
    }

    #[test]
    fn test_remove_clears_both_reverse_indices() {
        let mut nav = NavMap::new(Tick(1));
        // A corridor spanning three chunks along x.
        floor_rect(&mut nav, IVec2::new(0, 0), IVec2::new(3 * CHUNK_SIZE - 1, 0));
        let owner = NetEntity(3);
        let props = region(3, IVec2::new(CHUNK_SIZE, 0)).with_limits(625, 100);
        nav.add_or_update_region(owner, props, Tick(2));

        let linked: Vec<IVec2> = nav.region_chunks(owner).unwrap().iter().copied().collect();
        for origin in [IVec2::new(0, 0), IVec2::new(1, 0), IVec2::new(2, 0)] {
            assert!(linked.contains(&origin));
        }

        assert!(nav.remove_region(owner, Tick(3)));
        assert!(nav.region_chunks(owner).is_none());
        for origin in linked {
            assert!(
                nav.chunk_region_owners(origin)
                    .is_none_or(|owners| !owners.contains(&owner))
            );
        }
        assert!(nav.region(owner).is_none());
        assert!(nav.region_overlay(owner).is_none());
        assert!(!nav.remove_region(owner, Tick(4)));
    }

    #[test]
    fn test_overlays_filtered_by_ui_key() {
        let mut nav = NavMap::new(Tick(1));
        floor_rect(&mut nav, IVec2::ZERO, IVec2::new(4, 4));
        nav.add_or_update_region(NetEntity(1), region(1, IVec2::ZERO), Tick(2));
        let mut other = region(2, IVec2::new(4, 4));
        other.ui_key = UiKey::new("atmos-monitor");
        nav.add_or_update_region(NetEntity(2), other, Tick(2));

        let overlays = nav.region_overlays_by_ui_key(&UiKey::new("crew-monitor"));
        assert_eq!(overlays.len(), 1);
        assert!(overlays.contains_key(&NetEntity(1)));
    }

    #[test]
    fn test_chunk_refresh_regrows_overlay() {
        let mut nav = NavMap::new(Tick(1));
        floor_rect(&mut nav, IVec2::ZERO, IVec2::new(4, 0));
        set(&mut nav, IVec2::new(2, 0), FLOOR_MASK | WALL_MASK);
        nav.add_or_update_region(NetEntity(1), region(1, IVec2::ZERO), Tick(2));
        assert_eq!(nav.region_overlay(NetEntity(1)).unwrap().tiles.len(), 2);

        set(&mut nav, IVec2::new(2, 0), FLOOR_MASK);
        nav.refresh_regions_in_chunk(IVec2::ZERO);
        assert_eq!(nav.region_overlay(NetEntity(1)).unwrap().tiles.len(), 5);
    }
}
