//! Fixed-size nav-map chunk storage and the simulation tick counter.

use glam::IVec2;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::tile::{ARRAY_SIZE, chunk_relative, tile_index};

// ---------------------------------------------------------------------------
// Tick
// ---------------------------------------------------------------------------

/// Discrete simulation step, used for dirty coalescing and replication cutoffs.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Tick(pub u64);

impl Tick {
    /// The first tick.
    pub const ZERO: Self = Self(0);

    /// The following tick.
    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Tick {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// TileData
// ---------------------------------------------------------------------------

/// The 64 packed tile values of one chunk.
///
/// Serialized as a length-prefixed sequence; decoding rejects any length
/// other than [`ARRAY_SIZE`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TileData(pub [u32; ARRAY_SIZE]);

impl TileData {
    /// All tiles zero.
    pub const EMPTY: Self = Self([0; ARRAY_SIZE]);

    /// Returns `true` if every tile value is zero.
    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|&v| v == 0)
    }

    /// Number of non-zero tiles.
    pub fn occupied(&self) -> usize {
        self.0.iter().filter(|&&v| v != 0).count()
    }
}

impl Default for TileData {
    fn default() -> Self {
        Self::EMPTY
    }
}

impl std::ops::Index<usize> for TileData {
    type Output = u32;
    fn index(&self, index: usize) -> &u32 {
        &self.0[index]
    }
}

impl std::ops::IndexMut<usize> for TileData {
    fn index_mut(&mut self, index: usize) -> &mut u32 {
        &mut self.0[index]
    }
}

impl Serialize for TileData {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.0.as_slice().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for TileData {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let values = Vec::<u32>::deserialize(deserializer)?;
        let len = values.len();
        let array: [u32; ARRAY_SIZE] = values.try_into().map_err(|_| {
            serde::de::Error::invalid_length(len, &"exactly 64 tile values")
        })?;
        Ok(Self(array))
    }
}

// ---------------------------------------------------------------------------
// NavMapChunk
// ---------------------------------------------------------------------------

/// One 8×8 block of a grid's navigation data.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavMapChunk {
    /// Chunk-space coordinate (tile coordinate floor-divided by chunk size).
    pub origin: IVec2,
    /// Packed per-tile category bits.
    pub tile_data: TileData,
    /// Tick of the last replicated modification, `None` until first stamped.
    pub last_update: Option<Tick>,
}

impl NavMapChunk {
    /// Creates a zeroed chunk at `origin`.
    pub fn new(origin: IVec2) -> Self {
        Self {
            origin,
            tile_data: TileData::EMPTY,
            last_update: None,
        }
    }

    /// Packed value of a grid tile that belongs to this chunk.
    pub fn tile(&self, tile: IVec2) -> u32 {
        self.tile_data[tile_index(chunk_relative(tile))]
    }

    /// Mutable packed value of a grid tile that belongs to this chunk.
    pub fn tile_mut(&mut self, tile: IVec2) -> &mut u32 {
        &mut self.tile_data[tile_index(chunk_relative(tile))]
    }

    /// Returns `true` if every tile value is zero.
    pub fn is_empty(&self) -> bool {
        self.tile_data.is_empty()
    }
}
