//! Tile coordinate mapping and per-tile bit encoding.
//!
//! A grid is cut into [`CHUNK_SIZE`]×[`CHUNK_SIZE`] chunks. Each tile inside a
//! chunk is one `u32` packing three categories of four direction bits:
//!
//! ```text
//! bit  11..8     7..4    3..0
//!      Airlock   Wall    Floor
//!      W E S N   W E S N W E S N
//! ```

use glam::IVec2;
use serde::{Deserialize, Serialize};

use crate::error::NavMapError;

/// Number of real chunk categories (Floor, Wall, Airlock).
pub const CATEGORIES: usize = 3;

/// Direction bits per category. Not tied to the atmospherics direction count.
pub const DIRECTIONS: u32 = 4;

/// Side length of a chunk in tiles.
pub const CHUNK_SIZE: i32 = 8;

/// Number of tiles in a chunk.
pub const ARRAY_SIZE: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize;

/// All four direction bits of a single category.
pub const ALL_DIR_MASK: u32 = (1 << DIRECTIONS) - 1;
/// Floor field.
pub const FLOOR_MASK: u32 = ALL_DIR_MASK << NavMapChunkType::Floor.bit_offset();
/// Wall field.
pub const WALL_MASK: u32 = ALL_DIR_MASK << NavMapChunkType::Wall.bit_offset();
/// Airlock field.
pub const AIRLOCK_MASK: u32 = ALL_DIR_MASK << NavMapChunkType::Airlock.bit_offset();

// ---------------------------------------------------------------------------
// Chunk categories
// ---------------------------------------------------------------------------

/// Semantic category of a tile's bit field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NavMapChunkType {
    /// The entity contributes nothing to the map.
    Invalid,
    /// Walkable floor.
    Floor,
    /// Wall or window.
    Wall,
    /// Door or airlock.
    Airlock,
}

impl NavMapChunkType {
    /// Every category that owns a bit field, in bit order.
    pub const ALL: [NavMapChunkType; 3] = [Self::Floor, Self::Wall, Self::Airlock];

    /// Bit offset of this category's field. `Invalid` has no field and maps to 0.
    pub const fn bit_offset(self) -> u32 {
        match self {
            Self::Invalid | Self::Floor => 0,
            Self::Wall => DIRECTIONS,
            Self::Airlock => 2 * DIRECTIONS,
        }
    }

    /// Mask of this category's field, or 0 for `Invalid`.
    pub const fn mask(self) -> u32 {
        match self {
            Self::Invalid => 0,
            _ => ALL_DIR_MASK << self.bit_offset(),
        }
    }

    /// Places a 4-bit direction mask into this category's field.
    pub const fn encode(self, directions: AtmosDirection) -> u32 {
        match self {
            Self::Invalid => 0,
            _ => ((directions.bits() as u32) & ALL_DIR_MASK) << self.bit_offset(),
        }
    }

    /// Extracts this category's 4-bit direction mask from a tile value.
    pub const fn decode(self, tile: u32) -> AtmosDirection {
        AtmosDirection::from_bits(((tile & self.mask()) >> self.bit_offset()) as u8)
    }
}

/// Verifies that [`CATEGORIES`] matches the defined chunk types and that no
/// two category fields overlap. Run once at startup.
pub fn validate_category_layout() -> Result<(), NavMapError> {
    let found = NavMapChunkType::ALL.len();
    if found != CATEGORIES {
        return Err(NavMapError::CategoryMismatch {
            expected: CATEGORIES,
            found,
        });
    }

    let mut seen = 0u32;
    for category in NavMapChunkType::ALL {
        let mask = category.mask();
        if mask == 0 || seen & mask != 0 {
            return Err(NavMapError::OverlappingCategory(category));
        }
        seen |= mask;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Directions
// ---------------------------------------------------------------------------

/// Four-bit cardinal direction mask (North = +y).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct AtmosDirection(u8);

impl AtmosDirection {
    /// No direction.
    pub const INVALID: Self = Self(0);
    /// +y.
    pub const NORTH: Self = Self(1 << 0);
    /// -y.
    pub const SOUTH: Self = Self(1 << 1);
    /// +x.
    pub const EAST: Self = Self(1 << 2);
    /// -x.
    pub const WEST: Self = Self(1 << 3);
    /// Every direction.
    pub const ALL: Self = Self(0b1111);

    /// The four single-bit directions.
    pub const CARDINALS: [Self; 4] = [Self::NORTH, Self::SOUTH, Self::EAST, Self::WEST];

    /// Builds a mask, discarding bits above the fourth.
    pub const fn from_bits(bits: u8) -> Self {
        Self(bits & 0b1111)
    }

    /// Raw bits.
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns `true` if no bit is set.
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Union of two masks.
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    /// Opposite of a single cardinal direction; multi-bit masks are mirrored bitwise.
    pub const fn opposite(self) -> Self {
        let n = self.0 & 1;
        let s = (self.0 >> 1) & 1;
        let e = (self.0 >> 2) & 1;
        let w = (self.0 >> 3) & 1;
        Self(s | (n << 1) | (w << 2) | (e << 3))
    }

    /// Unit tile step of a single cardinal direction.
    pub fn offset(self) -> IVec2 {
        match self {
            Self::NORTH => IVec2::Y,
            Self::SOUTH => IVec2::NEG_Y,
            Self::EAST => IVec2::X,
            Self::WEST => IVec2::NEG_X,
            _ => IVec2::ZERO,
        }
    }
}

impl std::ops::BitOr for AtmosDirection {
    type Output = Self;
    fn bitor(self, rhs: Self) -> Self {
        self.union(rhs)
    }
}

// ---------------------------------------------------------------------------
// Coordinate mapping
// ---------------------------------------------------------------------------

/// Chunk origin (in chunk space) that owns `tile`. Floor division, so
/// negative tiles land in negative chunks.
#[inline]
pub fn chunk_origin(tile: IVec2) -> IVec2 {
    tile.div_euclid(IVec2::splat(CHUNK_SIZE))
}

/// Position of `tile` inside its chunk, each component in `[0, CHUNK_SIZE)`.
#[inline]
pub fn chunk_relative(tile: IVec2) -> IVec2 {
    tile - chunk_origin(tile) * CHUNK_SIZE
}

/// Recombines a chunk origin and a relative position into a grid tile.
#[inline]
pub fn tile_from_chunk(origin: IVec2, relative: IVec2) -> IVec2 {
    origin * CHUNK_SIZE + relative
}

/// Flat index of a chunk-relative tile.
#[inline]
pub fn tile_index(relative: IVec2) -> usize {
    debug_assert!(
        relative.cmpge(IVec2::ZERO).all() && relative.cmplt(IVec2::splat(CHUNK_SIZE)).all()
    );
    (relative.x * CHUNK_SIZE + relative.y) as usize
}

/// Inverse of [`tile_index`].
#[inline]
pub fn tile_from_index(index: usize) -> IVec2 {
    let index = index as i32;
    IVec2::new(index / CHUNK_SIZE, index % CHUNK_SIZE)
}

/// Clears wall bits in every direction that also carries an airlock bit.
///
/// Doors never double as walls in the same direction.
#[inline]
pub fn apply_airlock_precedence(tile: u32) -> u32 {
    let shift = NavMapChunkType::Airlock.bit_offset() - NavMapChunkType::Wall.bit_offset();
    let shifted_airlock_bits = (tile & AIRLOCK_MASK) >> shift;
    tile & !shifted_airlock_bits
}

/// Union of the wall and airlock fields as a direction mask.
#[inline]
pub fn blocked_directions(tile: u32) -> AtmosDirection {
    NavMapChunkType::Wall
        .decode(tile)
        .union(NavMapChunkType::Airlock.decode(tile))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masks_do_not_overlap() {
        assert_eq!(FLOOR_MASK, 0x00F);
        assert_eq!(WALL_MASK, 0x0F0);
        assert_eq!(AIRLOCK_MASK, 0xF00);
        assert!(validate_category_layout().is_ok());
    }

    #[test]
    fn test_index_roundtrip_covers_whole_chunk() {
        for x in 0..CHUNK_SIZE {
            for y in 0..CHUNK_SIZE {
                let relative = IVec2::new(x, y);
                let index = tile_index(relative);
                assert!(index < ARRAY_SIZE);
                assert_eq!(tile_from_index(index), relative);
                assert_eq!(tile_index(tile_from_index(index)), index);
            }
        }
    }

    #[test]
    fn test_origin_and_relative_recombine() {
        for tile in [
            IVec2::new(0, 0),
            IVec2::new(7, 7),
            IVec2::new(8, 0),
            IVec2::new(-1, -1),
            IVec2::new(-8, -9),
            IVec2::new(123, -456),
        ] {
            let origin = chunk_origin(tile);
            let relative = chunk_relative(tile);
            assert!(relative.x >= 0 && relative.x < CHUNK_SIZE, "{tile}");
            assert!(relative.y >= 0 && relative.y < CHUNK_SIZE, "{tile}");
            assert_eq!(tile_from_chunk(origin, relative), tile);
        }
    }

    #[test]
    fn test_negative_tiles_use_floor_division() {
        assert_eq!(chunk_origin(IVec2::new(-1, 0)), IVec2::new(-1, 0));
        assert_eq!(chunk_relative(IVec2::new(-1, 0)), IVec2::new(7, 0));
        assert_eq!(chunk_origin(IVec2::new(-8, 8)), IVec2::new(-1, 1));
        assert_eq!(chunk_relative(IVec2::new(-8, 8)), IVec2::new(0, 0));
    }

    #[test]
    fn test_airlock_clears_overlapping_wall_bits() {
        let tile = FLOOR_MASK
            | NavMapChunkType::Wall.encode(AtmosDirection::ALL)
            | NavMapChunkType::Airlock.encode(AtmosDirection::NORTH);
        let result = apply_airlock_precedence(tile);

        let walls = NavMapChunkType::Wall.decode(result);
        assert!(!walls.contains(AtmosDirection::NORTH));
        assert!(walls.contains(AtmosDirection::SOUTH | AtmosDirection::EAST | AtmosDirection::WEST));
        assert_eq!(NavMapChunkType::Airlock.decode(result), AtmosDirection::NORTH);
        assert_eq!(result & FLOOR_MASK, FLOOR_MASK);
    }

    #[test]
    fn test_encode_decode_per_category() {
        let dirs = AtmosDirection::EAST | AtmosDirection::SOUTH;
        for category in NavMapChunkType::ALL {
            assert_eq!(category.decode(category.encode(dirs)), dirs);
        }
        assert_eq!(NavMapChunkType::Invalid.encode(dirs), 0);
    }

    #[test]
    fn test_opposite_direction() {
        assert_eq!(AtmosDirection::NORTH.opposite(), AtmosDirection::SOUTH);
        assert_eq!(AtmosDirection::EAST.opposite(), AtmosDirection::WEST);
        assert_eq!(AtmosDirection::ALL.opposite(), AtmosDirection::ALL);
        for dir in AtmosDirection::CARDINALS {
            assert_eq!(dir.offset() + dir.opposite().offset(), IVec2::ZERO);
        }
    }
}
