//! Small value types shared by the registries, the query engine, and the wire format.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Stable network identifier of an entity. Registries reference entities
/// only through this id, never by ownership.
#[derive(
    Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default,
)]
pub struct NetEntity(pub u64);

impl std::fmt::Display for NetEntity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "net:{}", self.0)
    }
}

/// Identifier of a map (a disjoint world space holding grids).
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct MapId(pub u32);

/// A world position qualified by the map it lies on.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct MapCoordinates {
    /// World-space position.
    pub position: Vec2,
    /// Map the position belongs to.
    pub map: MapId,
}

impl MapCoordinates {
    /// Creates map coordinates.
    pub fn new(position: Vec2, map: MapId) -> Self {
        Self { position, map }
    }
}

/// 8-bit RGBA color.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Color {
    /// Red.
    pub r: u8,
    /// Green.
    pub g: u8,
    /// Blue.
    pub b: u8,
    /// Alpha.
    pub a: u8,
}

impl Color {
    /// Opaque white.
    pub const WHITE: Self = Self::rgb(0xFF, 0xFF, 0xFF);

    /// Opaque color from components.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 0xFF }
    }

    /// `#rrggbb`, alpha dropped.
    pub fn to_hex_no_alpha(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}
