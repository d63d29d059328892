//! Error types for the nav-map layer.
//!
//! Lookups that can legitimately miss (nearest beacon, absent chunks) return
//! `Option`/`bool`. These errors cover startup validation, API calls naming a
//! grid that carries no nav-map, and wire decoding.

use bevy_ecs::entity::Entity;

use crate::tile::NavMapChunkType;

/// Errors raised by nav-map setup and the public ECS API.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum NavMapError {
    /// The category constant disagrees with the defined chunk types.
    #[error("CATEGORIES must equal the number of chunk types: expected {expected}, found {found}")]
    CategoryMismatch {
        /// Value of the constant.
        expected: usize,
        /// Number of real categories.
        found: usize,
    },
    /// A category's bit field is empty or overlaps another.
    #[error("chunk category {0:?} overlaps another category's bit field")]
    OverlappingCategory(NavMapChunkType),
    /// The entity has no nav-map component.
    #[error("entity {0:?} has no nav-map")]
    MissingNavMap(Entity),
}

/// Errors raised while encoding or decoding replication payloads.
#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    /// Payload version is newer than this build understands.
    #[error("state version {found} is newer than max supported {max_supported}")]
    VersionTooNew {
        /// Version found in the payload.
        found: u32,
        /// Maximum version this build supports.
        max_supported: u32,
    },
    /// postcard failed to serialize or deserialize.
    #[error("serialization error: {0}")]
    Serialization(#[from] postcard::Error),
    /// LZ4 frame was malformed.
    #[error("LZ4 decompression failed: {0}")]
    Decompression(String),
    /// A delta arrived before any full state.
    #[error("delta state received without a full-state baseline")]
    DeltaWithoutBaseline,
}
