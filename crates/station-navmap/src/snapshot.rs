//! Full and delta replication states, their wire envelope, and the
//! receiving replica.
//!
//! An observer that has never seen the nav-map (or last saw it before it
//! was created) gets a [`NavMapState`]. Otherwise it gets a
//! [`NavMapDeltaState`] with only the chunks stamped since its last
//! acknowledged tick. Beacons and regions are always sent whole, and a
//! delta lists every live chunk origin so the receiver can drop pruned ones.

use glam::IVec2;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};

use crate::beacon::NavMapBeacon;
use crate::chunk::{Tick, TileData};
use crate::common::NetEntity;
use crate::error::SnapshotError;
use crate::navmap::NavMap;
use crate::region::NavMapRegionProperties;

/// Current wire format version.
pub const CURRENT_STATE_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// States
// ---------------------------------------------------------------------------

/// Complete replicated contents of a nav-map.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct NavMapState {
    /// Tile data of every chunk.
    pub chunks: FxHashMap<IVec2, TileData>,
    /// Every beacon entry.
    pub beacons: FxHashMap<NetEntity, NavMapBeacon>,
    /// Every region declaration.
    pub regions: FxHashMap<NetEntity, NavMapRegionProperties>,
}

/// Changes since an observer's last acknowledged tick.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Default)]
pub struct NavMapDeltaState {
    /// Chunks stamped at or after the cutoff tick.
    pub modified_chunks: FxHashMap<IVec2, TileData>,
    /// Every beacon entry.
    pub beacons: FxHashMap<NetEntity, NavMapBeacon>,
    /// Every region declaration.
    pub regions: FxHashMap<NetEntity, NavMapRegionProperties>,
    /// Origins of every chunk currently in the store.
    pub all_chunks: FxHashSet<IVec2>,
}

/// Either kind of replication state.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub enum NavMapComponentState {
    /// Full state.
    Full(NavMapState),
    /// Delta state.
    Delta(NavMapDeltaState),
}

impl NavMapDeltaState {
    /// Applies this delta in place: drops chunks no longer present, writes
    /// modified chunks, and replaces beacons and regions wholesale.
    pub fn apply_to_full_state(&self, state: &mut NavMapState) {
        state
            .chunks
            .retain(|origin, _| self.all_chunks.contains(origin));
        for (origin, data) in &self.modified_chunks {
            state.chunks.insert(*origin, *data);
        }
        state.beacons.clone_from(&self.beacons);
        state.regions.clone_from(&self.regions);
    }

    /// Builds the full state this delta produces on top of `state`,
    /// leaving `state` untouched.
    pub fn create_new_full_state(&self, state: &NavMapState) -> NavMapState {
        let mut chunks: FxHashMap<IVec2, TileData> = state
            .chunks
            .iter()
            .filter(|(origin, _)| self.all_chunks.contains(*origin))
            .map(|(origin, data)| (*origin, *data))
            .collect();
        for (origin, data) in &self.modified_chunks {
            chunks.insert(*origin, *data);
        }

        NavMapState {
            chunks,
            beacons: self.beacons.clone(),
            regions: self.regions.clone(),
        }
    }
}

impl NavMap {
    /// Full contents of this nav-map.
    pub fn full_state(&self) -> NavMapState {
        NavMapState {
            chunks: self
                .chunks
                .iter()
                .map(|(origin, chunk)| (*origin, chunk.tile_data))
                .collect(),
            beacons: self.beacons.clone(),
            regions: self.region_properties.clone(),
        }
    }

    /// State for an observer whose last acknowledged tick is `from_tick`.
    pub fn get_state(&self, from_tick: Tick) -> NavMapComponentState {
        if from_tick <= self.creation_tick() {
            return NavMapComponentState::Full(self.full_state());
        }

        let modified_chunks = self
            .chunks
            .iter()
            .filter(|(_, chunk)| chunk.last_update.is_some_and(|t| t >= from_tick))
            .map(|(origin, chunk)| (*origin, chunk.tile_data))
            .collect();

        NavMapComponentState::Delta(NavMapDeltaState {
            modified_chunks,
            beacons: self.beacons.clone(),
            regions: self.region_properties.clone(),
            all_chunks: self.chunks.keys().copied().collect(),
        })
    }
}

// ---------------------------------------------------------------------------
// Wire envelope
// ---------------------------------------------------------------------------

/// Versioned state message sent to one observer.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StateMessage {
    /// Format version.
    pub version: u32,
    /// Server tick the state describes.
    pub to_tick: Tick,
    /// The state itself.
    pub state: NavMapComponentState,
}

impl StateMessage {
    /// Wraps a state at the current format version.
    pub fn new(to_tick: Tick, state: NavMapComponentState) -> Self {
        Self {
            version: CURRENT_STATE_VERSION,
            to_tick,
            state,
        }
    }
}

/// Serializes with postcard and compresses with LZ4 (size-prepended).
///
/// # Errors
///
/// Returns [`SnapshotError::Serialization`] if postcard fails.
pub fn encode_state(message: &StateMessage) -> Result<Vec<u8>, SnapshotError> {
    let bytes = postcard::to_allocvec(message)?;
    Ok(lz4_flex::compress_prepend_size(&bytes))
}

/// Inverse of [`encode_state`].
///
/// # Errors
///
/// Returns [`SnapshotError`] on a malformed LZ4 frame, a postcard failure
/// (including chunk arrays of the wrong length), or a version newer than
/// [`CURRENT_STATE_VERSION`].
pub fn decode_state(compressed: &[u8]) -> Result<StateMessage, SnapshotError> {
    let bytes = lz4_flex::decompress_size_prepended(compressed)
        .map_err(|e| SnapshotError::Decompression(e.to_string()))?;
    let message: StateMessage = postcard::from_bytes(&bytes)?;
    check_version(message.version)?;
    Ok(message)
}

/// Validates that the message version is supported.
///
/// # Errors
///
/// Returns [`SnapshotError::VersionTooNew`] if it exceeds [`CURRENT_STATE_VERSION`].
pub fn check_version(version: u32) -> Result<(), SnapshotError> {
    if version > CURRENT_STATE_VERSION {
        return Err(SnapshotError::VersionTooNew {
            found: version,
            max_supported: CURRENT_STATE_VERSION,
        });
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Replica
// ---------------------------------------------------------------------------

/// Receiver-side reconstruction of one nav-map.
#[derive(Debug, Clone, Default)]
pub struct NavMapReplica {
    state: Option<NavMapState>,
    last_tick: Tick,
}

impl NavMapReplica {
    /// Creates a replica that has seen nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tick to request the next state from.
    pub fn last_tick(&self) -> Tick {
        self.last_tick
    }

    /// Reconstructed state, if a full state has arrived.
    pub fn state(&self) -> Option<&NavMapState> {
        self.state.as_ref()
    }

    /// Applies a decoded message.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DeltaWithoutBaseline`] for a delta received
    /// before any full state.
    pub fn apply(&mut self, message: StateMessage) -> Result<(), SnapshotError> {
        let next = match message.state {
            NavMapComponentState::Full(full) => full,
            NavMapComponentState::Delta(delta) => {
                let base = self
                    .state
                    .as_ref()
                    .ok_or(SnapshotError::DeltaWithoutBaseline)?;
                delta.create_new_full_state(base)
            }
        };
        self.state = Some(next);
        self.last_tick = message.to_tick;
        Ok(())
    }

    /// Decodes and applies an encoded message.
    ///
    /// # Errors
    ///
    /// See [`decode_state`] and [`NavMapReplica::apply`].
    pub fn apply_bytes(&mut self, bytes: &[u8]) -> Result<(), SnapshotError> {
        let message = decode_state(bytes)?;
        self.apply(message)
    }
}
