//! Chunked navigation map for station grids.
//!
//! Each grid carries a [`NavMap`]: a sparse store of 8×8 chunks whose tiles
//! pack floor, wall, and airlock direction bits. The [`Reactor`] keeps it
//! consistent as tiles and anchored entities change, the beacon and region
//! registries track landmarks and named areas, [`snapshot`] builds full and
//! delta replication states, and [`query`] answers nearest-beacon lookups.
//! The [`ecs`] module wires all of it into a bevy `World`.

pub mod beacon;
pub mod chunk;
pub mod common;
pub mod ecs;
pub mod error;
pub mod host;
pub mod localize;
pub mod navmap;
pub mod query;
pub mod reactor;
pub mod region;
pub mod snapshot;
pub mod tile;

pub use beacon::{
    BeaconConfiguration, BeaconVisuals, ConfigurableNavMapBeacon, NavMapBeacon,
    NavMapBeaconComponent, try_create_beacon_data,
};
pub use chunk::{NavMapChunk, Tick, TileData};
pub use common::{Color, MapCoordinates, MapId, NetEntity};
pub use error::{NavMapError, SnapshotError};
pub use host::{EntityMeta, NavMapHost, TransformInfo};
pub use localize::{EnglishLocalizer, Localizer};
pub use navmap::NavMap;
pub use query::{Direction, NearestBeacon, describe_nearest_beacon, find_nearest_beacon};
pub use reactor::Reactor;
pub use region::{NavMapRegionOverlay, NavMapRegionProperties, UiKey};
pub use snapshot::{
    CURRENT_STATE_VERSION, NavMapComponentState, NavMapDeltaState, NavMapReplica, NavMapState,
    StateMessage, decode_state, encode_state,
};
pub use tile::{AtmosDirection, CHUNK_SIZE, NavMapChunkType};
