//! bevy_ecs integration: host components, the [`NavMapHost`](crate::NavMapHost)
//! implementation over a `World`, input events, and the exclusive system
//! that drives the reactor and beacon registry each tick.

mod api;
mod components;
mod events;
mod station;
mod systems;
mod world_host;


pub use api::{
    add_or_update_region, examine_beacon, get_nearest_beacon_string,
    get_region_overlays_by_ui_key, get_state, new_region, remove_region, set_beacon_enabled,
    toggle_beacon, try_get_nearest_beacon,
};
pub use components::{
    Airtight, MapGrid, MetaData, NavMapDoor, NetEntityAllocator, Tags, Tile, Transform, WarpPoint,
};
pub use events::{
    AirtightChanged, BeaconConfigureMessage, GridSplit, NavMapDirtied, NavMapEvents, NavMapInput,
    StationGridAdded, TileChanged,
};
pub use station::{
    PLATING, StationBuilder, build_wall, send_beacon_configure, set_air_blocked, set_anchored,
    set_tile, spawn_actor,
};
pub use systems::{GameTiming, LocalizerRes, NavMapSettings, nav_map_system, register_nav_map};
pub use world_host::WorldHost;
