//! Public nav-map operations for other game systems.
//!
//! Lookups that can miss return `Option`/`bool`. Calls naming a grid that
//! carries no nav-map return [`NavMapError::MissingNavMap`].

use bevy_ecs::prelude::*;
use glam::IVec2;
use rustc_hash::FxHashMap;
use station_config::BeaconConfig;

use super::systems::{
    LocalizerRes, NavMapSettings, cur_tick, signal, update_beacon_data, update_beacon_visuals,
};
use super::world_host::WorldHost;
use crate::beacon::{ConfigurableNavMapBeacon, NavMapBeaconComponent};
use crate::chunk::Tick;
use crate::common::{MapCoordinates, NetEntity};
use crate::error::NavMapError;
use crate::localize::EnglishLocalizer;
use crate::navmap::NavMap;
use crate::query::{NearestBeacon, describe_nearest_beacon, find_nearest_beacon};
use crate::region::{NavMapRegionOverlay, NavMapRegionProperties, UiKey};
use crate::snapshot::NavMapComponentState;

// --- Beacons ---

/// Describes `coordinates` relative to the nearest visible beacon, e.g.
/// for announcements.
pub fn get_nearest_beacon_string(world: &World, coordinates: MapCoordinates) -> String {
    let host = WorldHost::new(world);
    let distances = world
        .get_resource::<NavMapSettings>()
        .map_or_else(BeaconConfig::default, |s| s.beacons.clone());

    match world.get_resource::<LocalizerRes>() {
        Some(loc) => describe_nearest_beacon(&host, coordinates, &*loc.0, &distances),
        None => describe_nearest_beacon(&host, coordinates, &EnglishLocalizer::new(), &distances),
    }
}

/// Nearest visible configurable beacon on the same map as `coordinates`.
pub fn try_get_nearest_beacon(world: &World, coordinates: MapCoordinates) -> Option<NearestBeacon> {
    find_nearest_beacon(&WorldHost::new(world), coordinates)
}

/// Sets a beacon's enabled flag and refreshes its visuals and registry
/// entry. Returns `false` if the entity is not a beacon or nothing changed.
pub fn set_beacon_enabled(world: &mut World, entity: Entity, enabled: bool) -> bool {
    let changed = world
        .get_mut::<NavMapBeaconComponent>(entity)
        .is_some_and(|mut beacon| beacon.set_enabled(enabled));
    if !changed {
        return false;
    }

    update_beacon_visuals(world, entity);
    update_beacon_data(world, entity);
    true
}

/// Flips a beacon's enabled flag.
pub fn toggle_beacon(world: &mut World, entity: Entity) -> bool {
    let Some(enabled) = world.get::<NavMapBeaconComponent>(entity).map(|b| b.enabled) else {
        return false;
    };
    set_beacon_enabled(world, entity, !enabled)
}

/// Examine description of a configurable beacon.
pub fn examine_beacon(world: &World, entity: Entity) -> Option<String> {
    world.get::<ConfigurableNavMapBeacon>(entity)?;
    let beacon = world.get::<NavMapBeaconComponent>(entity)?;
    Some(match world.get_resource::<LocalizerRes>() {
        Some(loc) => beacon.examine_text(&*loc.0),
        None => beacon.examine_text(&EnglishLocalizer::new()),
    })
}

// --- Regions ---

/// Region declaration using the configured default limits.
pub fn new_region(
    world: &World,
    owner: NetEntity,
    ui_key: UiKey,
    seeds: impl IntoIterator<Item = IVec2>,
) -> NavMapRegionProperties {
    let props = NavMapRegionProperties::new(owner, ui_key, seeds);
    match world.get_resource::<NavMapSettings>() {
        Some(settings) => props.with_limits(
            settings.regions.default_max_area,
            settings.regions.default_max_radius,
        ),
        None => props,
    }
}

/// Inserts or replaces a region on `grid`.
///
/// # Errors
///
/// Returns [`NavMapError::MissingNavMap`] if `grid` has no nav-map.
pub fn add_or_update_region(
    world: &mut World,
    grid: Entity,
    owner: NetEntity,
    properties: NavMapRegionProperties,
) -> Result<bool, NavMapError> {
    let tick = cur_tick(world);
    let signalled = world
        .get_mut::<NavMap>(grid)
        .ok_or(NavMapError::MissingNavMap(grid))?
        .add_or_update_region(owner, properties, tick);
    signal(world, grid, signalled);
    Ok(signalled)
}

/// Removes a region and its reverse-index links from `grid`.
///
/// # Errors
///
/// Returns [`NavMapError::MissingNavMap`] if `grid` has no nav-map.
pub fn remove_region(world: &mut World, grid: Entity, owner: NetEntity) -> Result<bool, NavMapError> {
    let tick = cur_tick(world);
    let signalled = world
        .get_mut::<NavMap>(grid)
        .ok_or(NavMapError::MissingNavMap(grid))?
        .remove_region(owner, tick);
    signal(world, grid, signalled);
    Ok(signalled)
}

/// Region overlays on `grid` matching `ui_key`.
///
/// # Errors
///
/// Returns [`NavMapError::MissingNavMap`] if `grid` has no nav-map.
pub fn get_region_overlays_by_ui_key(
    world: &World,
    grid: Entity,
    ui_key: &UiKey,
) -> Result<FxHashMap<NetEntity, NavMapRegionOverlay>, NavMapError> {
    let nav = world
        .get::<NavMap>(grid)
        .ok_or(NavMapError::MissingNavMap(grid))?;
    Ok(nav.region_overlays_by_ui_key(ui_key))
}

// --- Replication ---

/// Replication state for an observer that last acknowledged `from_tick`.
///
/// # Errors
///
/// Returns [`NavMapError::MissingNavMap`] if `grid` has no nav-map.
pub fn get_state(
    world: &World,
    grid: Entity,
    from_tick: Tick,
) -> Result<NavMapComponentState, NavMapError> {
    world
        .get::<NavMap>(grid)
        .map(|nav| nav.get_state(from_tick))
        .ok_or(NavMapError::MissingNavMap(grid))
}
