//! Resources, registration, and the per-tick nav-map system.

use bevy_ecs::prelude::*;
use station_config::{BeaconConfig, Config, RegionConfig};

use super::components::{MapGrid, MetaData, NetEntityAllocator, Transform, WarpPoint};
use super::events::{
    AirtightChanged, BeaconConfigureMessage, GridSplit, NavMapEvents, NavMapInput, TileChanged,
};
use super::world_host::WorldHost;
use crate::beacon::{
    BeaconVisuals, ConfigurableNavMapBeacon, NavMapBeaconComponent, log_configure_audit,
};
use crate::chunk::Tick;
use crate::error::NavMapError;
use crate::localize::{EnglishLocalizer, Localizer};
use crate::navmap::NavMap;
use crate::reactor::Reactor;
use crate::tile::validate_category_layout;

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Simulation tick source.
#[derive(Resource, Debug, Clone, Copy, Default)]
pub struct GameTiming {
    /// The tick currently being simulated.
    pub cur_tick: Tick,
}

impl GameTiming {
    /// Moves to the next tick and returns it.
    pub fn advance(&mut self) -> Tick {
        self.cur_tick = self.cur_tick.next();
        self.cur_tick
    }
}

/// Nav-map tuning, taken from [`Config`].
#[derive(Resource, Debug, Clone)]
pub struct NavMapSettings {
    /// Tags that classify an airtight entity as a wall.
    pub wall_tags: Vec<String>,
    /// Beacon description distance buckets.
    pub beacons: BeaconConfig,
    /// Default region limits.
    pub regions: RegionConfig,
}

impl From<&Config> for NavMapSettings {
    fn from(config: &Config) -> Self {
        Self {
            wall_tags: config.navmap.wall_tags.clone(),
            beacons: config.beacons.clone(),
            regions: config.regions.clone(),
        }
    }
}

impl Default for NavMapSettings {
    fn default() -> Self {
        Self::from(&Config::default())
    }
}

/// Active message table.
#[derive(Resource)]
pub struct LocalizerRes(pub Box<dyn Localizer + Send + Sync>);

impl Default for LocalizerRes {
    fn default() -> Self {
        Self(Box::new(EnglishLocalizer::new()))
    }
}

/// Validates the tile layout and inserts every nav-map resource that is
/// not already present.
///
/// # Errors
///
/// Returns [`NavMapError::CategoryMismatch`] or
/// [`NavMapError::OverlappingCategory`] if the tile bit layout is inconsistent.
pub fn register_nav_map(world: &mut World) -> Result<(), NavMapError> {
    validate_category_layout()?;
    world.init_resource::<GameTiming>();
    world.init_resource::<NavMapSettings>();
    world.init_resource::<LocalizerRes>();
    world.init_resource::<NavMapEvents>();
    world.init_resource::<NetEntityAllocator>();
    tracing::debug!("nav-map layer registered");
    Ok(())
}

// ---------------------------------------------------------------------------
// System
// ---------------------------------------------------------------------------

/// Drains queued [`NavMapInput`]s in send order and applies them.
///
/// **Stage:** Update (exclusive; reads host components, writes `NavMap`,
/// beacon components, and the [`NavMapEvents`] outbox).
pub fn nav_map_system(world: &mut World) {
    let Some(inputs) = world
        .get_resource_mut::<NavMapEvents>()
        .map(|mut events| events.take_pending())
    else {
        return;
    };

    for input in inputs {
        match input {
            NavMapInput::StationGridAdded(ev) => on_station_grid_added(world, ev.grid),
            NavMapInput::GridSplit(ev) => on_grid_split(world, &ev),
            NavMapInput::TileChanged(ev) => on_tile_changed(world, &ev),
            NavMapInput::AirtightChanged(ev) => on_airtight_changed(world, &ev),
            NavMapInput::MapInit(entity) => {
                on_beacon_map_init(world, entity);
                on_configurable_map_init(world, entity);
            }
            NavMapInput::AnchorStateChanged(entity) => on_beacon_anchor(world, entity),
            NavMapInput::BeaconConfigure(msg) => on_configure_message(world, &msg),
        }
    }
}

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

pub(crate) fn cur_tick(world: &World) -> Tick {
    world
        .get_resource::<GameTiming>()
        .map_or(Tick::ZERO, |t| t.cur_tick)
}

fn wall_tags(world: &World) -> Vec<String> {
    world
        .get_resource::<NavMapSettings>()
        .map(|s| s.wall_tags.clone())
        .unwrap_or_else(|| NavMapSettings::default().wall_tags)
}

/// Runs `f` on the grid's nav-map alongside a host view of the world.
/// The component is moved out for the call and put back afterwards.
pub(crate) fn with_nav_map<R>(
    world: &mut World,
    grid: Entity,
    f: impl FnOnce(&mut NavMap, &WorldHost<'_>) -> R,
) -> Option<R> {
    let mut nav = std::mem::take(&mut *world.get_mut::<NavMap>(grid)?);
    let result = f(&mut nav, &WorldHost::new(world));
    if let Some(mut slot) = world.get_mut::<NavMap>(grid) {
        *slot = nav;
    }
    Some(result)
}

/// Emits one [`NavMapDirtied`](super::NavMapDirtied) if `signalled`.
pub(crate) fn signal(world: &mut World, grid: Entity, signalled: bool) {
    if !signalled {
        return;
    }
    let tick = cur_tick(world);
    if let Some(mut events) = world.get_resource_mut::<NavMapEvents>() {
        events.push_dirtied(grid, tick);
    }
}

/// Adds an empty nav-map to `grid` if it has none. Returns `false` if the
/// entity is not a grid.
fn ensure_nav_map(world: &mut World, grid: Entity) -> bool {
    if world.get::<MapGrid>(grid).is_none() {
        return false;
    }
    if world.get::<NavMap>(grid).is_none() {
        let tick = cur_tick(world);
        world.entity_mut(grid).insert(NavMap::new(tick));
    }
    true
}

fn refresh_grid(world: &mut World, grid: Entity) {
    let tick = cur_tick(world);
    let tags = wall_tags(world);
    let signalled = with_nav_map(world, grid, |nav, host| {
        Reactor::new(host, &tags, tick).refresh_grid(nav, grid)
    });
    signal(world, grid, signalled.unwrap_or(false));
}

fn describe_entity(world: &World, entity: Entity) -> String {
    world
        .get::<MetaData>(entity)
        .map_or_else(|| format!("{entity:?}"), |m| format!("{} ({})", m.name, m.net_entity))
}

// ---------------------------------------------------------------------------
// Grid handlers
// ---------------------------------------------------------------------------

fn on_station_grid_added(world: &mut World, grid: Entity) {
    if !ensure_nav_map(world, grid) {
        tracing::warn!(?grid, "station grid has no tiles component, skipping nav-map");
        return;
    }
    refresh_grid(world, grid);
}

fn on_grid_split(world: &mut World, ev: &GridSplit) {
    if world.get::<NavMap>(ev.grid).is_none() {
        return;
    }

    for &new_grid in &ev.new_grids {
        if ensure_nav_map(world, new_grid) {
            refresh_grid(world, new_grid);
        }
    }
    refresh_grid(world, ev.grid);

    tracing::info!(grid = ?ev.grid, new_grids = ev.new_grids.len(), "nav-map grid split");
}

fn on_tile_changed(world: &mut World, ev: &TileChanged) {
    let tick = cur_tick(world);
    let tags = wall_tags(world);
    let signalled = with_nav_map(world, ev.grid, |nav, host| {
        Reactor::new(host, &tags, tick).on_tile_changed(nav, ev.grid, ev.tile, ev.empty_changed)
    });
    signal(world, ev.grid, signalled.unwrap_or(false));
}

fn on_airtight_changed(world: &mut World, ev: &AirtightChanged) {
    let tick = cur_tick(world);
    let tags = wall_tags(world);
    let signalled = with_nav_map(world, ev.grid, |nav, host| {
        Reactor::new(host, &tags, tick).on_airtight_changed(
            nav,
            ev.grid,
            ev.tile,
            ev.air_blocked_changed,
        )
    });
    signal(world, ev.grid, signalled.unwrap_or(false));
}

// ---------------------------------------------------------------------------
// Beacon handlers
// ---------------------------------------------------------------------------

/// Re-derives the registry entry of a beacon on its grid's nav-map.
pub(crate) fn update_beacon_data(world: &mut World, entity: Entity) {
    let Some(grid) = world.get::<Transform>(entity).and_then(|t| t.grid) else {
        return;
    };
    let tick = cur_tick(world);
    let signalled = with_nav_map(world, grid, |nav, host| nav.update_beacon(host, entity, tick));
    signal(world, grid, signalled.unwrap_or(false));
}

/// Recomputes [`BeaconVisuals`] from the enabled flag and anchoring.
pub(crate) fn update_beacon_visuals(world: &mut World, entity: Entity) {
    let Some(beacon) = world.get::<NavMapBeaconComponent>(entity) else {
        return;
    };
    let anchored = world.get::<Transform>(entity).is_some_and(|t| t.anchored);
    let visuals = beacon.visuals(anchored);

    match world.get_mut::<BeaconVisuals>(entity) {
        Some(mut current) => *current = visuals,
        None => {
            world.entity_mut(entity).insert(visuals);
        }
    }
}

fn on_beacon_map_init(world: &mut World, entity: Entity) {
    let resolved = {
        let Some(beacon) = world.get::<NavMapBeaconComponent>(entity) else {
            return;
        };
        let mut updated = beacon.clone();
        let changed = match world.get_resource::<LocalizerRes>() {
            Some(loc) => updated.apply_map_init(&*loc.0),
            None => updated.apply_map_init(&EnglishLocalizer::new()),
        };
        if !changed {
            return;
        }
        updated
    };

    if let Some(mut beacon) = world.get_mut::<NavMapBeaconComponent>(entity) {
        *beacon = resolved;
    }
    update_beacon_data(world, entity);
}

fn on_configurable_map_init(world: &mut World, entity: Entity) {
    if world.get::<ConfigurableNavMapBeacon>(entity).is_none() {
        return;
    }
    let Some(text) = world
        .get::<NavMapBeaconComponent>(entity)
        .map(|b| b.text.clone())
    else {
        return;
    };

    if let Some(mut warp) = world.get_mut::<WarpPoint>(entity) {
        warp.location = text;
    }
    update_beacon_visuals(world, entity);
}

fn on_beacon_anchor(world: &mut World, entity: Entity) {
    if world.get::<NavMapBeaconComponent>(entity).is_none() {
        return;
    }
    update_beacon_visuals(world, entity);
    update_beacon_data(world, entity);
}

fn on_configure_message(world: &mut World, msg: &BeaconConfigureMessage) {
    if world.get::<ConfigurableNavMapBeacon>(msg.beacon).is_none() {
        return;
    }
    let Some(mut updated) = world.get::<NavMapBeaconComponent>(msg.beacon).cloned() else {
        return;
    };
    if !updated.configure(&msg.config) {
        return;
    }

    log_configure_audit(
        &describe_entity(world, msg.actor),
        &describe_entity(world, msg.beacon),
        &msg.config,
    );

    if let Some(mut warp) = world.get_mut::<WarpPoint>(msg.beacon) {
        warp.location = msg.config.text.clone();
    }
    if let Some(mut beacon) = world.get_mut::<NavMapBeaconComponent>(msg.beacon) {
        *beacon = updated;
    }

    update_beacon_visuals(world, msg.beacon);
    update_beacon_data(world, msg.beacon);
}
