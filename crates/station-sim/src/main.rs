//! Headless station nav-map harness.
//!
//! Builds a demo station, runs a deterministic schedule of hull breaches,
//! repairs, construction, door cycling and beacon edits, and keeps a set of
//! simulated observers in sync through encoded full/delta states. Exits
//! non-zero if any replica diverges from the server-side map.
//!
//! Run with: `cargo run -p station-sim -- --ticks 200 --observers 3`

mod layout;
mod observer;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use bevy_ecs::prelude::*;
use clap::Parser;
use glam::{IVec2, Vec2};
use station_config::{CliArgs, Config, default_config_dir};
use station_navmap::ecs::{
    self, GameTiming, LocalizerRes, NavMapEvents, NavMapSettings, PLATING, Tile,
};
use station_navmap::{
    BeaconConfiguration, EnglishLocalizer, MapCoordinates, NavMap, NavMapBeaconComponent,
};
use tracing::{error, info, warn};

use layout::Station;
use observer::Observer;

/// Hull tiles in the cargo bay that breach and get repaired in turn.
const BREACH_TILES: [IVec2; 4] = [
    IVec2::new(12, -6),
    IVec2::new(13, -6),
    IVec2::new(19, -3),
    IVec2::new(19, -4),
];

/// Ticks between checks of the config file for edits.
const RELOAD_INTERVAL: u64 = 60;

/// Config as read from disk (before CLI overrides) and the directory it
/// came from. The directory is `None` when no file backs the config.
fn load_config(args: &CliArgs) -> (Config, Option<PathBuf>) {
    let Some(dir) = args.config.clone().or_else(default_config_dir) else {
        return (Config::default(), None);
    };
    match Config::load_or_create(&dir) {
        Ok(config) => (config, Some(dir)),
        Err(err) => {
            eprintln!("config error ({err}), using defaults");
            (Config::default(), None)
        }
    }
}

/// Picks up edits to the config file and pushes the nav-map settings into
/// the world. Returns the new on-disk config when it changed.
fn reload_config(world: &mut World, file_config: &Config, dir: &Path, args: &CliArgs) -> Option<Config> {
    match file_config.reload(dir) {
        Ok(Some(reloaded)) => {
            let mut effective = reloaded.clone();
            effective.apply_cli_overrides(args);
            world.insert_resource(NavMapSettings::from(&effective));
            info!("nav-map settings reloaded");
            Some(reloaded)
        }
        Ok(None) => None,
        Err(err) => {
            warn!(%err, "config reload failed, keeping current settings");
            None
        }
    }
}

/// Wall built at tick `n*10 + 3` and unanchored three ticks later.
#[derive(Resource)]
struct PendingDeconstruct(Entity);

fn mutate(world: &mut World, station: &Station, actor: Entity, tick: u64) {
    let breach = BREACH_TILES[(tick / 10) as usize % BREACH_TILES.len()];

    match tick % 10 {
        0 => ecs::set_tile(world, station.grid, breach, Tile::SPACE),
        2 => ecs::set_tile(world, station.grid, breach, PLATING),
        3 => {
            let wall = ecs::build_wall(world, station.grid, IVec2::new(15, 4));
            world.insert_resource(PendingDeconstruct(wall));
        }
        4 => ecs::set_air_blocked(world, station.airlock, tick % 20 == 4),
        5 => {
            let label = if tick % 20 == 5 { "Cargo Bay" } else { "Cargo" };
            ecs::send_beacon_configure(
                world,
                actor,
                station.cargo_beacon,
                BeaconConfiguration {
                    text: Some(label.to_string()),
                    color: NavMapBeaconComponent::DEFAULT_COLOR,
                    enabled: true,
                },
            );
        }
        6 => {
            if let Some(PendingDeconstruct(wall)) = world.remove_resource::<PendingDeconstruct>() {
                ecs::set_anchored(world, wall, false);
            }
        }
        7 => {
            ecs::toggle_beacon(world, station.bridge_beacon);
        }
        8 if tick % 30 == 8 => {
            if let Err(err) = ecs::remove_region(world, station.grid, station.region_owner) {
                warn!(%err, "region removal failed");
            }
        }
        9 if tick % 30 == 9 => {
            layout::declare_region(world, station);
        }
        _ => {}
    }
}

fn sync_observers(world: &World, station: &Station, observers: &mut [Observer], tick: u64) -> bool {
    let mut ok = true;
    for observer in observers.iter_mut().filter(|o| o.due(tick)) {
        if let Err(err) = observer.sync(world, station.grid) {
            error!(observer = observer.id, %err, "sync failed");
            ok = false;
        }
    }
    ok
}

fn main() -> ExitCode {
    let args = CliArgs::parse();
    let (mut file_config, config_dir) = load_config(&args);
    let mut config = file_config.clone();
    config.apply_cli_overrides(&args);

    station_log::init_logging(
        args.log_dir.as_deref(),
        cfg!(debug_assertions),
        Some(&config),
    );

    if let Err(err) = config.beacons.validate() {
        error!(%err, "invalid configuration");
        return ExitCode::FAILURE;
    }

    info!(
        "Station nav-map sim: {} ticks, {} observers",
        config.sim.ticks, config.sim.observers
    );

    let mut world = World::new();
    world.insert_resource(NavMapSettings::from(&config));
    world.insert_resource(LocalizerRes(Box::new(
        EnglishLocalizer::new().with_entry(layout::MEDBAY_TEXT_KEY, "Medbay"),
    )));
    if let Err(err) = ecs::register_nav_map(&mut world) {
        error!(%err, "nav-map registration failed");
        return ExitCode::FAILURE;
    }

    let mut schedule = Schedule::default();
    schedule.add_systems(ecs::nav_map_system);

    let station = layout::build(&mut world);
    let actor = ecs::spawn_actor(&mut world, "Chief Engineer");
    schedule.run(&mut world);
    layout::declare_region(&mut world, &station);

    let mut observers: Vec<Observer> = (0..config.sim.observers).map(Observer::new).collect();
    let mut healthy = sync_observers(&world, &station, &mut observers, 0);

    for _ in 0..config.sim.ticks {
        let tick = world.resource_mut::<GameTiming>().advance();
        mutate(&mut world, &station, actor, tick.0);
        schedule.run(&mut world);

        let dirtied = world.resource_mut::<NavMapEvents>().drain_dirtied();
        if !dirtied.is_empty() {
            tracing::debug!(%tick, signals = dirtied.len(), "nav-map dirtied");
        }
        healthy &= sync_observers(&world, &station, &mut observers, tick.0);

        if tick.0 % RELOAD_INTERVAL == 0
            && let Some(dir) = &config_dir
            && let Some(reloaded) = reload_config(&mut world, &file_config, dir, &args)
        {
            file_config = reloaded;
        }
    }

    // Final catch-up so every observer is compared at the same tick.
    for observer in &mut observers {
        if let Err(err) = observer.sync(&world, station.grid) {
            error!(observer = observer.id, %err, "final sync failed");
            healthy = false;
        }
    }

    let Some(nav) = world.get::<NavMap>(station.grid) else {
        error!("station grid lost its nav-map");
        return ExitCode::FAILURE;
    };
    info!(
        chunks = nav.chunk_count(),
        beacons = nav.beacons().count(),
        "final nav-map"
    );

    for observer in &observers {
        observer.log_summary();
        if !observer.in_sync(nav) {
            error!(observer = observer.id, "replica diverged from server state");
            healthy = false;
        }
    }

    for (label, position) in [
        ("bridge", Vec2::new(105.5, -36.0)),
        ("corridor", Vec2::new(116.0, -36.0)),
        ("deep space", Vec2::new(100.0, 60.0)),
    ] {
        let coords = MapCoordinates::new(position, layout::STATION_MAP);
        info!(label, "{}", ecs::get_nearest_beacon_string(&world, coords));
    }
    if let Some(text) = ecs::examine_beacon(&world, station.medbay_beacon) {
        info!("medbay beacon: {text}");
    }
    if nav.has_empty_chunk() {
        warn!("nav-map holds an empty chunk");
        healthy = false;
    }

    if healthy {
        info!("all observers in sync");
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
