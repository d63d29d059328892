//! Command-line argument parsing for the station tools.

use std::path::PathBuf;

use clap::Parser;

use crate::Config;

/// Station nav-map command-line arguments.
///
/// CLI values override settings loaded from `navmap.ron`.
#[derive(Parser, Debug, Default)]
#[command(name = "station-sim", about = "Headless station nav-map harness")]
pub struct CliArgs {
    /// Number of ticks to simulate.
    #[arg(long)]
    pub ticks: Option<u64>,

    /// Number of simulated replication observers.
    #[arg(long)]
    pub observers: Option<u32>,

    /// Distance below which positions are reported as near a beacon.
    #[arg(long)]
    pub close_distance: Option<f32>,

    /// Distance above which directions get the far modifier.
    #[arg(long)]
    pub far_distance: Option<f32>,

    /// Log level (error, warn, info, debug, trace).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Directory for JSON log files (debug builds only).
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Path to config directory (overrides default location).
    #[arg(long)]
    pub config: Option<PathBuf>,
}

impl Config {
    /// Apply CLI overrides to a loaded config.
    pub fn apply_cli_overrides(&mut self, args: &CliArgs) {
        if let Some(ticks) = args.ticks {
            self.sim.ticks = ticks;
        }
        if let Some(observers) = args.observers {
            self.sim.observers = observers;
        }
        if let Some(close) = args.close_distance {
            self.beacons.close_distance = close;
        }
        if let Some(far) = args.far_distance {
            self.beacons.far_distance = far;
        }
        if let Some(ref level) = args.log_level {
            self.debug.log_level = level.clone();
        }
    }
}
