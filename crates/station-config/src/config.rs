//! Configuration structs with sensible defaults and RON persistence.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// File name of the persisted configuration inside the config directory.
const CONFIG_FILE: &str = "navmap.ron";

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    /// Chunk classification settings.
    pub navmap: NavMapConfig,
    /// Beacon query settings.
    pub beacons: BeaconConfig,
    /// Region defaults.
    pub regions: RegionConfig,
    /// Debug/development settings.
    pub debug: DebugConfig,
    /// Headless harness settings.
    pub sim: SimConfig,
}

/// Nav-map classification configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct NavMapConfig {
    /// Tags that make an airtight entity count as a wall.
    pub wall_tags: Vec<String>,
}

/// Distance buckets used when describing a position relative to a beacon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BeaconConfig {
    /// Below this distance the position is reported as "near" the beacon.
    pub close_distance: f32,
    /// Above this distance the direction gets the "far" modifier.
    pub far_distance: f32,
}

/// Defaults applied to newly declared regions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RegionConfig {
    /// Maximum number of tiles a region may flood into.
    pub default_max_area: u32,
    /// Maximum distance in tiles a region may spread from a seed.
    pub default_max_radius: u32,
}

/// Debug/development configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DebugConfig {
    /// Log level override (e.g., "debug", "info", "warn").
    pub log_level: String,
}

/// Headless harness configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SimConfig {
    /// Number of ticks to simulate.
    pub ticks: u64,
    /// Number of simulated replication observers.
    pub observers: u32,
}

// --- Default implementations ---

impl Default for NavMapConfig {
    fn default() -> Self {
        Self {
            wall_tags: vec!["Wall".to_string(), "Window".to_string()],
        }
    }
}

impl Default for BeaconConfig {
    fn default() -> Self {
        Self {
            close_distance: 15.0,
            far_distance: 30.0,
        }
    }
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            default_max_area: 625,
            default_max_radius: 25,
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            ticks: 120,
            observers: 2,
        }
    }
}

impl BeaconConfig {
    /// Checks that the distance buckets are usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.close_distance > 0.0 && self.close_distance <= self.far_distance) {
            return Err(ConfigError::InvalidBeaconDistances {
                close: self.close_distance,
                far: self.far_distance,
            });
        }
        Ok(())
    }
}

/// Platform config directory for the station tools, if one can be resolved.
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("station-navmap"))
}

// --- Load / Save / Reload ---

impl Config {
    /// Load config from the given directory, or create a default config file.
    pub fn load_or_create(config_dir: &Path) -> Result<Self, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
            let config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
            config.beacons.validate()?;
            log::info!("Loaded config from {}", config_path.display());
            Ok(config)
        } else {
            let config = Config::default();
            config.save(config_dir)?;
            log::info!("Created default config at {}", config_path.display());
            Ok(config)
        }
    }

    /// Save config to the given directory as `navmap.ron`.
    pub fn save(&self, config_dir: &Path) -> Result<(), ConfigError> {
        std::fs::create_dir_all(config_dir).map_err(ConfigError::WriteError)?;

        let config_path = config_dir.join(CONFIG_FILE);
        let pretty = ron::ser::PrettyConfig::new()
            .depth_limit(3)
            .separate_tuple_members(true)
            .enumerate_arrays(false);

        let serialized =
            ron::ser::to_string_pretty(self, pretty).map_err(ConfigError::SerializeError)?;

        std::fs::write(&config_path, serialized).map_err(ConfigError::WriteError)?;
        Ok(())
    }

    /// Hot-reload: returns `Some(new_config)` if the file changed, `None` otherwise.
    pub fn reload(&self, config_dir: &Path) -> Result<Option<Self>, ConfigError> {
        let config_path = config_dir.join(CONFIG_FILE);
        let contents = std::fs::read_to_string(&config_path).map_err(ConfigError::ReadError)?;
        let new_config: Config = ron::from_str(&contents).map_err(ConfigError::ParseError)?;
        new_config.beacons.validate()?;

        if &new_config != self {
            log::info!("Config reloaded with changes");
            Ok(Some(new_config))
        } else {
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_serializes() {
        let config = Config::default();
        let ron_str =
            ron::ser::to_string_pretty(&config, ron::ser::PrettyConfig::new().depth_limit(3))
                .unwrap();
        assert!(ron_str.contains("close_distance: 15.0"));
        assert!(ron_str.contains("default_max_area: 625"));
    }

    #[test]
    fn test_config_roundtrip() {
        let config = Config::default();
        let ron_str = ron::to_string(&config).unwrap();
        let deserialized: Config = ron::from_str(&ron_str).unwrap();
        assert_eq!(config, deserialized);
    }

    #[test]
    fn test_missing_section_uses_default() {
        let ron_str = "(navmap: (), beacons: (far_distance: 40.0))";
        let config: Config = ron::from_str(ron_str).unwrap();
        assert_eq!(config.regions, RegionConfig::default());
        assert_eq!(config.beacons.far_distance, 40.0);
        assert_eq!(config.beacons.close_distance, 15.0);
        assert_eq!(config.navmap.wall_tags, vec!["Wall", "Window"]);
    }

    #[test]
    fn test_extra_field_ignored() {
        let result: Result<Config, _> = ron::from_str("(future_setting: true)");
        assert!(result.is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::default();
        config.beacons.close_distance = 10.0;
        config.navmap.wall_tags.push("Girder".to_string());

        config.save(dir.path()).unwrap();
        let loaded = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, loaded);
    }

    #[test]
    fn test_load_or_create_writes_default_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load_or_create(dir.path()).unwrap();
        assert_eq!(config, Config::default());
        assert!(dir.path().join(CONFIG_FILE).exists());
    }

    #[test]
    fn test_reload_detects_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        let mut modified = config.clone();
        modified.sim.ticks = 9;
        modified.save(dir.path()).unwrap();

        let result = config.reload(dir.path()).unwrap();
        assert_eq!(result.unwrap().sim.ticks, 9);
    }

    #[test]
    fn test_reload_no_changes() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::default();
        config.save(dir.path()).unwrap();

        assert!(config.reload(dir.path()).unwrap().is_none());
    }

    #[test]
    fn test_inverted_beacon_distances_rejected() {
        let beacons = BeaconConfig {
            close_distance: 40.0,
            far_distance: 30.0,
        };
        assert!(matches!(
            beacons.validate(),
            Err(ConfigError::InvalidBeaconDistances { .. })
        ));
        assert!(BeaconConfig::default().validate().is_ok());
    }

    #[test]
    fn test_invalid_ron_produces_error() {
        let result: Result<Config, _> = ron::from_str("{{not valid}}");
        assert!(result.is_err());
    }
}
