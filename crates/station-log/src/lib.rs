//! Structured logging for the station nav-map tools.
//!
//! Console output with uptime timestamps and module paths, plus JSON file
//! logging in debug builds. Beacon reconfiguration audit records are emitted
//! under the [`AUDIT_TARGET`] target and can be filtered independently.

use std::path::Path;

use station_config::Config;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Tracing target used for security-relevant audit records.
pub const AUDIT_TARGET: &str = "audit";

/// Filter used when neither `RUST_LOG` nor the config specify one.
const DEFAULT_FILTER: &str = "info,audit=info";

/// Initialize the tracing subscriber.
///
/// * `log_dir` - Optional directory for JSON log files (debug builds only)
/// * `debug_build` - Whether this is a debug build (enables file logging)
/// * `config` - Optional configuration to use for log level override
///
/// ```no_run
/// use station_config::Config;
/// use station_log::init_logging;
///
/// let config = Config::default();
/// init_logging(None, false, Some(&config));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, config: Option<&Config>) {
    let filter_str = filter_string(config);

    // RUST_LOG wins over the config level.
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join("station.log"))
    {
        let file_layer = fmt::layer()
            .with_writer(log_file)
            .with_ansi(false)
            .with_target(true)
            .with_timer(fmt::time::uptime())
            .json();

        subscriber.with(file_layer).init();
        return;
    }

    subscriber.init();
}

/// Builds the filter directive string from the config's level override.
///
/// The audit target is always kept at `info` or more verbose so audit
/// records survive a quiet global level.
pub fn filter_string(config: Option<&Config>) -> String {
    match config {
        Some(config) if !config.debug.log_level.is_empty() => {
            format!("{},{AUDIT_TARGET}=info", config.debug.log_level)
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Create an `EnvFilter` with the default filter string.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_filter_contains_audit() {
        let filter_str = format!("{}", default_env_filter());
        assert!(filter_str.contains("audit=info"));
        assert!(filter_str.contains("info"));
    }

    #[test]
    fn test_config_level_override() {
        let mut config = Config::default();
        config.debug.log_level = "warn".to_string();
        assert_eq!(filter_string(Some(&config)), "warn,audit=info");
    }

    #[test]
    fn test_empty_config_level_falls_back() {
        let mut config = Config::default();
        config.debug.log_level.clear();
        assert_eq!(filter_string(Some(&config)), DEFAULT_FILTER);
        assert_eq!(filter_string(None), DEFAULT_FILTER);
    }

    #[test]
    fn test_env_filter_parsing() {
        let valid_filters = [
            "info",
            "debug,station_navmap=trace",
            "warn,station_navmap::reactor=debug,audit=info",
        ];

        for filter_str in &valid_filters {
            let result = EnvFilter::try_from(*filter_str);
            assert!(result.is_ok(), "Failed to parse filter: {}", filter_str);
        }
    }

    #[test]
    fn test_log_dir_creation() {
        let temp_dir = tempfile::tempdir().unwrap();
        let log_dir = temp_dir.path().join("logs");
        std::fs::create_dir_all(&log_dir).unwrap();
        assert!(log_dir.join("station.log").parent().unwrap().exists());
    }
}
