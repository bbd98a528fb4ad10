//! Engine configuration from environment variables.

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use casefile_domain::MAX_TIME_SPEED;

const DEFAULT_CASES_DIR: &str = "cases";
const DEFAULT_DATA_DIR: &str = "data";
const DEFAULT_TICK_MS: u64 = 100;
const DEFAULT_TIME_SPEED: f64 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Directory of `<case_id>.json` case documents.
    pub cases_dir: PathBuf,
    /// Directory for persisted progress.
    pub data_dir: PathBuf,
    /// Wall-clock cadence of the clock driver.
    pub tick_interval: Duration,
    /// Initial game clock speed for new sessions.
    pub time_speed: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cases_dir: PathBuf::from(DEFAULT_CASES_DIR),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            time_speed: DEFAULT_TIME_SPEED,
        }
    }
}

impl EngineConfig {
    /// Read `CASEFILE_*` variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Invalid values are logged and replaced by
    /// their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let cases_dir = lookup("CASEFILE_CASES_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.cases_dir);
        let data_dir = lookup("CASEFILE_DATA_DIR")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.data_dir);

        let tick_ms = parse_or("CASEFILE_TICK_MS", lookup("CASEFILE_TICK_MS"), DEFAULT_TICK_MS);
        let tick_ms = if tick_ms == 0 {
            tracing::warn!("CASEFILE_TICK_MS must be positive, using {}", DEFAULT_TICK_MS);
            DEFAULT_TICK_MS
        } else {
            tick_ms
        };

        let time_speed = parse_or(
            "CASEFILE_TIME_SPEED",
            lookup("CASEFILE_TIME_SPEED"),
            DEFAULT_TIME_SPEED,
        );
        let time_speed =
            if time_speed.is_finite() && time_speed > 0.0 && time_speed <= MAX_TIME_SPEED {
                time_speed
            } else {
                tracing::warn!(
                    "CASEFILE_TIME_SPEED must be a positive number up to {}, using {}",
                    MAX_TIME_SPEED,
                    DEFAULT_TIME_SPEED
                );
                DEFAULT_TIME_SPEED
            };

        Self {
            cases_dir,
            data_dir,
            tick_interval: Duration::from_millis(tick_ms),
            time_speed,
        }
    }
}

fn parse_or<T: FromStr + Copy + std::fmt::Display>(key: &str, raw: Option<String>, default: T) -> T {
    let Some(raw) = raw else {
        return default;
    };
    match raw.trim().parse() {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(key, value = %raw, "Invalid configuration value, using {}", default);
            default
        }
    }
}
