use std::env;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Env var overriding [`SchedulerConfig::time_unit_ms`].
pub const TIME_UNIT_ENV: &str = "MICROSCHED_TIME_UNIT_MS";
/// Env var overriding [`SchedulerConfig::worker_name`].
pub const WORKER_NAME_ENV: &str = "MICROSCHED_WORKER_NAME";

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

/// Scheduler configuration, typically parsed from TOML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerConfig {
    /// Wall-clock length of one simulated time unit, in milliseconds.
    #[serde(default = "default_time_unit_ms")]
    pub time_unit_ms: u64,
    /// Thread name used by [`crate::Worker`].
    #[serde(default = "default_worker_name")]
    pub worker_name: String,
}

fn default_time_unit_ms() -> u64 { 500 }
fn default_worker_name() -> String { "microsched-worker".to_string() }

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            time_unit_ms: default_time_unit_ms(),
            worker_name: default_worker_name(),
        }
    }
}

impl SchedulerConfig {
    /// Build config from defaults plus environment overrides.
    ///
    /// Loads a `.env` file first (silently ignored if missing).
    pub fn from_env() -> Self {
        load_dotenv();
        let mut config = Self::default();
        config.apply_env();
        config
    }

    /// Overlay any `MICROSCHED_*` environment variables onto this config.
    /// Unparsable values are logged and ignored.
    pub fn apply_env(&mut self) {
        if let Some(raw) = env_opt(TIME_UNIT_ENV) {
            match raw.parse::<u64>() {
                Ok(ms) => self.time_unit_ms = ms,
                Err(e) => warn!(var = TIME_UNIT_ENV, value = %raw, error = %e, "ignoring unparsable env override"),
            }
        }
        if let Some(name) = env_opt(WORKER_NAME_ENV) {
            self.worker_name = name;
        }
    }

    /// The configured time unit as a [`Duration`].
    pub fn time_unit(&self) -> Duration {
        Duration::from_millis(self.time_unit_ms)
    }
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scheduler_config_defaults() {
        let config = SchedulerConfig::default();
        assert_eq!(config.time_unit_ms, 500);
        assert_eq!(config.worker_name, "microsched-worker");
        assert_eq!(config.time_unit(), Duration::from_millis(500));
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: SchedulerConfig = toml::from_str("time_unit_ms = 20").unwrap();
        assert_eq!(config.time_unit_ms, 20);
        assert_eq!(config.worker_name, "microsched-worker");

        let empty: SchedulerConfig = toml::from_str("").unwrap();
        assert_eq!(empty, SchedulerConfig::default());
    }

    // The only test in this crate that touches the process environment.
    #[test]
    fn from_env_applies_overrides_and_ignores_bad_values() {
        env::set_var(TIME_UNIT_ENV, "12");
        env::set_var(WORKER_NAME_ENV, "env-worker");
        let config = SchedulerConfig::from_env();
        assert_eq!(config.time_unit_ms, 12);
        assert_eq!(config.worker_name, "env-worker");

        env::set_var(TIME_UNIT_ENV, "soon");
        env::set_var(WORKER_NAME_ENV, "");
        let config = SchedulerConfig::from_env();
        assert_eq!(config, SchedulerConfig::default());

        env::remove_var(TIME_UNIT_ENV);
        env::remove_var(WORKER_NAME_ENV);
    }
}
