use anyhow::{bail, Context, Result};
use microsched::SchedulerConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::debug;

/// CLI configuration loaded from TOML file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CliConfig {
    /// Log filter used when RUST_LOG is unset
    #[serde(default = "default_log_filter")]
    pub log_filter: String,

    /// Scheduler settings (`[scheduler]` table)
    #[serde(default)]
    pub scheduler: SchedulerConfig,
}

fn default_log_filter() -> String {
    "warn".to_string()
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            log_filter: default_log_filter(),
            scheduler: SchedulerConfig::default(),
        }
    }
}

impl CliConfig {
    /// Return the default config file path: ~/.config/microsched/config.toml
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("could not determine user config directory")?
            .join("microsched");
        Ok(config_dir.join("config.toml"))
    }

    /// Load config from the given path, or the default path.
    ///
    /// A missing default file yields the defaults; a missing explicit path is an error.
    pub fn load(path: Option<&str>) -> Result<Self> {
        let config_path = match path {
            Some(p) => {
                let p = PathBuf::from(p);
                if !p.exists() {
                    bail!("config file not found: {}", p.display());
                }
                p
            }
            None => match Self::default_config_path() {
                Ok(p) => p,
                Err(e) => {
                    debug!(error = %e, "No config directory, using defaults");
                    return Ok(Self::default());
                }
            },
        };

        if !config_path.exists() {
            debug!(?config_path, "Config file not found, using defaults");
            return Ok(Self::default());
        }

        debug!(?config_path, "Loading config");
        let content = std::fs::read_to_string(&config_path)
            .with_context(|| format!("failed to read config: {}", config_path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse config: {}", config_path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Apply overrides in precedence order: environment, then CLI flags.
    pub fn with_overrides(mut self, time_unit_ms: Option<u64>, log_filter: Option<String>) -> Self {
        self.scheduler.apply_env();
        if let Some(ms) = time_unit_ms {
            self.scheduler.time_unit_ms = ms;
        }
        if let Some(filter) = log_filter {
            self.log_filter = filter;
        }
        self
    }
}
