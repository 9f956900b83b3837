//! TOML configuration.
//!
//! ```toml
//! [competition]
//! default_duration_minutes = 90
//!
//! [schedule]
//! auto_open_interval_secs = 3600
//!
//! [facility.Arena]
//! capacity = 12
//! address = "1 Stadium Road"
//! capacity_options = [12, 18, 24]
//!
//! [logging]
//! level = "debug"
//! ```
//!
//! Every section and every key is optional.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use gameday_competition::CompetitionConfig;
use gameday_schedule::AutoOpenConfig;
use serde::{Deserialize, Serialize};

use crate::GamedayError;

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GamedayConfig {
    pub competition: CompetitionConfig,
    pub schedule: ScheduleConfig,
    /// Facilities by name; the name is what competitions use as location.
    pub facility: BTreeMap<String, FacilityConfig>,
    pub logging: LoggingConfig,
}

impl GamedayConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    /// [`GamedayError::Config`] if the document is not valid TOML or a
    /// value has the wrong type.
    pub fn from_toml_str(toml: &str) -> Result<Self, GamedayError> {
        toml::from_str(toml).map_err(|e| GamedayError::Config(e.to_string()))
    }

    /// Reads and parses a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, GamedayError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(path = %path.display(), facilities = config.facility.len(), "configuration loaded");
        Ok(config)
    }

    pub fn facility(&self, name: &str) -> Option<&FacilityConfig> {
        self.facility.get(name)
    }
}

/// `[schedule]`: the auto-open loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub auto_open_interval_secs: u64,
    pub initial_jitter_ms: u64,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            auto_open_interval_secs: 3600,
            initial_jitter_ms: 2_000,
        }
    }
}

impl ScheduleConfig {
    pub fn auto_open(&self) -> AutoOpenConfig {
        AutoOpenConfig {
            interval: Duration::from_secs(self.auto_open_interval_secs),
            initial_jitter: Duration::from_millis(self.initial_jitter_ms),
        }
        .validated()
    }
}

/// `[facility.<name>]`: a place where games are held.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FacilityConfig {
    /// Usual number of players. Competitions moved here without a
    /// capacity of their own take this one.
    pub capacity: u32,
    pub address: Option<String>,
    /// Capacities the facility can be booked for. Empty means any.
    pub capacity_options: Vec<u32>,
}

impl FacilityConfig {
    pub fn offers(&self, capacity: u32) -> bool {
        self.capacity_options.is_empty() || self.capacity_options.contains(&capacity)
    }
}

/// `[logging]`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Level for the gameday crates when `RUST_LOG` is unset.
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_owned(),
        }
    }
}
