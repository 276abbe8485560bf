//! Configuration file handling.
//!
//! Settings live in a TOML file (default `~/.config/prio/config.toml`); every
//! section and key is optional and falls back to its default.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::priority::RankingPolicy;
use crate::recurrence::RecurrencePolicy;
use crate::report::CHECKIN_WINDOW_DAYS;

/// Shortest sweep period the daemon accepts, in seconds.
const MIN_SWEEP_INTERVAL_SECS: u64 = 60;

/// Longest check-in look-back and look-ahead, about ten years.
const MAX_CHECKIN_WINDOW_DAYS: i64 = 3660;

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storage: StorageConfig,
    pub ranking: RankingPolicy,
    pub recurrence: RecurrenceConfig,
    pub checkin: CheckinConfig,
    pub reminders: ReminderConfig,
    pub logging: LoggingConfig,
}

/// Where the database lives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding `tasks.json` and `session.json` (None = platform data dir).
    pub data_dir: Option<PathBuf>,
}

/// Recurrence arithmetic and the background sweep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecurrenceConfig {
    #[serde(flatten)]
    pub policy: RecurrencePolicy,
    /// Seconds between sweeps in `prio daemon`.
    pub sweep_interval_secs: u64,
}

impl Default for RecurrenceConfig {
    fn default() -> Self {
        Self {
            policy: RecurrencePolicy::default(),
            sweep_interval_secs: 86_400,
        }
    }
}

/// Weekly check-in window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckinConfig {
    pub window_days: i64,
}

impl Default for CheckinConfig {
    fn default() -> Self {
        Self { window_days: CHECKIN_WINDOW_DAYS }
    }
}

/// Reminder delivery from the daemon.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderConfig {
    pub enabled: bool,
}

/// Log filter used when `RUST_LOG` is unset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub filter: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { filter: "warn".into() }
    }
}

impl Config {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Reject out-of-range values.
    pub fn validate(&self) -> Result<()> {
        let f = self.ranking.suggest_fraction;
        if !(f > 0.0 && f <= 1.0) {
            return Err(Error::Config(format!("ranking.suggest_fraction must be in (0, 1], got {f}")));
        }
        if self.ranking.no_due_horizon_days < 1 {
            return Err(Error::Config("ranking.no_due_horizon_days must be at least 1".into()));
        }
        if self.recurrence.sweep_interval_secs < MIN_SWEEP_INTERVAL_SECS {
            return Err(Error::Config(format!(
                "recurrence.sweep_interval_secs must be at least {MIN_SWEEP_INTERVAL_SECS}"
            )));
        }
        if !(1..=MAX_CHECKIN_WINDOW_DAYS).contains(&self.checkin.window_days) {
            return Err(Error::Config(format!(
                "checkin.window_days must be between 1 and {MAX_CHECKIN_WINDOW_DAYS}"
            )));
        }
        Ok(())
    }

    /// Returns the default config file path: `<config_dir>/prio/config.toml`.
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("prio")
            .join("config.toml")
    }

    /// Directory for the database and session, honouring `storage.data_dir`.
    pub fn data_dir(&self) -> PathBuf {
        self.storage.data_dir.clone().unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("prio")
        })
    }
}
