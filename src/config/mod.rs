//! Configuration loading and validation.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Standings scoring.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandingsConfig {
    #[serde(default = "default_points_per_win")]
    pub points_per_win: u32,

    #[serde(default)]
    pub points_per_loss: u32,
}

fn default_points_per_win() -> u32 {
    1
}

impl Default for StandingsConfig {
    fn default() -> Self {
        Self {
            points_per_win: default_points_per_win(),
            points_per_loss: 0,
        }
    }
}

/// Rating history thresholds.
///
/// These are empirical tuning values rather than constants of a rating
/// model, so all of them are configurable.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RatingConfig {
    /// Rating every player starts at
    #[serde(default = "default_starting_rating")]
    pub starting_rating: f64,

    /// Above this difference the live rating is flagged, never charted
    #[serde(default = "default_implausible_jump")]
    pub implausible_jump: f64,

    /// Smallest difference worth a new "current" point
    #[serde(default = "default_append_min")]
    pub append_min: f64,

    /// Largest difference appended after `stale_days`
    #[serde(default = "default_append_max")]
    pub append_max: f64,

    /// Age after which the last point is stale for small differences
    #[serde(default = "default_stale_days")]
    pub stale_days: i64,

    /// Age after which the last point is stale for large differences
    #[serde(default = "default_long_stale_days")]
    pub long_stale_days: i64,
}

fn default_starting_rating() -> f64 {
    1000.0
}

fn default_implausible_jump() -> f64 {
    500.0
}

fn default_append_min() -> f64 {
    6.0
}

fn default_append_max() -> f64 {
    50.0
}

fn default_stale_days() -> i64 {
    1
}

fn default_long_stale_days() -> i64 {
    7
}

impl Default for RatingConfig {
    fn default() -> Self {
        Self {
            starting_rating: default_starting_rating(),
            implausible_jump: default_implausible_jump(),
            append_min: default_append_min(),
            append_max: default_append_max(),
            stale_days: default_stale_days(),
            long_stale_days: default_long_stale_days(),
        }
    }
}

/// Batch recalculation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Concurrent recalculations during a sweep
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
        }
    }
}

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub standings: StandingsConfig,

    #[serde(default)]
    pub rating: RatingConfig,
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
            engine: EngineConfig::default(),
            standings: StandingsConfig::default(),
            rating: RatingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a file if it exists, otherwise use defaults.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::from_file(path)
        } else {
            tracing::debug!("No config at {:?}, using defaults", path);
            Ok(Self::default())
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.workers == 0 {
            return Err(ConfigError::ValidationError(
                "Engine workers must be greater than 0".to_string(),
            ));
        }

        if self.standings.points_per_loss > self.standings.points_per_win {
            return Err(ConfigError::ValidationError(
                "A loss cannot be worth more points than a win".to_string(),
            ));
        }

        let r = &self.rating;
        let thresholds = [
            r.starting_rating,
            r.implausible_jump,
            r.append_min,
            r.append_max,
        ];
        if thresholds.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(ConfigError::ValidationError(
                "Rating thresholds must be finite and non-negative".to_string(),
            ));
        }

        if r.append_min > r.append_max || r.append_max > r.implausible_jump {
            return Err(ConfigError::ValidationError(
                "Rating thresholds must satisfy append_min <= append_max <= implausible_jump"
                    .to_string(),
            ));
        }

        if r.stale_days < 0 || r.stale_days > r.long_stale_days {
            return Err(ConfigError::ValidationError(
                "Staleness windows must satisfy 0 <= stale_days <= long_stale_days".to_string(),
            ));
        }

        Ok(())
    }
}
