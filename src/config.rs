/// Service configuration.
///
/// Loaded from a TOML file (default `safepass.toml`, or the path in the
/// `SAFEPASS_CONFIG` environment variable; a `.env` file is honoured).
/// Every section is optional and falls back to the dashboard defaults.
///
/// ```toml
/// [thresholds]
/// warning = 3.0
/// critical = 6.0
///
/// [trend]
/// window_size = 10
/// max_horizon_secs = 7200.0
///
/// [feed]
/// base_url = "http://127.0.0.1:3000"
/// region_id = 1
/// poll_interval_secs = 1
/// stale_after_minutes = 15
///
/// [[sensors]]
/// id = "pole1"
/// name = "Pole 1 - Main St underpass"
/// ```

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::analysis::TrendConfig;
use crate::logging::LogLevel;
use crate::model::{ConfigError, ThresholdSet};
use crate::units::DistanceUnit;

pub const DEFAULT_CONFIG_PATH: &str = "safepass.toml";
pub const CONFIG_PATH_ENV: &str = "SAFEPASS_CONFIG";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    /// Base URL of the dashboard backend.
    pub base_url: String,
    pub region_id: u32,
    pub poll_interval_secs: u64,
    /// A sensor silent for longer than this is reported stale.
    pub stale_after_minutes: u64,
}

impl Default for FeedConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            region_id: 1,
            poll_interval_secs: 1,
            stale_after_minutes: 15,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub unit: DistanceUnit,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: LogLevel,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: LogLevel::Info,
            file: None,
            timestamps: true,
        }
    }
}

/// A pole the service expects to hear from.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SensorConfig {
    pub id: String,
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct MonitorConfig {
    pub thresholds: ThresholdSet,
    pub trend: TrendConfig,
    pub feed: FeedConfig,
    pub display: DisplayConfig,
    pub logging: LoggingConfig,
    pub sensors: Vec<SensorConfig>,
}

// ---------------------------------------------------------------------------
// Loading
// ---------------------------------------------------------------------------

impl MonitorConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: MonitorConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml_str(&text)
    }

    /// Checks the invariants the core relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ThresholdSet::new(self.thresholds.warning, self.thresholds.critical)?;

        if self.trend.window_size < 2 {
            return Err(ConfigError::Invalid(format!(
                "trend.window_size must be at least 2, got {}",
                self.trend.window_size
            )));
        }
        if self.trend.max_horizon_secs.is_nan() || self.trend.max_horizon_secs <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "trend.max_horizon_secs must be positive, got {}",
                self.trend.max_horizon_secs
            )));
        }
        if self.feed.poll_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "feed.poll_interval_secs must be at least 1".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for sensor in &self.sensors {
            if sensor.id.trim().is_empty() {
                return Err(ConfigError::Invalid("sensor id must not be empty".to_string()));
            }
            if !seen.insert(sensor.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate sensor id '{}'",
                    sensor.id
                )));
            }
        }
        Ok(())
    }

    /// Looks up a configured sensor by id.
    pub fn find_sensor(&self, sensor_id: &str) -> Option<&SensorConfig> {
        self.sensors.iter().find(|s| s.id == sensor_id)
    }

    /// Name to show for a sensor, falling back to its id.
    pub fn display_name<'a>(&'a self, sensor_id: &'a str) -> &'a str {
        match self.find_sensor(sensor_id) {
            Some(sensor) if !sensor.name.is_empty() => &sensor.name,
            _ => sensor_id,
        }
    }
}

/// Picks the config file: explicit path, then `SAFEPASS_CONFIG`, then the
/// default file name in the working directory.
pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    dotenv::dotenv().ok();
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    env::var(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Loads the config file, using defaults when the default file is absent.
///
/// A path that was asked for explicitly (argument or environment) must
/// exist.
pub fn load_config(explicit: Option<&Path>) -> Result<MonitorConfig, ConfigError> {
    let path = resolve_config_path(explicit);
    let asked_for = explicit.is_some() || env::var(CONFIG_PATH_ENV).is_ok();
    if !asked_for && !path.exists() {
        return Ok(MonitorConfig::default());
    }
    MonitorConfig::load(&path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
