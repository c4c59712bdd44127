/// Core data types for the SafePass flood monitoring service.
///
/// This module defines the shared domain model imported by all other modules:
/// readings, thresholds, trend results, per-sensor alert state, alert events
/// and the error types raised by the ingestion and configuration layers.
/// Levels are always in inches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// Reading types
// ---------------------------------------------------------------------------

/// A single water-level measurement reported by a pole sensor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    pub sensor_id: String,
    /// Water level in inches.
    pub level: f64,
    pub timestamp: DateTime<Utc>,
}

impl Reading {
    pub fn new(sensor_id: impl Into<String>, level: f64, timestamp: DateTime<Utc>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            level,
            timestamp,
        }
    }
}

// ---------------------------------------------------------------------------
// Threshold types
// ---------------------------------------------------------------------------

/// Warning and critical water levels, in inches.
///
/// `warning < critical` always holds for a value built through
/// [`ThresholdSet::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ThresholdSet {
    pub warning: f64,
    pub critical: f64,
}

impl ThresholdSet {
    pub fn new(warning: f64, critical: f64) -> Result<Self, ConfigError> {
        if !warning.is_finite() || !critical.is_finite() {
            return Err(ConfigError::Invalid(format!(
                "thresholds must be finite (warning={}, critical={})",
                warning, critical
            )));
        }
        if warning >= critical {
            return Err(ConfigError::Invalid(format!(
                "warning threshold {} must be below critical threshold {}",
                warning, critical
            )));
        }
        Ok(Self { warning, critical })
    }
}

impl Default for ThresholdSet {
    /// Dashboard defaults: warning at 3 in, critical at 6 in.
    fn default() -> Self {
        Self {
            warning: 3.0,
            critical: 6.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Trend types
// ---------------------------------------------------------------------------

/// Least-squares fit of level against elapsed seconds since `window_start`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TrendResult {
    /// Inches per second.
    pub slope: f64,
    /// Fitted level at `window_start`, in inches.
    pub intercept: f64,
    pub window_start: DateTime<Utc>,
    pub sample_count: usize,
    /// Seconds from `window_start` to the newest sample in the window.
    pub last_sample_offset_secs: f64,
}

/// Why no trend could be fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TrendUnavailable {
    /// Fewer than two samples in the window.
    InsufficientData { sample_count: usize },
    /// The time axis has zero variance (all timestamps identical).
    DegenerateRegression,
}

/// Outcome of a trend estimation. `Unavailable` is a normal, expected case.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub enum Trend {
    Available(TrendResult),
    Unavailable(TrendUnavailable),
}

impl Trend {
    pub fn result(&self) -> Option<&TrendResult> {
        match self {
            Trend::Available(result) => Some(result),
            Trend::Unavailable(_) => None,
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, Trend::Available(_))
    }
}

// ---------------------------------------------------------------------------
// Alert state types
// ---------------------------------------------------------------------------

/// Per-sensor alert level, in ascending order of severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Normal,
    Warning,
    Critical,
}

impl AlertLevel {
    /// Whether this level contributes to the system-wide alarm.
    pub fn is_alarming(self) -> bool {
        self != AlertLevel::Normal
    }
}

impl fmt::Display for AlertLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlertLevel::Normal => write!(f, "normal"),
            AlertLevel::Warning => write!(f, "warning"),
            AlertLevel::Critical => write!(f, "critical"),
        }
    }
}

/// Current alert level of one sensor and when it was entered.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorAlertState {
    pub sensor_id: String,
    pub level: AlertLevel,
    pub entered_at: DateTime<Utc>,
}

impl SensorAlertState {
    /// State for a sensor seen for the first time.
    pub fn initial(sensor_id: impl Into<String>, at: DateTime<Utc>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
            level: AlertLevel::Normal,
            entered_at: at,
        }
    }
}

/// Emitted exactly once per change of a sensor's alert level.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertEvent {
    pub id: String,
    pub sensor_id: String,
    pub from_level: AlertLevel,
    pub to_level: AlertLevel,
    /// Level that caused the transition, in inches.
    pub level_inches: f64,
    pub message: String,
    /// Projected seconds until the critical threshold is crossed, if any.
    pub eta_secs: Option<f64>,
    pub urgent: bool,
    pub timestamp: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors raised while fetching or accepting readings from a feed.
#[derive(Debug, PartialEq)]
pub enum FeedError {
    /// Non-2xx HTTP response from the dashboard backend.
    HttpError(u16),
    /// The payload could not be deserialized.
    ParseError(String),
    /// A reading was well-formed but unusable (non-finite level, bad topic).
    InvalidReading { sensor_id: String, reason: String },
    /// A reading is older than the newest one already accepted for the sensor.
    OutOfOrder {
        sensor_id: String,
        latest: DateTime<Utc>,
        received: DateTime<Utc>,
    },
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FeedError::HttpError(code) => write!(f, "HTTP error: {}", code),
            FeedError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            FeedError::InvalidReading { sensor_id, reason } => {
                write!(f, "Invalid reading for sensor {}: {}", sensor_id, reason)
            }
            FeedError::OutOfOrder {
                sensor_id,
                latest,
                received,
            } => write!(
                f,
                "Out-of-order reading for sensor {}: {} is older than {}",
                sensor_id,
                received.to_rfc3339(),
                latest.to_rfc3339()
            ),
        }
    }
}

impl std::error::Error for FeedError {}

/// Errors raised while loading or validating configuration.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Config I/O error: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Config parse error: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_threshold_set_rejects_inverted_order() {
        assert!(ThresholdSet::new(6.0, 3.0).is_err());
        assert!(ThresholdSet::new(3.0, 3.0).is_err());
        assert!(ThresholdSet::new(f64::NAN, 3.0).is_err());
        assert_eq!(
            ThresholdSet::new(3.0, 6.0).unwrap(),
            ThresholdSet::default()
        );
    }

    #[test]
    fn test_alert_levels_are_ordered_by_severity() {
        assert!(AlertLevel::Normal < AlertLevel::Warning);
        assert!(AlertLevel::Warning < AlertLevel::Critical);
        assert!(!AlertLevel::Normal.is_alarming());
        assert!(AlertLevel::Warning.is_alarming());
    }

    #[test]
    fn test_feed_error_display_names_the_sensor() {
        let err = FeedError::InvalidReading {
            sensor_id: "pole1".to_string(),
            reason: "level is NaN".to_string(),
        };
        assert_eq!(err.to_string(), "Invalid reading for sensor pole1: level is NaN");
    }
}
