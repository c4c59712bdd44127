/// Per-sensor alert state machine.
///
/// ```text
///   Normal ⇄ Warning ⇄ Critical      (Normal ⇄ Critical in one step is allowed)
/// ```
///
/// The level is decided by the current reading against the thresholds and
/// nothing else. Events are edge-triggered: one `AlertEvent` per change of
/// level, none while a sensor stays in the same bucket. The trend only
/// enriches the event (time-to-flood text and urgency) and is never needed
/// to produce a state.

use uuid::Uuid;

use crate::alert::message::{format_eta, transition_message};
use crate::alert::thresholds::classify_level;
use crate::analysis::trend::{project_crossing, TrendConfig};
use crate::model::{AlertEvent, AlertLevel, Reading, SensorAlertState, ThresholdSet, Trend};

/// Projected seconds until the critical threshold, when the trend allows one.
pub fn critical_eta(trend: &Trend, thresholds: &ThresholdSet, config: &TrendConfig) -> Option<f64> {
    trend
        .result()
        .and_then(|t| project_crossing(t, thresholds.critical, config.max_horizon_secs))
}

/// Evaluates one reading against the sensor's prior state.
///
/// Returns the new state and, only if the level changed, the event
/// describing the transition. `entered_at` moves only on a transition.
pub fn evaluate(
    reading: &Reading,
    trend: &Trend,
    thresholds: &ThresholdSet,
    config: &TrendConfig,
    prior: &SensorAlertState,
) -> (SensorAlertState, Option<AlertEvent>) {
    let level = classify_level(reading.level, thresholds);

    if level == prior.level {
        return (prior.clone(), None);
    }

    let eta_secs = critical_eta(trend, thresholds, config);
    let eta = format_eta(eta_secs);
    let message = transition_message(&reading.sensor_id, prior.level, level, reading.level, eta.as_ref());
    let urgent = match level {
        AlertLevel::Critical => true,
        _ => eta.as_ref().is_some_and(|e| e.urgent),
    };

    let event = AlertEvent {
        id: Uuid::new_v4().to_string(),
        sensor_id: reading.sensor_id.clone(),
        from_level: prior.level,
        to_level: level,
        level_inches: reading.level,
        message,
        eta_secs,
        urgent,
        timestamp: reading.timestamp,
    };

    let next = SensorAlertState {
        sensor_id: prior.sensor_id.clone(),
        level,
        entered_at: reading.timestamp,
    };

    (next, Some(event))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
