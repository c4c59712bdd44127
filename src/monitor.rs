/// Per-sensor flood monitor.
///
/// Glue between the ingestion layer and the pure core: owns the reading
/// window and alert state of every sensor plus the system-wide alarm, and
/// runs estimate → evaluate → aggregate for each accepted reading.
///
/// Readings must arrive in timestamp order per sensor. Out-of-order or
/// invalid readings are rejected and leave all state untouched, so the
/// one-event-per-transition guarantee holds.

use std::collections::BTreeMap;

use crate::alert::{critical_eta, evaluate, AlarmAggregator, AlarmSignal};
use crate::analysis::{estimate_trend, SensorHistory, TrendConfig};
use crate::model::{AlertEvent, AlertLevel, FeedError, Reading, SensorAlertState, ThresholdSet, Trend};

/// Everything a single ingested reading produced.
#[derive(Debug, Clone)]
pub struct Outcome {
    pub state: SensorAlertState,
    pub event: Option<AlertEvent>,
    pub alarm: Option<AlarmSignal>,
    pub trend: Trend,
    /// Projected seconds until the critical threshold, refreshed every tick.
    pub eta_secs: Option<f64>,
}

struct SensorSlot {
    history: SensorHistory,
    state: SensorAlertState,
}

pub struct FloodMonitor {
    thresholds: ThresholdSet,
    trend_config: TrendConfig,
    sensors: BTreeMap<String, SensorSlot>,
    alarm: AlarmAggregator,
}

impl FloodMonitor {
    pub fn new(thresholds: ThresholdSet, trend_config: TrendConfig) -> Self {
        Self {
            thresholds,
            trend_config,
            sensors: BTreeMap::new(),
            alarm: AlarmAggregator::new(),
        }
    }

    /// Ingests one reading.
    ///
    /// A sensor's first reading creates its history and a `Normal` state.
    pub fn ingest(&mut self, reading: Reading) -> Result<Outcome, FeedError> {
        let capacity = self.trend_config.window_size;
        let slot = self
            .sensors
            .entry(reading.sensor_id.clone())
            .or_insert_with(|| SensorSlot {
                history: SensorHistory::new(reading.sensor_id.clone(), capacity),
                state: SensorAlertState::initial(reading.sensor_id.clone(), reading.timestamp),
            });

        if let Err(e) = slot.history.push(reading.clone()) {
            // Drop a slot that was created for a reading we just refused.
            if slot.history.is_empty() {
                self.sensors.remove(&reading.sensor_id);
            }
            return Err(e);
        }

        let trend = estimate_trend(&slot.history.window());
        let (state, event) = evaluate(&reading, &trend, &self.thresholds, &self.trend_config, &slot.state);
        slot.state = state.clone();

        let alarm = self.alarm.update(&reading.sensor_id, state.level);
        let eta_secs = critical_eta(&trend, &self.thresholds, &self.trend_config);

        Ok(Outcome {
            state,
            event,
            alarm,
            trend,
            eta_secs,
        })
    }

    /// Ingests a batch in timestamp order.
    ///
    /// The sort is stable, so readings sharing a timestamp keep feed order.
    /// Rejected readings are returned alongside the outcomes instead of
    /// aborting the batch.
    pub fn ingest_batch(&mut self, mut readings: Vec<Reading>) -> (Vec<Outcome>, Vec<FeedError>) {
        readings.sort_by_key(|r| r.timestamp);
        let mut outcomes = Vec::with_capacity(readings.len());
        let mut errors = Vec::new();
        for reading in readings {
            match self.ingest(reading) {
                Ok(outcome) => outcomes.push(outcome),
                Err(e) => errors.push(e),
            }
        }
        (outcomes, errors)
    }

    /// Replaces the thresholds; the next evaluation of each sensor uses them.
    pub fn set_thresholds(&mut self, thresholds: ThresholdSet) {
        self.thresholds = thresholds;
    }

    pub fn thresholds(&self) -> &ThresholdSet {
        &self.thresholds
    }

    /// Changes the trend window and horizon, resizing every history.
    pub fn set_trend_config(&mut self, config: TrendConfig) {
        self.trend_config = config;
        for slot in self.sensors.values_mut() {
            slot.history.set_capacity(config.window_size);
        }
    }

    pub fn state(&self, sensor_id: &str) -> Option<&SensorAlertState> {
        self.sensors.get(sensor_id).map(|slot| &slot.state)
    }

    pub fn latest_reading(&self, sensor_id: &str) -> Option<&Reading> {
        self.sensors.get(sensor_id).and_then(|slot| slot.history.latest())
    }

    pub fn sensor_ids(&self) -> Vec<&str> {
        self.sensors.keys().map(String::as_str).collect()
    }

    pub fn alarm_active(&self) -> bool {
        self.alarm.is_active()
    }

    /// Sensors currently holding the alarm on.
    pub fn active_sensors(&self) -> Vec<&str> {
        self.alarm.active_sensors()
    }

    pub fn worst_level(&self) -> AlertLevel {
        self.alarm.worst_level()
    }

    /// Stops tracking a sensor; may turn the system alarm off.
    pub fn remove_sensor(&mut self, sensor_id: &str) -> Option<AlarmSignal> {
        self.sensors.remove(sensor_id);
        self.alarm.remove(sensor_id)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{DateTime, Duration, TimeZone, Utc};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 30, 2, 0, 0).unwrap()
    }

    fn reading(sensor: &str, minute: i64, level: f64) -> Reading {
        Reading::new(sensor, level, t0() + Duration::minutes(minute))
    }

    fn monitor() -> FloodMonitor {
        FloodMonitor::new(ThresholdSet::default(), TrendConfig::default())
    }

    #[test]
    fn test_first_reading_creates_normal_state() {
        let mut m = monitor();
        let outcome = m.ingest(reading("pole1", 0, 1.0)).unwrap();
        assert_eq!(outcome.state.level, AlertLevel::Normal);
        assert!(outcome.event.is_none());
        assert!(!outcome.trend.is_available());
        assert_eq!(m.sensor_ids(), vec!["pole1"]);
    }

    #[test]
    fn test_first_reading_above_warning_transitions_immediately() {
        let mut m = monitor();
        let outcome = m.ingest(reading("pole1", 0, 4.0)).unwrap();
        let event = outcome.event.expect("normal -> warning on first reading");
        assert_eq!(event.from_level, AlertLevel::Normal);
        assert_eq!(outcome.alarm, Some(AlarmSignal::Start));
    }

    #[test]
    fn test_out_of_order_reading_leaves_state_untouched() {
        let mut m = monitor();
        m.ingest(reading("pole1", 5, 4.0)).unwrap();
        let err = m.ingest(reading("pole1", 4, 1.0)).unwrap_err();
        assert!(matches!(err, FeedError::OutOfOrder { .. }));
        assert_eq!(m.state("pole1").map(|s| s.level), Some(AlertLevel::Warning));
        assert_eq!(m.latest_reading("pole1").map(|r| r.level), Some(4.0));
    }

    #[test]
    fn test_invalid_first_reading_does_not_register_sensor() {
        let mut m = monitor();
        assert!(m.ingest(reading("pole9", 0, f64::INFINITY)).is_err());
        assert!(m.sensor_ids().is_empty());
        assert!(m.state("pole9").is_none());
    }

    #[test]
    fn test_two_sensor_alarm_follows_either_sensor() {
        let mut m = monitor();
        m.ingest(reading("pole1", 0, 1.0)).unwrap();
        m.ingest(reading("pole2", 0, 1.0)).unwrap();

        let on = m.ingest(reading("pole2", 1, 3.1)).unwrap();
        assert_eq!(on.alarm, Some(AlarmSignal::Start));
        let both = m.ingest(reading("pole1", 1, 6.5)).unwrap();
        assert_eq!(both.alarm, None);

        let one_down = m.ingest(reading("pole2", 2, 1.0)).unwrap();
        assert_eq!(one_down.alarm, None);
        assert!(m.alarm_active());

        let off = m.ingest(reading("pole1", 2, 2.0)).unwrap();
        assert_eq!(off.alarm, Some(AlarmSignal::Stop));
        assert!(!m.alarm_active());
    }

    #[test]
    fn test_batch_is_processed_in_timestamp_order() {
        let mut m = monitor();
        let batch = vec![
            reading("pole1", 2, 3.0),
            reading("pole1", 0, 1.0),
            reading("pole1", 1, 2.0),
        ];
        let (outcomes, errors) = m.ingest_batch(batch);
        assert!(errors.is_empty(), "errors: {:?}", errors);
        assert_eq!(outcomes.len(), 3);
        let events: Vec<_> = outcomes.iter().filter_map(|o| o.event.as_ref()).collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level_inches, 3.0);
        // Rising 1 in/min with 3 in to go.
        let eta = outcomes[2].eta_secs.expect("rising trend");
        assert!((eta - 180.0).abs() < 1e-6, "eta was {}", eta);
    }

    #[test]
    fn test_runtime_threshold_change_applies_on_next_reading() {
        let mut m = monitor();
        m.ingest(reading("pole1", 0, 2.6)).unwrap();
        m.set_thresholds(ThresholdSet::new(2.5, 6.0).unwrap());

        let outcome = m.ingest(reading("pole1", 1, 2.6)).unwrap();
        assert_eq!(outcome.state.level, AlertLevel::Warning);
        assert!(outcome.event.is_some());
    }

    #[test]
    fn test_window_size_bounds_the_regression() {
        let config = TrendConfig {
            window_size: 3,
            ..TrendConfig::default()
        };
        let mut m = FloodMonitor::new(ThresholdSet::default(), config);
        for minute in 0..6 {
            m.ingest(reading("pole1", minute, 1.0)).unwrap();
        }
        let outcome = m.ingest(reading("pole1", 6, 1.0)).unwrap();
        match outcome.trend {
            Trend::Available(t) => assert_eq!(t.sample_count, 3),
            Trend::Unavailable(why) => panic!("expected trend, got {:?}", why),
        }
    }

    #[test]
    fn test_remove_sensor_can_stop_alarm() {
        let mut m = monitor();
        m.ingest(reading("pole1", 0, 7.0)).unwrap();
        assert_eq!(m.worst_level(), AlertLevel::Critical);
        assert_eq!(m.remove_sensor("pole1"), Some(AlarmSignal::Stop));
        assert!(m.state("pole1").is_none());
    }
}
