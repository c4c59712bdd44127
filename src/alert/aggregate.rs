/// System-wide flood alarm.
///
/// The alarm is active while any sensor sits at `Warning` or `Critical`.
/// Like the per-sensor machine it is edge-triggered: `update` returns
/// `Start` when the alarm turns on and `Stop` when the last alarming sensor
/// returns to `Normal`, and nothing in between. The caller keeps the siren
/// running between the two edges.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::AlertLevel;

/// Edge of the continuous alarm signal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum AlarmSignal {
    Start,
    Stop,
}

#[derive(Debug, Default)]
pub struct AlarmAggregator {
    levels: BTreeMap<String, AlertLevel>,
}

impl AlarmAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the latest level of a sensor and reports any alarm edge.
    pub fn update(&mut self, sensor_id: &str, level: AlertLevel) -> Option<AlarmSignal> {
        let was_active = self.is_active();
        self.levels.insert(sensor_id.to_string(), level);
        edge(was_active, self.is_active())
    }

    /// Forgets a sensor (decommissioned or removed from configuration).
    pub fn remove(&mut self, sensor_id: &str) -> Option<AlarmSignal> {
        let was_active = self.is_active();
        self.levels.remove(sensor_id);
        edge(was_active, self.is_active())
    }

    pub fn is_active(&self) -> bool {
        self.levels.values().any(|level| level.is_alarming())
    }

    /// Sensors currently holding the alarm on, in id order.
    pub fn active_sensors(&self) -> Vec<&str> {
        self.levels
            .iter()
            .filter(|(_, level)| level.is_alarming())
            .map(|(id, _)| id.as_str())
            .collect()
    }

    /// Highest level across all sensors, `Normal` when none are tracked.
    pub fn worst_level(&self) -> AlertLevel {
        self.levels.values().copied().max().unwrap_or(AlertLevel::Normal)
    }
}

fn edge(was_active: bool, is_active: bool) -> Option<AlarmSignal> {
    match (was_active, is_active) {
        (false, true) => Some(AlarmSignal::Start),
        (true, false) => Some(AlarmSignal::Stop),
        _ => None,
    }
}
