/// Bounded per-sensor reading history.
///
/// Keeps the trailing `capacity` readings of one sensor, oldest first, and
/// refuses readings that would break timestamp order. The regression window
/// is always a snapshot of this buffer.

use std::collections::VecDeque;

use chrono::{DateTime, Utc};

use crate::model::{FeedError, Reading};

pub struct SensorHistory {
    sensor_id: String,
    capacity: usize,
    readings: VecDeque<Reading>,
}

impl SensorHistory {
    /// Creates an empty history. A capacity below 2 is raised to 2 so a
    /// trend can always be fitted once enough data arrives.
    pub fn new(sensor_id: impl Into<String>, capacity: usize) -> Self {
        let capacity = capacity.max(2);
        Self {
            sensor_id: sensor_id.into(),
            capacity,
            readings: VecDeque::with_capacity(capacity),
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    /// Appends a reading, evicting the oldest one once full.
    ///
    /// Equal timestamps are accepted; older ones are rejected with
    /// `FeedError::OutOfOrder` and leave the history untouched.
    pub fn push(&mut self, reading: Reading) -> Result<(), FeedError> {
        if reading.sensor_id != self.sensor_id {
            return Err(FeedError::InvalidReading {
                sensor_id: reading.sensor_id,
                reason: format!("reading routed to history of {}", self.sensor_id),
            });
        }
        if !reading.level.is_finite() {
            return Err(FeedError::InvalidReading {
                sensor_id: reading.sensor_id,
                reason: format!("level {} is not finite", reading.level),
            });
        }
        if let Some(latest) = self.latest_timestamp() {
            if reading.timestamp < latest {
                return Err(FeedError::OutOfOrder {
                    sensor_id: reading.sensor_id,
                    latest,
                    received: reading.timestamp,
                });
            }
        }

        if self.readings.len() == self.capacity {
            self.readings.pop_front();
        }
        self.readings.push_back(reading);
        Ok(())
    }

    /// Snapshot of the current window, oldest first.
    pub fn window(&self) -> Vec<Reading> {
        self.readings.iter().cloned().collect()
    }

    pub fn latest(&self) -> Option<&Reading> {
        self.readings.back()
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.readings.back().map(|r| r.timestamp)
    }

    pub fn len(&self) -> usize {
        self.readings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.readings.is_empty()
    }

    /// Shrinks or grows the window; excess oldest readings are dropped.
    pub fn set_capacity(&mut self, capacity: usize) {
        self.capacity = capacity.max(2);
        while self.readings.len() > self.capacity {
            self.readings.pop_front();
        }
    }
}
