/// Development mode: replay recorded pole data.
///
/// When no live feed is available, point the service at a pole replay file
/// (the JSON the data generators write) and it is fed to the monitor in
/// timestamp order, one poll interval per timestamp.

use std::fs;
use std::path::Path;

use chrono::{DateTime, Utc};

use crate::ingest::dashboard::{normalize_sensor_id, parse_pole_file};
use crate::model::{FeedError, Reading};

/// Recorded readings, grouped into ticks of equal timestamp.
pub struct Replay {
    readings: Vec<Reading>,
    cursor: usize,
    /// Rows of the file that could not be turned into readings.
    pub rejected: Vec<FeedError>,
}

impl Replay {
    /// Loads a replay file. Entries without a pole id are attributed to the
    /// pole named by the file (`pole1Data.json` → `pole1`), unless overridden.
    pub fn from_file(path: &Path, sensor_id: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let text = fs::read_to_string(path)?;
        let fallback = sensor_id
            .map(str::to_string)
            .or_else(|| path.file_stem().map(|s| sensor_id_from_stem(&s.to_string_lossy())))
            .unwrap_or_else(|| "pole".to_string());
        Ok(Self::from_json(&text, &fallback)?)
    }

    pub fn from_json(json: &str, fallback_sensor_id: &str) -> Result<Self, FeedError> {
        let batch = parse_pole_file(json, fallback_sensor_id)?;
        Ok(Self::from_readings(batch.readings, batch.rejected))
    }

    fn from_readings(mut readings: Vec<Reading>, rejected: Vec<FeedError>) -> Self {
        readings.sort_by_key(|r| r.timestamp);
        Self {
            readings,
            cursor: 0,
            rejected,
        }
    }

    /// Next group of readings sharing one timestamp, or `None` when done.
    pub fn next_tick(&mut self) -> Option<Vec<Reading>> {
        let first = self.readings.get(self.cursor)?;
        let at = first.timestamp;
        let end = self.readings[self.cursor..]
            .iter()
            .position(|r| r.timestamp != at)
            .map(|offset| self.cursor + offset)
            .unwrap_or(self.readings.len());
        let tick = self.readings[self.cursor..end].to_vec();
        self.cursor = end;
        Some(tick)
    }

    pub fn remaining(&self) -> usize {
        self.readings.len() - self.cursor
    }

    /// First and last timestamps in the recording.
    pub fn time_range(&self) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        match (self.readings.first(), self.readings.last()) {
            (Some(first), Some(last)) => Some((first.timestamp, last.timestamp)),
            _ => None,
        }
    }
}

/// Sensor id for a per-pole recording: `pole1Data` and `1` both give `pole1`.
pub fn sensor_id_from_stem(stem: &str) -> String {
    let base = stem
        .strip_suffix("Data")
        .or_else(|| stem.strip_suffix("data"))
        .filter(|base| !base.is_empty())
        .unwrap_or(stem);
    normalize_sensor_id(base.trim_end_matches(['_', '-']))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures;

    #[test]
    fn test_replay_groups_readings_by_timestamp() {
        let mut replay = Replay::from_json(fixtures::POLE_FILE, "unused").unwrap();
        assert_eq!(replay.remaining(), 4);

        let first = replay.next_tick().expect("first tick");
        assert_eq!(first.len(), 2);
        assert_eq!(first[0].timestamp, first[1].timestamp);

        let second = replay.next_tick().expect("second tick");
        assert_eq!(second.len(), 2);
        assert!(second[0].timestamp > first[0].timestamp);

        assert!(replay.next_tick().is_none());
        assert_eq!(replay.remaining(), 0);
    }

    #[test]
    fn test_time_range_spans_recording() {
        let replay = Replay::from_json(fixtures::POLE_FILE, "unused").unwrap();
        let (start, end) = replay.time_range().unwrap();
        assert_eq!((end - start).num_minutes(), 15);
    }

    #[test]
    fn test_file_stem_names_the_configured_pole() {
        assert_eq!(sensor_id_from_stem("pole1Data"), "pole1");
        assert_eq!(sensor_id_from_stem("pole2_data"), "pole2");
        assert_eq!(sensor_id_from_stem("3"), "pole3");
        assert_eq!(sensor_id_from_stem("Data"), "Data");
    }

    #[test]
    fn test_replay_file_without_ids_uses_pole_from_file_name() {
        let dir = std::env::temp_dir().join(format!("safepass-replay-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join("pole1Data.json");
        std::fs::write(&file, fixtures::SINGLE_POLE_FILE).unwrap();

        let mut replay = Replay::from_file(&file, None).unwrap();
        let tick = replay.next_tick().unwrap();
        assert_eq!(tick[0].sensor_id, "pole1");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_empty_recording() {
        let mut replay = Replay::from_json("[]", "pole1").unwrap();
        assert!(replay.time_range().is_none());
        assert!(replay.next_tick().is_none());
    }
}
