/// Dashboard backend feed client.
///
/// The backend exposes the latest reading of every pole in a region:
///
/// ```text
/// GET {base}/api/dashboard?regionId=1
/// { "readings": [ { "sensor_id": 1, "name": "Pole 1",
///                   "water_level": "2.40", "recorded_at": "2025-11-30T08:00:00.000Z" } ],
///   "alerts":   [ ... ] }
/// ```
///
/// `water_level` arrives as a string when the column is DECIMAL, so both
/// numbers and numeric strings are accepted. Numeric sensor ids map to
/// `pole<N>`, the same ids MQTT topics use.
///
/// The same module reads the pole replay files the data generators write:
/// `[ { "id": 1, "PoleID": 1, "waterLevel": 5.02, "createsAt": "2025-11-30T02:00:00" } ]`.

use serde::Deserialize;

use crate::ingest::parse_timestamp;
use crate::model::{FeedError, Reading};

// ============================================================================
// Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct DashboardResponse {
    pub readings: Vec<DashboardReading>,
}

#[derive(Debug, Deserialize)]
pub struct DashboardReading {
    pub sensor_id: RawId,
    #[serde(default)]
    pub name: Option<String>,
    pub water_level: RawLevel,
    pub recorded_at: String,
}

/// One entry of a pole replay file. Field names differ between generator
/// versions, hence the aliases.
#[derive(Debug, Deserialize)]
pub struct PoleFileEntry {
    #[serde(default, alias = "PoleID", alias = "poleId")]
    pub pole_id: Option<RawId>,
    #[serde(alias = "waterLevel", alias = "waterlevel")]
    pub water_level: RawLevel,
    #[serde(alias = "createsAt", alias = "createdAt", alias = "createdat", alias = "created_at")]
    pub timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(i64),
    Text(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum RawLevel {
    Number(f64),
    Text(String),
}

/// Readings parsed from one payload plus the rows that had to be dropped.
#[derive(Debug, Default)]
pub struct FeedBatch {
    pub readings: Vec<Reading>,
    pub rejected: Vec<FeedError>,
}

impl FeedBatch {
    pub fn total(&self) -> usize {
        self.readings.len() + self.rejected.len()
    }
}

// ============================================================================
// Conversion helpers
// ============================================================================

/// Canonical sensor id: numeric ids become `pole<N>`.
pub fn sensor_key(id: &RawId) -> String {
    match id {
        RawId::Number(n) => format!("pole{}", n),
        RawId::Text(s) => normalize_sensor_id(s),
    }
}

/// Same rule for ids that arrive as text (MQTT topics, file names).
pub fn normalize_sensor_id(id: &str) -> String {
    let id = id.trim();
    match id.parse::<i64>() {
        Ok(n) => format!("pole{}", n),
        Err(_) => id.to_string(),
    }
}

fn level_inches(sensor_id: &str, raw: &RawLevel) -> Result<f64, FeedError> {
    let level = match raw {
        RawLevel::Number(v) => *v,
        RawLevel::Text(s) => s.trim().parse::<f64>().map_err(|_| FeedError::InvalidReading {
            sensor_id: sensor_id.to_string(),
            reason: format!("water level '{}' is not a number", s),
        })?,
    };
    if !level.is_finite() {
        return Err(FeedError::InvalidReading {
            sensor_id: sensor_id.to_string(),
            reason: format!("water level {} is not finite", level),
        });
    }
    Ok(level)
}

fn to_reading(sensor_id: String, raw: &RawLevel, timestamp: &str) -> Result<Reading, FeedError> {
    let level = level_inches(&sensor_id, raw)?;
    let timestamp = parse_timestamp(timestamp).map_err(|e| FeedError::InvalidReading {
        sensor_id: sensor_id.clone(),
        reason: e.to_string(),
    })?;
    Ok(Reading::new(sensor_id, level, timestamp))
}

// ============================================================================
// Parsing
// ============================================================================

/// Builds the dashboard URL for a region.
pub fn build_dashboard_url(base_url: &str, region_id: u32) -> String {
    format!("{}/api/dashboard?regionId={}", base_url.trim_end_matches('/'), region_id)
}

/// Parses a dashboard response body.
///
/// A body that is not the expected JSON shape is an error; individual rows
/// with unusable values are collected in `rejected`.
pub fn parse_dashboard_response(json: &str) -> Result<FeedBatch, FeedError> {
    let response: DashboardResponse =
        serde_json::from_str(json).map_err(|e| FeedError::ParseError(e.to_string()))?;

    let mut batch = FeedBatch::default();
    for row in &response.readings {
        match to_reading(sensor_key(&row.sensor_id), &row.water_level, &row.recorded_at) {
            Ok(reading) => batch.readings.push(reading),
            Err(e) => batch.rejected.push(e),
        }
    }
    Ok(batch)
}

/// Parses a pole replay file.
///
/// Entries without a pole id are attributed to `fallback_sensor_id` (the
/// per-pole files carry no id at all).
pub fn parse_pole_file(json: &str, fallback_sensor_id: &str) -> Result<FeedBatch, FeedError> {
    let entries: Vec<PoleFileEntry> =
        serde_json::from_str(json).map_err(|e| FeedError::ParseError(e.to_string()))?;

    let mut batch = FeedBatch::default();
    for entry in &entries {
        let sensor_id = entry
            .pole_id
            .as_ref()
            .map(sensor_key)
            .unwrap_or_else(|| fallback_sensor_id.to_string());
        match to_reading(sensor_id, &entry.water_level, &entry.timestamp) {
            Ok(reading) => batch.readings.push(reading),
            Err(e) => batch.rejected.push(e),
        }
    }
    Ok(batch)
}

// ============================================================================
// API Client Functions
// ============================================================================

/// Fetches and parses the latest readings from the dashboard backend.
pub fn fetch_readings(
    client: &reqwest::blocking::Client,
    url: &str,
) -> Result<FeedBatch, Box<dyn std::error::Error>> {
    let response = client
        .get(url)
        .header("Accept", "application/json")
        .send()?;

    if !response.status().is_success() {
        return Err(FeedError::HttpError(response.status().as_u16()).into());
    }

    let text = response.text()?;
    Ok(parse_dashboard_response(&text)?)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ingest::fixtures;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_build_dashboard_url() {
        assert_eq!(
            build_dashboard_url("http://127.0.0.1:3000/", 1),
            "http://127.0.0.1:3000/api/dashboard?regionId=1"
        );
    }

    #[test]
    fn test_dashboard_response_parses_numbers_and_decimal_strings() {
        let batch = parse_dashboard_response(fixtures::DASHBOARD_RESPONSE).expect("fixture parses");
        assert!(batch.rejected.is_empty(), "rejected: {:?}", batch.rejected);
        assert_eq!(batch.readings.len(), 2);

        let pole1 = &batch.readings[0];
        assert_eq!(pole1.sensor_id, "pole1");
        assert_eq!(pole1.level, 2.4);
        assert_eq!(pole1.timestamp, Utc.with_ymd_and_hms(2025, 11, 30, 8, 0, 0).unwrap());

        let pole2 = &batch.readings[1];
        assert_eq!(pole2.sensor_id, "pole2");
        assert_eq!(pole2.level, 6.25);
    }

    #[test]
    fn test_bad_rows_are_rejected_individually() {
        let batch = parse_dashboard_response(fixtures::DASHBOARD_RESPONSE_WITH_BAD_ROWS).unwrap();
        assert_eq!(batch.readings.len(), 1);
        assert_eq!(batch.rejected.len(), 2);
        assert_eq!(batch.total(), 3);
        assert!(batch
            .rejected
            .iter()
            .all(|e| matches!(e, FeedError::InvalidReading { .. })));
    }

    #[test]
    fn test_wrong_shape_is_a_parse_error() {
        let err = parse_dashboard_response(r#"{"error": "regionId is required"}"#).unwrap_err();
        assert!(matches!(err, FeedError::ParseError(_)), "got {:?}", err);
        assert!(parse_dashboard_response("not json").is_err());
    }

    #[test]
    fn test_pole_file_uses_pole_ids() {
        let batch = parse_pole_file(fixtures::POLE_FILE, "unused").unwrap();
        let ids: Vec<&str> = batch.readings.iter().map(|r| r.sensor_id.as_str()).collect();
        assert_eq!(ids, vec!["pole1", "pole2", "pole1", "pole2"]);
        assert_eq!(batch.readings[2].level, 5.12);
    }

    #[test]
    fn test_per_pole_file_falls_back_to_given_id() {
        let batch = parse_pole_file(fixtures::SINGLE_POLE_FILE, "pole1").unwrap();
        assert_eq!(batch.readings.len(), 2);
        assert!(batch.readings.iter().all(|r| r.sensor_id == "pole1"));
    }

    #[test]
    fn test_sensor_key_normalises_numeric_text() {
        assert_eq!(sensor_key(&RawId::Number(3)), "pole3");
        assert_eq!(sensor_key(&RawId::Text(" 4 ".to_string())), "pole4");
        assert_eq!(sensor_key(&RawId::Text("bridge-east".to_string())), "bridge-east");
        assert_eq!(normalize_sensor_id("2"), "pole2");
        assert_eq!(normalize_sensor_id("pole2"), "pole2");
    }
}
