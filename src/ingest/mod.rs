/// Reading ingestion for the SafePass monitoring service.
///
/// Submodules:
/// - `dashboard` — backend REST feed (`/api/dashboard`) and the pole replay
///                 file format: URL construction, JSON parsing, fetching.
/// - `mqtt`      — `sensors/<id>` payload parsing. Broker connectivity is
///                 owned by whatever subscriber hands us the payloads.
/// - `fixtures`  (test only) — representative payloads.

pub mod dashboard;
pub mod mqtt;

#[cfg(test)]
pub mod fixtures;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

use crate::model::FeedError;

/// Parses the timestamp shapes the feeds produce.
///
/// Accepted: RFC 3339 with offset (`2025-11-30T02:00:00-06:00`), naive ISO
/// (`2025-11-30T02:00:00`, optionally with fractional seconds) and MySQL
/// style (`2025-11-30 02:00:00`). Naive values are taken as UTC.
pub fn parse_timestamp(text: &str) -> Result<DateTime<Utc>, FeedError> {
    let text = text.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Ok(dt.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(text, format) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(FeedError::ParseError(format!("unrecognised timestamp '{}'", text)))
}

/// Converts epoch milliseconds to a UTC instant.
pub fn timestamp_from_millis(millis: i64) -> Result<DateTime<Utc>, FeedError> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| FeedError::ParseError(format!("epoch millis {} out of range", millis)))
}
