/// MQTT sensor payload parsing.
///
/// Poles publish a bare decimal level in inches to
/// `sensors/<pole>/waterlevel` (older firmware drops the suffix).
/// The subscriber that owns the broker connection passes each message here
/// together with its arrival time; poles carry no clock of their own.

use chrono::{DateTime, Utc};

use crate::ingest::dashboard::normalize_sensor_id;
use crate::model::{FeedError, Reading};

/// Topic filter the subscriber should use.
pub const SENSOR_TOPIC_FILTER: &str = "sensors/#";

const TOPIC_PREFIX: &str = "sensors/";
const LEVEL_SUFFIX: &str = "/waterlevel";

/// Extracts the sensor id from `sensors/2/waterlevel` or `sensors/2`.
///
/// Numeric poles map to the same `pole<N>` id the dashboard feed uses.
pub fn sensor_id_from_topic(topic: &str) -> Option<String> {
    let rest = topic.strip_prefix(TOPIC_PREFIX)?;
    let id = rest.strip_suffix(LEVEL_SUFFIX).unwrap_or(rest);
    if id.is_empty() || id.contains('/') || id.contains('#') || id.contains('+') {
        return None;
    }
    Some(normalize_sensor_id(id))
}

/// Parses one MQTT message into a reading stamped with `received_at`.
pub fn parse_payload(topic: &str, payload: &[u8], received_at: DateTime<Utc>) -> Result<Reading, FeedError> {
    let sensor_id = sensor_id_from_topic(topic).ok_or_else(|| FeedError::InvalidReading {
        sensor_id: topic.to_string(),
        reason: format!("topic is not of the form {}<sensor_id>{}", TOPIC_PREFIX, LEVEL_SUFFIX),
    })?;

    let text = std::str::from_utf8(payload)
        .map_err(|e| FeedError::ParseError(format!("payload on {} is not UTF-8: {}", topic, e)))?;

    let level: f64 = text
        .trim()
        .parse()
        .map_err(|_| FeedError::ParseError(format!("payload '{}' on {} is not a number", text.trim(), topic)))?;

    if !level.is_finite() {
        return Err(FeedError::InvalidReading {
            sensor_id,
            reason: format!("level {} is not finite", level),
        });
    }

    Ok(Reading::new(sensor_id, level, received_at))
}
