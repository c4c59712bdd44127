/// Sensor reading staleness detection.
///
/// Poles report every few seconds under normal operation. A pole that goes
/// quiet during a storm is dangerous: its last level keeps showing on the
/// dashboard as if it were current. This module flags those gaps.
///
/// # Clock injection
/// All functions accept a `now: DateTime<Utc>` parameter rather than calling
/// `Utc::now()` internally, so tests stay deterministic.

use chrono::{DateTime, Utc};

use crate::model::Reading;

/// Returns `true` if the reading is older than `max_age_minutes` at `now`.
///
/// Staleness is strictly greater than the threshold:
///   age > max_age_minutes  →  stale
///   age == max_age_minutes →  not stale
pub fn is_stale_at(reading: &Reading, max_age_minutes: u64, now: DateTime<Utc>) -> bool {
    let age = now - reading.timestamp;
    // Readings from the future (clock skew) count as fresh.
    age.num_seconds() > (max_age_minutes as i64).saturating_mul(60)
}

/// Convenience wrapper that uses the real current time.
/// Use `is_stale_at` in tests to keep them deterministic.
pub fn is_stale(reading: &Reading, max_age_minutes: u64) -> bool {
    is_stale_at(reading, max_age_minutes, Utc::now())
}

/// Age of the reading in whole minutes at `now`, clamped at zero.
pub fn age_minutes(reading: &Reading, now: DateTime<Utc>) -> u64 {
    (now - reading.timestamp).num_minutes().max(0) as u64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
