/// Water-level trend estimation and flood-time projection.
///
/// Fits an ordinary least-squares line of level (inches) against elapsed
/// seconds over a sensor's trailing window, then projects when that line
/// crosses a threshold.
///
/// # Numerics
/// Time is measured from a reference instant (by default the first sample
/// in the window) rather than from the epoch, and the slope uses the
/// centered form `(Σxy − ΣxΣy/n) / (Σx² − (Σx)²/n)`. With epoch-sized x
/// values the naive normal equations lose every significant digit.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::{Reading, Trend, TrendResult, TrendUnavailable};

/// Default number of trailing readings fed to the regression.
pub const DEFAULT_WINDOW_SIZE: usize = 10;

/// Projections further out than this (seconds) are suppressed.
pub const DEFAULT_MAX_HORIZON_SECS: f64 = 7200.0;

/// Relative tolerance under which the time-axis variance counts as zero.
const DEGENERATE_TOLERANCE: f64 = 1e-12;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Trend window and projection horizon, loaded from the `[trend]` section.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrendConfig {
    pub window_size: usize,
    pub max_horizon_secs: f64,
}

impl Default for TrendConfig {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            max_horizon_secs: DEFAULT_MAX_HORIZON_SECS,
        }
    }
}

// ---------------------------------------------------------------------------
// Estimation
// ---------------------------------------------------------------------------

/// Fits a trend over `window`, measuring time from the first sample.
///
/// The window must contain readings from a single sensor in non-decreasing
/// timestamp order. Returns `Trend::Unavailable` for fewer than two samples
/// or when every sample shares the same timestamp.
pub fn estimate_trend(window: &[Reading]) -> Trend {
    match window.first() {
        Some(first) => estimate_trend_at(window, first.timestamp),
        None => Trend::Unavailable(TrendUnavailable::InsufficientData { sample_count: 0 }),
    }
}

/// Fits a trend over `window`, measuring time from `reference`.
///
/// The returned `intercept` is the fitted level at `reference`, and
/// `window_start` is `reference`.
pub fn estimate_trend_at(window: &[Reading], reference: DateTime<Utc>) -> Trend {
    let n = window.len();
    if n < 2 {
        return Trend::Unavailable(TrendUnavailable::InsufficientData { sample_count: n });
    }

    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_x2 = 0.0;
    let mut last_x = 0.0;

    for reading in window {
        let x = elapsed_secs(reference, reading.timestamp);
        let y = reading.level;
        sum_x += x;
        sum_y += y;
        sum_xy += x * y;
        sum_x2 += x * x;
        last_x = x;
    }

    let n_f = n as f64;
    let denominator = sum_x2 - (sum_x * sum_x / n_f);
    if denominator.abs() <= DEGENERATE_TOLERANCE * sum_x2.max(1.0) {
        return Trend::Unavailable(TrendUnavailable::DegenerateRegression);
    }

    let slope = (sum_xy - (sum_x * sum_y / n_f)) / denominator;
    let intercept = (sum_y - slope * sum_x) / n_f;

    Trend::Available(TrendResult {
        slope,
        intercept,
        window_start: reference,
        sample_count: n,
        last_sample_offset_secs: last_x,
    })
}

// ---------------------------------------------------------------------------
// Projection
// ---------------------------------------------------------------------------

/// Seconds from the newest sample until the fitted line reaches `threshold`.
///
/// Returns `None` when the level is not rising (`slope <= 0`), when the
/// result is not finite, or when it lies beyond `max_horizon_secs`.
/// A line that has already passed the threshold yields `Some(0.0)`.
pub fn project_crossing(trend: &TrendResult, threshold: f64, max_horizon_secs: f64) -> Option<f64> {
    if trend.slope.is_nan() || trend.slope <= 0.0 {
        return None;
    }

    let crossing = (threshold - trend.intercept) / trend.slope - trend.last_sample_offset_secs;
    if !crossing.is_finite() || crossing > max_horizon_secs {
        return None;
    }

    Some(crossing.max(0.0))
}

fn elapsed_secs(reference: DateTime<Utc>, at: DateTime<Utc>) -> f64 {
    (at - reference).num_milliseconds() as f64 / 1000.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 11, 30, 2, 0, 0).unwrap()
    }

    fn reading_at(offset_secs: i64, level: f64) -> Reading {
        Reading::new("pole1", level, t0() + Duration::seconds(offset_secs))
    }

    fn available(trend: Trend) -> TrendResult {
        match trend {
            Trend::Available(result) => result,
            Trend::Unavailable(why) => panic!("expected a trend, got {:?}", why),
        }
    }

    // --- Estimation ---------------------------------------------------------

    #[test]
    fn test_empty_and_single_point_windows_are_insufficient() {
        assert_eq!(
            estimate_trend(&[]),
            Trend::Unavailable(TrendUnavailable::InsufficientData { sample_count: 0 })
        );
        assert_eq!(
            estimate_trend(&[reading_at(0, 2.0)]),
            Trend::Unavailable(TrendUnavailable::InsufficientData { sample_count: 1 })
        );
    }

    #[test]
    fn test_identical_timestamps_are_degenerate() {
        let window = vec![reading_at(0, 1.0), reading_at(0, 2.0), reading_at(0, 3.0)];
        assert_eq!(
            estimate_trend(&window),
            Trend::Unavailable(TrendUnavailable::DegenerateRegression)
        );
    }

    #[test]
    fn test_synthetic_linear_series_is_recovered() {
        // level = 0.01 * t + 2, sampled every 10 seconds.
        let window: Vec<Reading> = (0..10)
            .map(|i| {
                let t = i * 10;
                reading_at(t, 0.01 * t as f64 + 2.0)
            })
            .collect();

        let trend = available(estimate_trend(&window));
        assert!((trend.slope - 0.01).abs() < 1e-6, "slope was {}", trend.slope);
        assert!((trend.intercept - 2.0).abs() < 1e-6, "intercept was {}", trend.intercept);
        assert_eq!(trend.sample_count, 10);
        assert_eq!(trend.last_sample_offset_secs, 90.0);
        assert_eq!(trend.window_start, t0());
    }

    #[test]
    fn test_flat_window_has_zero_slope() {
        let window: Vec<Reading> = (0..5).map(|i| reading_at(i * 60, 4.2)).collect();
        let trend = available(estimate_trend(&window));
        assert!(trend.slope.abs() < 1e-12, "slope was {}", trend.slope);
        assert_eq!(project_crossing(&trend, 6.0, DEFAULT_MAX_HORIZON_SECS), None);
    }

    #[test]
    fn test_duplicate_timestamps_within_a_spread_window_still_fit() {
        let window = vec![reading_at(0, 1.0), reading_at(0, 1.0), reading_at(10, 2.0)];
        assert!(estimate_trend(&window).is_available());
    }

    #[test]
    fn test_reference_time_shifts_intercept_not_slope() {
        let window: Vec<Reading> = (0..4).map(|i| reading_at(i * 30, 1.0 + 0.1 * i as f64)).collect();
        let from_first = available(estimate_trend(&window));
        let from_earlier = available(estimate_trend_at(&window, t0() - Duration::seconds(30)));

        assert!((from_first.slope - from_earlier.slope).abs() < 1e-9);
        // One step earlier the fitted line sits 0.1 in lower.
        assert!((from_earlier.intercept - (from_first.intercept - 0.1)).abs() < 1e-9);
        assert_eq!(from_earlier.last_sample_offset_secs, 120.0);
    }

    #[test]
    fn test_epoch_sized_offsets_do_not_lose_precision() {
        // Readings ten years after the reference still fit cleanly because
        // elapsed time is measured from the first sample.
        let start = t0() + Duration::days(3650);
        let window: Vec<Reading> = (0..10)
            .map(|i| Reading::new("pole1", 2.0 + 0.005 * (i * 15) as f64, start + Duration::seconds(i * 15)))
            .collect();
        let trend = available(estimate_trend(&window));
        assert!((trend.slope - 0.005).abs() < 1e-9);
    }

    // --- Projection ---------------------------------------------------------

    #[test]
    fn test_two_point_rising_window_projects_positive_crossing() {
        let window = vec![reading_at(0, 1.0), reading_at(60, 2.0)];
        let trend = available(estimate_trend(&window));
        let eta = project_crossing(&trend, 6.0, DEFAULT_MAX_HORIZON_SECS)
            .expect("rising trend below threshold should project");
        assert!(eta.is_finite() && eta > 0.0);
        // 1 in/min, 4 in to go from the last sample.
        assert!((eta - 240.0).abs() < 1e-6, "eta was {}", eta);
    }

    #[test]
    fn test_falling_trend_never_projects() {
        let window = vec![reading_at(0, 5.0), reading_at(60, 4.0)];
        let trend = available(estimate_trend(&window));
        assert_eq!(project_crossing(&trend, 6.0, DEFAULT_MAX_HORIZON_SECS), None);
    }

    #[test]
    fn test_projection_beyond_horizon_is_suppressed() {
        let trend = TrendResult {
            slope: 0.001,
            intercept: 0.0,
            window_start: t0(),
            sample_count: 10,
            last_sample_offset_secs: 0.0,
        };
        assert_eq!(project_crossing(&trend, 10.0, 7200.0), None);
        let eta = project_crossing(&trend, 10.0, 20_000.0).expect("within a wider horizon");
        assert!((eta - 10_000.0).abs() < 1e-6);
    }

    #[test]
    fn test_line_already_past_threshold_reports_zero() {
        let window = vec![reading_at(0, 5.0), reading_at(60, 7.0)];
        let trend = available(estimate_trend(&window));
        assert_eq!(project_crossing(&trend, 6.0, DEFAULT_MAX_HORIZON_SECS), Some(0.0));
    }

    #[test]
    fn test_non_finite_projection_is_suppressed() {
        let trend = TrendResult {
            slope: f64::MIN_POSITIVE,
            intercept: 0.0,
            window_start: t0(),
            sample_count: 2,
            last_sample_offset_secs: 0.0,
        };
        assert_eq!(project_crossing(&trend, f64::MAX, f64::INFINITY), None);
    }
}
