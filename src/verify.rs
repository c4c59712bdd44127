//! Feed Verification Module
//!
//! Checks the live feed against the configured sensors to determine which
//! poles are reporting, which have gone quiet, and whether the feed carries
//! readings from poles nobody configured.
//!
//! Use this after installing a pole or editing the sensor list.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alert::staleness::{age_minutes, is_stale_at};
use crate::config::{MonitorConfig, SensorConfig};
use crate::ingest::dashboard::{build_dashboard_url, fetch_readings};
use crate::model::Reading;

// ============================================================================
// Verification Results
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct VerificationReport {
    pub timestamp: String,
    pub feed_url: String,
    pub sensors: Vec<SensorVerification>,
    /// Sensor ids present in the feed but missing from configuration.
    pub unknown_sensors: Vec<String>,
    /// Rows the feed returned that could not be parsed.
    pub rejected_rows: usize,
    pub summary: VerificationSummary,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerificationSummary {
    pub total: usize,
    pub reporting: usize,
    pub stale: usize,
    pub missing: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct SensorVerification {
    pub sensor_id: String,
    pub name: String,
    pub status: VerificationStatus,
    pub sample_count: usize,
    pub latest_level: Option<f64>,
    pub latest_at: Option<String>,
    pub age_minutes: Option<u64>,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub enum VerificationStatus {
    Reporting,
    Stale,
    Missing,
}

// ============================================================================
// Report construction
// ============================================================================

/// Classifies every configured sensor against a set of feed readings.
pub fn build_report(
    feed_url: &str,
    sensors: &[SensorConfig],
    readings: &[Reading],
    rejected_rows: usize,
    now: DateTime<Utc>,
    stale_after_minutes: u64,
) -> VerificationReport {
    let mut results = Vec::with_capacity(sensors.len());

    for sensor in sensors {
        let own: Vec<&Reading> = readings.iter().filter(|r| r.sensor_id == sensor.id).collect();
        let latest = own.iter().max_by_key(|r| r.timestamp).copied();

        let status = match latest {
            None => VerificationStatus::Missing,
            Some(r) if is_stale_at(r, stale_after_minutes, now) => VerificationStatus::Stale,
            Some(_) => VerificationStatus::Reporting,
        };

        results.push(SensorVerification {
            sensor_id: sensor.id.clone(),
            name: sensor.name.clone(),
            status,
            sample_count: own.len(),
            latest_level: latest.map(|r| r.level),
            latest_at: latest.map(|r| r.timestamp.to_rfc3339()),
            age_minutes: latest.map(|r| age_minutes(r, now)),
        });
    }

    let mut unknown_sensors: Vec<String> = readings
        .iter()
        .filter(|r| !sensors.iter().any(|s| s.id == r.sensor_id))
        .map(|r| r.sensor_id.clone())
        .collect();
    unknown_sensors.sort();
    unknown_sensors.dedup();

    let count = |status: VerificationStatus| results.iter().filter(|r| r.status == status).count();
    let summary = VerificationSummary {
        total: results.len(),
        reporting: count(VerificationStatus::Reporting),
        stale: count(VerificationStatus::Stale),
        missing: count(VerificationStatus::Missing),
    };

    VerificationReport {
        timestamp: now.to_rfc3339(),
        feed_url: feed_url.to_string(),
        sensors: results,
        unknown_sensors,
        rejected_rows,
        summary,
    }
}

/// Fetches the configured feed once and builds a report from it.
pub fn verify_feed(
    client: &reqwest::blocking::Client,
    config: &MonitorConfig,
) -> Result<VerificationReport, Box<dyn std::error::Error>> {
    let url = build_dashboard_url(&config.feed.base_url, config.feed.region_id);
    let batch = fetch_readings(client, &url)?;
    Ok(build_report(
        &url,
        &config.sensors,
        &batch.readings,
        batch.rejected.len(),
        Utc::now(),
        config.feed.stale_after_minutes,
    ))
}
