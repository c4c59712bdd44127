/// safepass_service: roadside flood-pole monitoring and alerting.
///
/// # Module structure
///
/// ```text
/// safepass_service
/// ├── model       — shared data types (Reading, ThresholdSet, AlertEvent, FeedError, …)
/// ├── config      — TOML configuration: thresholds, trend window, feed, sensors
/// ├── logging     — structured log lines with failure classification
/// ├── units       — inches / centimeters display conversion
/// ├── analysis
/// │   ├── history — bounded per-sensor reading window
/// │   └── trend   — least-squares slope and threshold-crossing projection
/// ├── alert
/// │   ├── thresholds — level classification
/// │   ├── state      — edge-triggered per-sensor alert state machine
/// │   ├── aggregate  — system-wide alarm start/stop edges
/// │   ├── message    — notification text and time-to-flood formatting
/// │   └── staleness  — sensors that stopped reporting
/// ├── monitor     — ties history, trend and alert state together per reading
/// ├── ingest
/// │   ├── dashboard — backend REST feed and pole replay files
/// │   ├── mqtt      — `sensors/<id>` payloads
/// │   └── fixtures (test only) — representative payloads
/// ├── store       — optional Postgres history warm-up and alert log
/// ├── dev_mode    — replay of recorded pole data
/// └── verify      — feed vs. configuration check
/// ```

pub mod alert;
pub mod analysis;
pub mod config;
pub mod dev_mode;
pub mod ingest;
pub mod logging;
pub mod model;
pub mod monitor;
pub mod store;
pub mod units;
pub mod verify;
