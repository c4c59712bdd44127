//! Alerting for the SafePass monitoring service.
//!
//! - `thresholds` — level → `AlertLevel` classification.
//! - `state`      — edge-triggered per-sensor state machine.
//! - `aggregate`  — system-wide alarm start/stop edges.
//! - `message`    — notification text and time-to-flood formatting.
//! - `staleness`  — detection of sensors that stopped reporting.

pub mod aggregate;
pub mod message;
pub mod staleness;
pub mod state;
pub mod thresholds;

pub use aggregate::{AlarmAggregator, AlarmSignal};
pub use state::{critical_eta, evaluate};
pub use thresholds::classify_level;
