/// Water-level analysis for the SafePass monitoring service.
///
/// Submodules:
/// - `history` — bounded, time-ordered reading window per sensor.
/// - `trend`   — least-squares trend and threshold-crossing projection.

pub mod history;
pub mod trend;

pub use history::SensorHistory;
pub use trend::{estimate_trend, estimate_trend_at, project_crossing, TrendConfig};
