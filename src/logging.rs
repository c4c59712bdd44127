/// Structured logging for the flood monitoring service
///
/// Provides context-rich logging with sensor identifiers,
/// timestamps, and severity levels. Supports both console output
/// and file-based logging for daemon operations.

use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::alert::AlarmSignal;
use crate::model::{AlertEvent, AlertLevel, FeedError};

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    #[serde(alias = "warn")]
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Log Sources
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    /// Dashboard REST feed
    Feed,
    /// MQTT sensor payloads
    Mqtt,
    /// Trend + state evaluation
    Monitor,
    /// System-wide alarm
    Alarm,
    Database,
    System,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Source::Feed => write!(f, "FEED"),
            Source::Mqtt => write!(f, "MQTT"),
            Source::Monitor => write!(f, "MON"),
            Source::Alarm => write!(f, "ALARM"),
            Source::Database => write!(f, "DB"),
            Source::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - a pole resent an old sample or sent garbage
    Expected,
    /// Unexpected failure - backend down, API contract changed
    Unexpected,
    /// Unknown - cannot determine if this is expected or not
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
    /// Whether to include timestamps in console output
    console_timestamps: bool,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>, console_timestamps: bool) {
        let logger = Logger {
            min_level,
            log_file,
            console_timestamps,
        };

        if let Ok(mut slot) = LOGGER.lock() {
            *slot = Some(logger);
        }
    }

    fn log(&self, level: LogLevel, source: Source, sensor_id: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let entry = format_entry(level, source, sensor_id, message);
        let sensor_part = sensor_id.map(|s| format!(" [{}]", s)).unwrap_or_default();

        if self.console_timestamps {
            match level {
                LogLevel::Error | LogLevel::Warning => eprintln!("{}", entry),
                LogLevel::Info | LogLevel::Debug => println!("{}", entry),
            }
        } else {
            match level {
                LogLevel::Error => eprintln!("   ✗ {}{}: {}", source, sensor_part, message),
                LogLevel::Warning => eprintln!("   ⚠ {}{}: {}", source, sensor_part, message),
                LogLevel::Info => println!("   {}{}: {}", source, sensor_part, message),
                LogLevel::Debug => {} // Skip debug in non-timestamp mode
            }
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

/// One log line: `2025-11-30 02:00:00 UTC WARN FEED [pole1]: message`
fn format_entry(level: LogLevel, source: Source, sensor_id: Option<&str>, message: &str) -> String {
    let timestamp = Utc::now().format("%Y-%m-%d %H:%M:%S UTC");
    let sensor_part = sensor_id.map(|s| format!(" [{}]", s)).unwrap_or_default();
    format!("{} {} {}{}: {}", timestamp, level, source, sensor_part, message)
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>, console_timestamps: bool) {
    Logger::init(min_level, log_file.map(String::from), console_timestamps);
}

fn emit(level: LogLevel, source: Source, sensor_id: Option<&str>, message: &str) {
    if let Ok(guard) = LOGGER.lock() {
        if let Some(logger) = guard.as_ref() {
            logger.log(level, source, sensor_id, message);
        }
    }
}

/// Log a general informational message
pub fn info(source: Source, sensor_id: Option<&str>, message: &str) {
    emit(LogLevel::Info, source, sensor_id, message);
}

/// Log a warning message
pub fn warn(source: Source, sensor_id: Option<&str>, message: &str) {
    emit(LogLevel::Warning, source, sensor_id, message);
}

/// Log an error message
pub fn error(source: Source, sensor_id: Option<&str>, message: &str) {
    emit(LogLevel::Error, source, sensor_id, message);
}

/// Log a debug message
pub fn debug(source: Source, sensor_id: Option<&str>, message: &str) {
    emit(LogLevel::Debug, source, sensor_id, message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a feed failure
pub fn classify_feed_failure(err: &FeedError) -> FailureType {
    match err {
        // Poles resend their last sample after a reconnect
        FeedError::OutOfOrder { .. } => FailureType::Expected,
        FeedError::InvalidReading { .. } => FailureType::Expected,
        FeedError::HttpError(_) => FailureType::Unexpected,
        // Parse errors suggest API changes or bugs
        FeedError::ParseError(_) => FailureType::Unexpected,
    }
}

/// Classify an error from the transport layer by its message
pub fn classify_transport_failure(error_message: &str) -> FailureType {
    if error_message.contains("timed out") || error_message.contains("timeout") {
        FailureType::Unknown
    } else if error_message.contains("HTTP") || error_message.contains("connect") {
        FailureType::Unexpected
    } else {
        FailureType::Unknown
    }
}

// ---------------------------------------------------------------------------
// Structured Logging
// ---------------------------------------------------------------------------

/// Log a feed failure with automatic classification
pub fn log_feed_failure(source: Source, operation: &str, err: &FeedError) {
    let failure_type = classify_feed_failure(err);
    let sensor_id = match err {
        FeedError::OutOfOrder { sensor_id, .. } | FeedError::InvalidReading { sensor_id, .. } => {
            Some(sensor_id.as_str())
        }
        _ => None,
    };

    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(source, sensor_id, &message),
        FailureType::Unexpected => error(source, sensor_id, &message),
        FailureType::Unknown => warn(source, sensor_id, &message),
    }
}

/// Log a transport-level failure (HTTP client, database connection)
pub fn log_transport_failure(source: Source, operation: &str, err: &dyn std::error::Error) {
    let error_msg = err.to_string();
    let failure_type = classify_transport_failure(&error_msg);
    let message = format!("{} failed [{}]: {}", operation, failure_type, error_msg);

    match failure_type {
        FailureType::Expected => debug(source, None, &message),
        FailureType::Unexpected => error(source, None, &message),
        FailureType::Unknown => warn(source, None, &message),
    }
}

/// Log an alert transition at a level matching its severity
pub fn log_alert_event(event: &AlertEvent) {
    let sensor = Some(event.sensor_id.as_str());
    match event.to_level {
        AlertLevel::Critical => error(Source::Monitor, sensor, &event.message),
        AlertLevel::Warning => warn(Source::Monitor, sensor, &event.message),
        AlertLevel::Normal => info(Source::Monitor, sensor, &event.message),
    }
}

/// Log a system alarm edge
pub fn log_alarm_signal(signal: AlarmSignal, active_sensors: &[&str]) {
    match signal {
        AlarmSignal::Start => error(
            Source::Alarm,
            None,
            &format!("FLOODING DETECTED - alarm activated ({})", active_sensors.join(", ")),
        ),
        AlarmSignal::Stop => info(Source::Alarm, None, "Flooding subsided - alarm stopped"),
    }
}

// ---------------------------------------------------------------------------
// Poll Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one feed poll
pub fn log_poll_summary(source: Source, total: usize, accepted: usize, rejected: usize) {
    let message = format!(
        "Poll complete: {}/{} readings accepted, {} rejected",
        accepted, total, rejected
    );

    if rejected == 0 {
        debug(source, None, &message);
    } else if accepted == 0 {
        error(source, None, &message);
    } else {
        warn(source, None, &message);
    }
}
