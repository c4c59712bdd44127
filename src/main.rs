/// SafePass flood monitoring service.
///
/// Polls the dashboard backend for pole readings, runs them through the
/// flood monitor, and logs alert transitions and alarm edges. With
/// `--replay` it feeds a recorded pole file instead; with `--verify` it
/// checks the feed against the configured sensors and prints a JSON report.

use std::collections::HashSet;
use std::error::Error;
use std::path::{Path, PathBuf};
use std::process;
use std::thread;
use std::time::Duration;

use chrono::Utc;
use clap::Parser;
use postgres::Client;

use safepass_service::alert::message::format_eta;
use safepass_service::alert::staleness::{age_minutes, is_stale_at};
use safepass_service::config::{load_config, MonitorConfig};
use safepass_service::dev_mode::Replay;
use safepass_service::ingest::dashboard::{build_dashboard_url, fetch_readings};
use safepass_service::logging::{self, Source};
use safepass_service::model::Reading;
use safepass_service::monitor::{FloodMonitor, Outcome};
use safepass_service::units::format_level;
use safepass_service::{store, verify};

const HTTP_TIMEOUT_SECS: u64 = 10;

#[derive(Parser, Debug)]
#[command(name = "safepass_service", version, about = "Roadside flood-pole monitoring service")]
struct Cli {
    /// Config file (default: $SAFEPASS_CONFIG or ./safepass.toml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Replay a recorded pole file instead of polling the feed
    #[arg(long, conflicts_with = "verify")]
    replay: Option<PathBuf>,

    /// Sensor id for replay entries that carry no pole id
    #[arg(long, requires = "replay")]
    sensor: Option<String>,

    /// Check the feed against the configured sensors and exit
    #[arg(long)]
    verify: bool,

    /// Run a single poll (or replay without pacing) and exit
    #[arg(long)]
    once: bool,
}

fn main() {
    let cli = Cli::parse();

    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("safepass_service: {}", e);
            process::exit(2);
        }
    };

    logging::init_logger(
        config.logging.level,
        config.logging.file.as_deref(),
        config.logging.timestamps,
    );

    let result = if cli.verify {
        run_verify(&config)
    } else if let Some(path) = cli.replay.as_deref() {
        run_replay(&config, path, cli.sensor.as_deref(), cli.once)
    } else {
        run_live(&config, cli.once)
    };

    if let Err(e) = result {
        logging::error(Source::System, None, &e.to_string());
        eprintln!("safepass_service: {}", e);
        process::exit(1);
    }
}

// ---------------------------------------------------------------------------
// Modes
// ---------------------------------------------------------------------------

fn http_client() -> Result<reqwest::blocking::Client, reqwest::Error> {
    reqwest::blocking::Client::builder()
        .timeout(Duration::from_secs(HTTP_TIMEOUT_SECS))
        .build()
}

fn run_verify(config: &MonitorConfig) -> Result<(), Box<dyn Error>> {
    let client = http_client()?;
    let report = verify::verify_feed(&client, config)?;
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn run_live(config: &MonitorConfig, once: bool) -> Result<(), Box<dyn Error>> {
    let client = http_client()?;
    let url = build_dashboard_url(&config.feed.base_url, config.feed.region_id);
    let mut monitor = FloodMonitor::new(config.thresholds, config.trend);
    let mut db = connect_database();

    if let Some(client) = db.as_mut() {
        warm_up(&mut monitor, client, config);
    }

    logging::info(
        Source::System,
        None,
        &format!(
            "Polling {} every {}s (warning {:.2} in, critical {:.2} in)",
            url, config.feed.poll_interval_secs, config.thresholds.warning, config.thresholds.critical
        ),
    );

    let mut stale: HashSet<String> = HashSet::new();
    loop {
        match fetch_readings(&client, &url) {
            Ok(batch) => {
                for err in &batch.rejected {
                    logging::log_feed_failure(Source::Feed, "parse reading", err);
                }
                let fresh: Vec<Reading> = batch
                    .readings
                    .into_iter()
                    .filter(|r| is_new(&monitor, r))
                    .collect();
                let fresh_count = fresh.len();
                let accepted = process_readings(&mut monitor, config, &mut db, fresh);
                logging::log_poll_summary(
                    Source::Feed,
                    fresh_count + batch.rejected.len(),
                    accepted,
                    fresh_count - accepted + batch.rejected.len(),
                );
            }
            Err(e) => logging::log_transport_failure(Source::Feed, "dashboard poll", e.as_ref()),
        }

        check_staleness(&monitor, config, &mut stale);

        if once {
            return Ok(());
        }
        thread::sleep(Duration::from_secs(config.feed.poll_interval_secs));
    }
}

fn run_replay(
    config: &MonitorConfig,
    path: &Path,
    sensor_id: Option<&str>,
    once: bool,
) -> Result<(), Box<dyn Error>> {
    let mut replay = Replay::from_file(path, sensor_id)?;
    for err in &replay.rejected {
        logging::log_feed_failure(Source::Feed, "replay entry", err);
    }

    if let Some((start, end)) = replay.time_range() {
        logging::info(
            Source::System,
            None,
            &format!(
                "Replaying {} readings from {} ({} to {})",
                replay.remaining(),
                path.display(),
                start.format("%Y-%m-%d %H:%M:%S"),
                end.format("%Y-%m-%d %H:%M:%S")
            ),
        );
    }

    let mut monitor = FloodMonitor::new(config.thresholds, config.trend);
    let mut db = None;
    while let Some(tick) = replay.next_tick() {
        process_readings(&mut monitor, config, &mut db, tick);
        if !once && replay.remaining() > 0 {
            thread::sleep(Duration::from_secs(config.feed.poll_interval_secs));
        }
    }

    logging::info(
        Source::System,
        None,
        &format!("Replay finished, alarm {}", if monitor.alarm_active() { "ON" } else { "off" }),
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn connect_database() -> Option<Client> {
    match store::connect_from_env() {
        Ok(Some(client)) => {
            logging::info(Source::Database, None, "Connected; alerts will be recorded");
            Some(client)
        }
        Ok(None) => {
            logging::debug(Source::Database, None, "DATABASE_URL not set; persistence disabled");
            None
        }
        Err(e) => {
            logging::log_transport_failure(Source::Database, "connect", &e);
            None
        }
    }
}

/// Seeds every configured sensor's window from stored history. Only the
/// resulting alarm edge is reported; the transitions were recorded when
/// they first happened.
fn warm_up(monitor: &mut FloodMonitor, client: &mut Client, config: &MonitorConfig) {
    for sensor in &config.sensors {
        match store::fetch_recent_readings(client, &sensor.id, config.trend.window_size) {
            Ok(readings) => {
                let count = readings.len();
                let (outcomes, errors) = monitor.ingest_batch(readings);
                for err in &errors {
                    logging::log_feed_failure(Source::Database, "warm-up", err);
                }
                for signal in outcomes.iter().filter_map(|o| o.alarm) {
                    logging::log_alarm_signal(signal, &monitor.active_sensors());
                }
                logging::debug(
                    Source::Database,
                    Some(&sensor.id),
                    &format!("Warmed history with {} readings", count),
                );
            }
            Err(e) => logging::log_transport_failure(Source::Database, "fetch recent readings", &e),
        }
    }
}

/// The dashboard repeats each sensor's latest row until a new one arrives.
fn is_new(monitor: &FloodMonitor, reading: &Reading) -> bool {
    monitor
        .latest_reading(&reading.sensor_id)
        .map_or(true, |latest| reading.timestamp > latest.timestamp)
}

/// Ingests readings and reports what they produced. Returns how many were accepted.
fn process_readings(
    monitor: &mut FloodMonitor,
    config: &MonitorConfig,
    db: &mut Option<Client>,
    readings: Vec<Reading>,
) -> usize {
    let (outcomes, errors) = monitor.ingest_batch(readings);
    for err in &errors {
        logging::log_feed_failure(Source::Monitor, "ingest", err);
    }
    for outcome in &outcomes {
        report_outcome(monitor, config, db, outcome);
    }
    outcomes.len()
}

fn report_outcome(monitor: &FloodMonitor, config: &MonitorConfig, db: &mut Option<Client>, outcome: &Outcome) {
    let sensor_id = outcome.state.sensor_id.as_str();

    if let Some(reading) = monitor.latest_reading(sensor_id) {
        let eta = format_eta(outcome.eta_secs)
            .map(|eta| format!(", flooding in {}", eta.text))
            .unwrap_or_default();
        logging::debug(
            Source::Monitor,
            Some(sensor_id),
            &format!(
                "{}: {} ({}){}",
                config.display_name(sensor_id),
                format_level(reading.level, config.display.unit),
                outcome.state.level,
                eta
            ),
        );
    }

    if let Some(event) = &outcome.event {
        logging::log_alert_event(event);
        if let Some(client) = db.as_mut() {
            if let Err(e) = store::record_alert(client, event) {
                logging::log_transport_failure(Source::Database, "record alert", &e);
            }
        }
    }

    if let Some(signal) = outcome.alarm {
        logging::log_alarm_signal(signal, &monitor.active_sensors());
    }
}

/// Warns once when a tracked sensor goes quiet and again when it recovers.
fn check_staleness(monitor: &FloodMonitor, config: &MonitorConfig, stale: &mut HashSet<String>) {
    let now = Utc::now();
    for sensor_id in monitor.sensor_ids() {
        let Some(latest) = monitor.latest_reading(sensor_id) else {
            continue;
        };
        if is_stale_at(latest, config.feed.stale_after_minutes, now) {
            if stale.insert(sensor_id.to_string()) {
                logging::warn(
                    Source::Feed,
                    Some(sensor_id),
                    &format!("No reading for {} minutes", age_minutes(latest, now)),
                );
            }
        } else if stale.remove(sensor_id) {
            logging::info(Source::Feed, Some(sensor_id), "Reporting again");
        }
    }
}
