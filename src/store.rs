/// Postgres persistence for readings and alert events.
///
/// Optional: enabled when `DATABASE_URL` is set. Used to warm each
/// sensor's trend window at startup and to keep a record of every alert
/// transition the monitor emits.
///
/// Expected tables (owned by the backend, not created here):
///   sensor_readings(sensor_id TEXT, water_level DOUBLE PRECISION, recorded_at TIMESTAMPTZ)
///   alerts(id TEXT, sensor_id TEXT, from_level TEXT, to_level TEXT,
///          water_level DOUBLE PRECISION, message TEXT, eta_secs DOUBLE PRECISION,
///          urgent BOOLEAN, created_at TIMESTAMPTZ)

use std::env;

use chrono::{DateTime, Utc};
use postgres::{Client, NoTls};

use crate::model::{AlertEvent, Reading};

pub const DATABASE_URL_ENV: &str = "DATABASE_URL";

/// Connects using `DATABASE_URL`, or returns `Ok(None)` when it is unset.
pub fn connect_from_env() -> Result<Option<Client>, postgres::Error> {
    dotenv::dotenv().ok();
    match env::var(DATABASE_URL_ENV) {
        Ok(url) => Client::connect(&url, NoTls).map(Some),
        Err(_) => Ok(None),
    }
}

/// Fetches up to `limit` of the most recent readings for a sensor,
/// returned oldest first so they can be ingested in order.
pub fn fetch_recent_readings(
    client: &mut Client,
    sensor_id: &str,
    limit: usize,
) -> Result<Vec<Reading>, postgres::Error> {
    let rows = client.query(
        "SELECT sensor_id, water_level, recorded_at
         FROM sensor_readings
         WHERE sensor_id = $1
         ORDER BY recorded_at DESC
         LIMIT $2",
        &[&sensor_id, &(limit as i64)],
    )?;

    let mut readings: Vec<Reading> = rows
        .iter()
        .map(|row| Reading {
            sensor_id: row.get(0),
            level: row.get(1),
            timestamp: row.get::<_, DateTime<Utc>>(2),
        })
        .collect();
    readings.reverse();
    Ok(readings)
}

/// Inserts one alert event. Re-recording the same event id is a no-op.
pub fn record_alert(client: &mut Client, event: &AlertEvent) -> Result<(), postgres::Error> {
    let from_level = event.from_level.to_string();
    let to_level = event.to_level.to_string();
    client.execute(
        "INSERT INTO alerts
            (id, sensor_id, from_level, to_level, water_level, message, eta_secs, urgent, created_at)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
         ON CONFLICT (id) DO NOTHING",
        &[
            &event.id,
            &event.sensor_id,
            &from_level,
            &to_level,
            &event.level_inches,
            &event.message,
            &event.eta_secs,
            &event.urgent,
            &event.timestamp,
        ],
    )?;
    Ok(())
}
