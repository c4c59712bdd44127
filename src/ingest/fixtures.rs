//! Representative feed payloads for tests.

/// Two poles, one DECIMAL-as-string level and one plain number.
pub const DASHBOARD_RESPONSE: &str = r#"{
  "readings": [
    { "sensor_id": 1, "name": "Pole 1", "water_level": "2.40", "recorded_at": "2025-11-30T08:00:00.000Z" },
    { "sensor_id": 2, "name": "Pole 2", "water_level": 6.25, "recorded_at": "2025-11-30T07:59:58.000Z" }
  ],
  "alerts": [
    { "id": 7, "severity": "critical", "message": "Floodwaters present.", "created_at": "2025-11-30T07:59:58.000Z" }
  ]
}"#;

/// One good row, one non-numeric level, one unparseable timestamp.
pub const DASHBOARD_RESPONSE_WITH_BAD_ROWS: &str = r#"{
  "readings": [
    { "sensor_id": 1, "water_level": "1.10", "recorded_at": "2025-11-30 08:00:00" },
    { "sensor_id": 2, "water_level": "n/a", "recorded_at": "2025-11-30 08:00:00" },
    { "sensor_id": 3, "water_level": 2.0, "recorded_at": "soon" }
  ],
  "alerts": []
}"#;

/// Paired entries as written by the live data generator.
pub const POLE_FILE: &str = r#"[
  { "id": 1, "PoleID": 1, "waterLevel": 5.02, "createsAt": "2025-11-30T02:00:00" },
  { "id": 2, "PoleID": 2, "waterLevel": 4.97, "createsAt": "2025-11-30T02:00:00" },
  { "id": 3, "PoleID": 1, "waterLevel": 5.12, "createsAt": "2025-11-30T02:15:00" },
  { "id": 4, "PoleID": 2, "waterLevel": 4.91, "createsAt": "2025-11-30T02:15:00" }
]"#;

/// Per-pole file without pole ids.
pub const SINGLE_POLE_FILE: &str = r#"[
  { "waterlevel": 1.5, "createdat": "2025-11-30T02:00:00Z" },
  { "waterlevel": 1.7, "createdat": "2025-11-30T02:00:05Z" }
]"#;
