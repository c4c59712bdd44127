/// Human-readable alert text and time-to-flood formatting.
///
/// Produces the strings the dashboards and push notifications show. The
/// wording of the per-level messages matches what the road-status
/// notifications have always said.

use crate::model::AlertLevel;

/// A formatted time-to-flood estimate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EtaDisplay {
    pub text: String,
    /// Ten minutes or less away (or already flooding).
    pub urgent: bool,
}

/// Formats a projected crossing time. `None` means no estimate is shown.
pub fn format_eta(eta_secs: Option<f64>) -> Option<EtaDisplay> {
    let secs = eta_secs?;
    if !secs.is_finite() {
        return None;
    }

    if secs <= 0.0 {
        return Some(EtaDisplay {
            text: "FLOODING NOW".to_string(),
            urgent: true,
        });
    }
    if secs < 60.0 {
        return Some(EtaDisplay {
            text: "Less than 1 minute".to_string(),
            urgent: true,
        });
    }

    let minutes = (secs / 60.0).round() as u64;
    if minutes == 1 {
        return Some(EtaDisplay {
            text: "1 minute".to_string(),
            urgent: true,
        });
    }
    if minutes < 60 {
        return Some(EtaDisplay {
            text: format!("{} minutes", minutes),
            urgent: minutes <= 10,
        });
    }

    let hours = minutes / 60;
    let remaining = minutes % 60;
    let text = if remaining == 0 {
        format!("{} hour{}", hours, if hours > 1 { "s" } else { "" })
    } else {
        format!("{}h {}m", hours, remaining)
    };
    Some(EtaDisplay { text, urgent: false })
}

/// Base notification text for a level.
pub fn level_message(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::Critical => "Floodwaters present. Road closed for civilian safety.",
        AlertLevel::Warning => "Heavy rain in the area. Drive cautiously.",
        AlertLevel::Normal => "Roads clear. Safe to drive.",
    }
}

/// Full message attached to an `AlertEvent`.
///
/// The ETA is appended only while the sensor is still below critical.
pub fn transition_message(
    sensor_id: &str,
    from: AlertLevel,
    to: AlertLevel,
    level_inches: f64,
    eta: Option<&EtaDisplay>,
) -> String {
    let mut message = format!(
        "{}: {} -> {} at {:.2} in. {}",
        sensor_id,
        from,
        to,
        level_inches,
        level_message(to)
    );
    if to != AlertLevel::Critical {
        if let Some(eta) = eta {
            message.push_str(&format!(" Flooding in ~{}.", eta.text));
        }
    }
    message
}
