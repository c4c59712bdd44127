/// Display-unit conversion.
///
/// All levels are stored and computed in inches. These helpers only exist
/// for presentation (dashboard labels, log lines) and for accepting
/// threshold input typed in another unit.

use serde::Deserialize;

const CM_PER_INCH: f64 = 2.54;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceUnit {
    #[default]
    Inches,
    Centimeters,
}

impl DistanceUnit {
    pub fn label(self) -> &'static str {
        match self {
            DistanceUnit::Inches => "inches",
            DistanceUnit::Centimeters => "cm",
        }
    }
}

/// Converts a canonical level to the display unit.
pub fn to_display(inches: f64, unit: DistanceUnit) -> f64 {
    match unit {
        DistanceUnit::Inches => inches,
        DistanceUnit::Centimeters => inches * CM_PER_INCH,
    }
}

/// Converts a value typed in `unit` back to inches.
pub fn to_inches(value: f64, unit: DistanceUnit) -> f64 {
    match unit {
        DistanceUnit::Inches => value,
        DistanceUnit::Centimeters => value / CM_PER_INCH,
    }
}

/// Two-decimal level with its unit label, e.g. `"6.35 cm"`.
pub fn format_level(inches: f64, unit: DistanceUnit) -> String {
    format!("{:.2} {}", to_display(inches, unit), unit.label())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centimeter_conversion() {
        assert!((to_display(1.0, DistanceUnit::Centimeters) - 2.54).abs() < 1e-12);
        assert!((to_inches(2.54, DistanceUnit::Centimeters) - 1.0).abs() < 1e-12);
        assert_eq!(to_display(3.0, DistanceUnit::Inches), 3.0);
    }

    #[test]
    fn test_format_level_uses_two_decimals() {
        assert_eq!(format_level(2.5, DistanceUnit::Inches), "2.50 inches");
        assert_eq!(format_level(2.5, DistanceUnit::Centimeters), "6.35 cm");
    }
}
