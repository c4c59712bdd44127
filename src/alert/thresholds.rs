//! Water-level threshold classification.
//!
//! The single place where a level in inches is mapped to an alert level.
//! Every dashboard status icon and every state transition derives from
//! `classify_level`.

use crate::model::{AlertLevel, ThresholdSet};

/// Maps a level to its alert level.
///
/// Boundaries are inclusive: a level exactly at a threshold is in the
/// higher bucket.
pub fn classify_level(level: f64, thresholds: &ThresholdSet) -> AlertLevel {
    if level >= thresholds.critical {
        AlertLevel::Critical
    } else if level >= thresholds.warning {
        AlertLevel::Warning
    } else {
        AlertLevel::Normal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels_below_warning_are_normal() {
        let t = ThresholdSet::default();
        assert_eq!(classify_level(0.0, &t), AlertLevel::Normal);
        assert_eq!(classify_level(2.99, &t), AlertLevel::Normal);
        assert_eq!(classify_level(-1.0, &t), AlertLevel::Normal);
    }

    #[test]
    fn test_threshold_boundaries_are_inclusive() {
        let t = ThresholdSet::default();
        assert_eq!(classify_level(3.0, &t), AlertLevel::Warning);
        assert_eq!(classify_level(5.99, &t), AlertLevel::Warning);
        assert_eq!(classify_level(6.0, &t), AlertLevel::Critical);
        assert_eq!(classify_level(12.0, &t), AlertLevel::Critical);
    }

    #[test]
    fn test_classification_is_monotone_in_level() {
        let t = ThresholdSet::new(2.5, 6.0).unwrap();
        let mut previous = AlertLevel::Normal;
        for tenth in 0..100 {
            let level = classify_level(tenth as f64 / 10.0, &t);
            assert!(level >= previous, "classification dropped at {}", tenth);
            previous = level;
        }
    }
}
