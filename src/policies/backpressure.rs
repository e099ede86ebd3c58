//! # Backpressure policy driven by health scores.
//!
//! Health checks return a score: `1` = healthy, `0` = unhealthy but tolerable,
//! negative = severe. [`BackpressurePolicy`] decides whether a score changes
//! admission.
//!
//! - [`BackpressurePolicy::Observe`] scores are recorded and published only (default).
//! - [`BackpressurePolicy::HoldOnNegative`] a negative score holds admission for
//!   `abs(score) * unit`, capped at `max`. The pickup loop keeps cycling while held.

use std::time::Duration;

use serde::Deserialize;

/// Reaction of the pickup loop to a health score.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum BackpressurePolicy {
    /// Never act on scores.
    #[default]
    Observe,

    /// Hold admission after a negative score.
    HoldOnNegative {
        /// Hold length per unit of negative score.
        #[serde(with = "crate::config::millis")]
        unit: Duration,
        /// Longest single hold.
        #[serde(with = "crate::config::millis")]
        max: Duration,
    },
}

impl BackpressurePolicy {
    /// Returns how long admission should be held after `score`, if at all.
    pub fn hold_for(&self, score: f64) -> Option<Duration> {
        match *self {
            BackpressurePolicy::Observe => None,
            BackpressurePolicy::HoldOnNegative { unit, max } => {
                if score.is_nan() || score >= 0.0 {
                    return None;
                }
                let secs = unit.as_secs_f64() * score.abs();
                let hold = if !secs.is_finite() || secs > max.as_secs_f64() {
                    max
                } else {
                    Duration::from_secs_f64(secs)
                };
                (!hold.is_zero()).then_some(hold)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hold() -> BackpressurePolicy {
        BackpressurePolicy::HoldOnNegative {
            unit: Duration::from_secs(1),
            max: Duration::from_secs(10),
        }
    }

    #[test]
    fn test_observe_never_holds() {
        assert_eq!(BackpressurePolicy::Observe.hold_for(-5.0), None);
    }

    #[test]
    fn test_non_negative_scores_never_hold() {
        assert_eq!(hold().hold_for(1.0), None);
        assert_eq!(hold().hold_for(0.0), None);
        assert_eq!(hold().hold_for(f64::NAN), None);
    }

    #[test]
    fn test_negative_scales_with_unit() {
        assert_eq!(hold().hold_for(-2.5), Some(Duration::from_millis(2500)));
    }

    #[test]
    fn test_hold_is_capped() {
        assert_eq!(hold().hold_for(-1e9), Some(Duration::from_secs(10)));
        assert_eq!(hold().hold_for(f64::NEG_INFINITY), Some(Duration::from_secs(10)));
    }
}
