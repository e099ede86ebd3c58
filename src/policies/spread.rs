//! # Randomized spreads for admission pacing.
//!
//! [`Spread`] and [`CountSpread`] add jitter to the pickup loop so that
//! independently-run engines do not fall into lock-step, and so that bursty
//! admission patterns can be simulated.
//!
//! # Example
//! ```rust
//! use std::time::Duration;
//! use pickvisor::{CountSpread, Spread};
//!
//! let fixed = Spread::fixed(Duration::from_millis(250));
//! assert_eq!(fixed.sample(), Duration::from_millis(250));
//!
//! let burst = CountSpread { base: 2.0, variance: 3.0 };
//! let n = burst.sample();
//! assert!((2..5).contains(&n));
//! ```

use std::time::Duration;

use rand::Rng;
use serde::Deserialize;

/// Randomized duration: `base + random[0, variance)`.
///
/// A zero `variance` yields exactly `base`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Spread {
    /// Minimum duration.
    #[serde(with = "crate::config::millis")]
    pub base: Duration,
    /// Maximum random addendum.
    #[serde(with = "crate::config::millis")]
    pub variance: Duration,
}

impl Spread {
    /// A spread without jitter.
    pub const fn fixed(base: Duration) -> Self {
        Self {
            base,
            variance: Duration::ZERO,
        }
    }

    /// A spread of `base + random[0, variance)`.
    pub const fn new(base: Duration, variance: Duration) -> Self {
        Self { base, variance }
    }

    /// Draws one duration.
    pub fn sample(&self) -> Duration {
        if self.variance.is_zero() {
            return self.base;
        }
        let extra = rand::rng().random::<f64>() * self.variance.as_secs_f64();
        self.base + Duration::from_secs_f64(extra)
    }

    /// Upper bound of [`sample`](Self::sample) (exclusive unless `variance` is zero).
    pub fn upper(&self) -> Duration {
        self.base + self.variance
    }
}

impl Default for Spread {
    /// Returns `1s + random[0, 4s)`.
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            variance: Duration::from_millis(4000),
        }
    }
}

/// Randomized per-cycle admission quota: `floor(random[0, 1) * variance + base)`.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CountSpread {
    /// Guaranteed part of the quota.
    pub base: f64,
    /// Random addendum range.
    pub variance: f64,
}

impl CountSpread {
    /// A fixed quota of `n` admissions per cycle.
    pub fn fixed(n: u32) -> Self {
        Self {
            base: f64::from(n),
            variance: 0.0,
        }
    }

    /// Whether both parts are finite and non-negative.
    pub fn is_valid(&self) -> bool {
        self.base.is_finite()
            && self.variance.is_finite()
            && self.base >= 0.0
            && self.variance >= 0.0
    }

    /// Draws one quota.
    pub fn sample(&self) -> usize {
        let r = if self.variance == 0.0 {
            0.0
        } else {
            rand::rng().random::<f64>()
        };
        let n = (r * self.variance + self.base).floor();
        if n.is_finite() && n > 0.0 { n as usize } else { 0 }
    }
}

impl Default for CountSpread {
    /// Returns a fixed quota of one.
    fn default() -> Self {
        Self::fixed(1)
    }
}
