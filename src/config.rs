//! # Engine configuration.
//!
//! Provides [`EngineConfig`], the explicit settings struct for one engine
//! (one task kind). A [`TaskKind`](crate::TaskKind) supplies its own defaults
//! through [`TaskKind::config`](crate::TaskKind::config); an explicit config given
//! to the builder replaces them wholesale.
//!
//! Config is validated exactly once, by [`EngineBuilder::build`](crate::EngineBuilder::build).
//!
//! ## Sentinel values
//! - `max_concurrent = 0` → the loop keeps cycling but admits nothing ("paused but alive")
//! - `max_result_cache = 0` / `max_error_cache = 0` → outcomes are counted but not retained
//!
//! ## TOML
//! Durations are integer milliseconds:
//! ```toml
//! name = "sleep"
//! max_concurrent = 12
//! check_interval = 5000
//! delay = { base = 1000, variance = 500 }
//! pickup_count = { base = 1, variance = 2 }
//! backpressure = { mode = "hold_on_negative", unit = 1000, max = 30000 }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::policies::{BackpressurePolicy, CountSpread, Spread};

/// Settings for one engine.
///
/// ## Field semantics
/// - `name` / `description`: task kind descriptor (also the id category and default title prefix)
/// - `max_concurrent`: live-task ceiling checked at every admission
/// - `max_result_cache` / `max_error_cache`: capacities of the outcome history buffers
/// - `max_health_history`: retention of health scores
/// - `check_interval`: health-check period
/// - `tick_interval`: heartbeat period for the `tick` channel
/// - `delay`: inter-cycle wait of the pickup loop
/// - `pickup_count`: admissions attempted per cycle
/// - `bus_capacity`: event bus ring buffer size (min 1)
/// - `grace`: how long [`Engine::run_until_signal`](crate::Engine::run_until_signal) waits for in-flight tasks
/// - `backpressure`: reaction to health scores
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Task kind name.
    pub name: String,
    /// Task kind description.
    pub description: String,
    /// Maximum number of live tasks.
    pub max_concurrent: usize,
    /// Capacity of the results (`ok` / `fail`) history.
    pub max_result_cache: usize,
    /// Capacity of the errors (`err`) history.
    pub max_error_cache: usize,
    /// Capacity of the health score history.
    pub max_health_history: usize,
    /// Period of the health check.
    #[serde(with = "millis")]
    pub check_interval: Duration,
    /// Period of the `tick` heartbeat.
    #[serde(with = "millis")]
    pub tick_interval: Duration,
    /// Wait between pickup cycles.
    pub delay: Spread,
    /// Admissions attempted per pickup cycle.
    pub pickup_count: CountSpread,
    /// Event bus capacity.
    pub bus_capacity: usize,
    /// Shutdown grace period.
    #[serde(with = "millis")]
    pub grace: Duration,
    /// Reaction to health scores.
    pub backpressure: BackpressurePolicy,
}

impl EngineConfig {
    /// Returns a default config named `name`.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Checks the invariants the engine relies on.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::EmptyName);
        }
        if self.check_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "check_interval",
            });
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::ZeroInterval {
                field: "tick_interval",
            });
        }
        if !self.pickup_count.is_valid() {
            return Err(ConfigError::BadCount {
                base: self.pickup_count.base,
                variance: self.pickup_count.variance,
            });
        }
        if let BackpressurePolicy::HoldOnNegative { unit, .. } = self.backpressure {
            if unit.is_zero() {
                return Err(ConfigError::ZeroHoldUnit);
            }
        }
        Ok(())
    }

    /// Returns a bus capacity clamped to a minimum of 1.
    #[inline]
    pub fn bus_capacity_clamped(&self) -> usize {
        self.bus_capacity.max(1)
    }

    /// Parses a config from TOML; missing fields take their defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&read(path.as_ref())?)
    }

    /// Parses TOML on top of `self`: keys present in `s` win, the rest are kept.
    ///
    /// Nested tables (`delay`, `pickup_count`, `backpressure`) are replaced as a
    /// whole when given.
    pub fn overlay_toml_str(&self, s: &str) -> Result<Self, ConfigError> {
        let table: toml::Table = toml::from_str(s)?;
        let given = |key: &str| table.contains_key(key);
        let parsed: Self = toml::Value::Table(table.clone()).try_into()?;

        macro_rules! pick {
            ($($field:ident),* $(,)?) => {
                Self {
                    $($field: if given(stringify!($field)) {
                        parsed.$field
                    } else {
                        self.$field.clone()
                    },)*
                }
            };
        }
        Ok(pick!(
            name,
            description,
            max_concurrent,
            max_result_cache,
            max_error_cache,
            max_health_history,
            check_interval,
            tick_interval,
            delay,
            pickup_count,
            bus_capacity,
            grace,
            backpressure,
        ))
    }

    /// Reads a TOML file and overlays it on `self`.
    pub fn overlay_file(&self, path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        self.overlay_toml_str(&read(path.as_ref())?)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })
}

impl Default for EngineConfig {
    /// Default configuration:
    ///
    /// - `name = "task"`, `description = ""`
    /// - `max_concurrent = 16`
    /// - `max_result_cache = 100`, `max_error_cache = 200`, `max_health_history = 100`
    /// - `check_interval = 12s`, `tick_interval = 1s`
    /// - `delay = 1s + random[0, 4s)`, `pickup_count = 1`
    /// - `bus_capacity = 1024`, `grace = 30s`
    /// - `backpressure = Observe`
    fn default() -> Self {
        Self {
            name: "task".to_string(),
            description: String::new(),
            max_concurrent: 16,
            max_result_cache: 100,
            max_error_cache: 200,
            max_health_history: 100,
            check_interval: Duration::from_secs(12),
            tick_interval: Duration::from_secs(1),
            delay: Spread::default(),
            pickup_count: CountSpread::default(),
            bus_capacity: 1024,
            grace: Duration::from_secs(30),
            backpressure: BackpressurePolicy::Observe,
        }
    }
}

/// Serde adapter: `Duration` as integer milliseconds.
pub(crate) mod millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer};

    pub fn deserialize<'de, D>(de: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(de).map(Duration::from_millis)
    }
}
