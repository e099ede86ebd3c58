//! # Task kinds: the plugin contract.
//!
//! A [`TaskKind`] is everything the engine needs to know about one type of task:
//!
//! - [`config`](TaskKind::config) static descriptor and default engine settings;
//! - [`create`](TaskKind::create) factory producing a fresh task per admission;
//! - [`check`](TaskKind::check) optional health check (default: always healthy);
//! - [`delay`](TaskKind::delay) optional override of the inter-cycle wait.
//!
//! The engine never interprets task bodies; the health score is the only
//! channel through which a kind influences admission (see
//! [`BackpressurePolicy`](crate::BackpressurePolicy)).

use std::sync::Arc;

use async_trait::async_trait;

use crate::config::EngineConfig;
use crate::policies::Spread;
use crate::tasks::{BoxTask, Finished, TaskSnapshot};

/// Shared handle to a task kind.
pub type KindRef = Arc<dyn TaskKind>;

/// Snapshots handed to a health check.
///
/// All slices are copies taken at check time, oldest first.
#[derive(Clone, Copy, Debug)]
pub struct HealthInput<'a> {
    /// Live tasks (admitted, not yet released).
    pub alive: &'a [TaskSnapshot],
    /// Recent `ok` / `fail` outcomes.
    pub results: &'a [Arc<Finished>],
    /// Recent `err` outcomes.
    pub errors: &'a [Arc<Finished>],
    /// Previous health scores.
    pub history: &'a [f64],
}

/// Plugin contract for one type of task.
#[async_trait]
pub trait TaskKind: Send + Sync + 'static {
    /// Descriptor and default settings.
    fn config(&self) -> EngineConfig;

    /// Builds a new, `Ready` task.
    fn create(&self) -> BoxTask;

    /// Scores engine health: `1` healthy, `0` unhealthy, negative severe.
    fn check(&self, _input: &HealthInput<'_>) -> f64 {
        1.0
    }

    /// Waits between pickup cycles.
    async fn delay(&self, spread: &Spread) {
        tokio::time::sleep(spread.sample()).await;
    }
}
