//! # Closure-backed task kind (`KindFn`)
//!
//! [`KindFn`] assembles a [`TaskKind`] from a config and a factory closure,
//! with an optional health-check closure. The default inter-cycle delay is used.
//!
//! ## Example
//! ```rust
//! use pickvisor::{EngineConfig, KindFn, KindRef, TaskContext, TaskError, TaskFn};
//!
//! let kind: KindRef = KindFn::arc(EngineConfig::named("noop"), || {
//!     TaskFn::boxed(|_ctx: TaskContext| async { Ok::<_, TaskError>(()) })
//! });
//! assert_eq!(kind.config().name, "noop");
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::tasks::{BoxTask, HealthInput, TaskKind};

type CheckFn = Box<dyn Fn(&HealthInput<'_>) -> f64 + Send + Sync>;

/// Closure-backed task kind.
pub struct KindFn<F> {
    config: EngineConfig,
    factory: F,
    check: Option<CheckFn>,
}

impl<F> KindFn<F>
where
    F: Fn() -> BoxTask + Send + Sync + 'static,
{
    /// Creates a kind from a config and a factory.
    pub fn new(config: EngineConfig, factory: F) -> Self {
        Self {
            config,
            factory,
            check: None,
        }
    }

    /// Creates the kind and returns it as a shared handle.
    pub fn arc(config: EngineConfig, factory: F) -> Arc<Self> {
        Arc::new(Self::new(config, factory))
    }

    /// Installs a health check.
    pub fn with_check(
        mut self,
        check: impl Fn(&HealthInput<'_>) -> f64 + Send + Sync + 'static,
    ) -> Self {
        self.check = Some(Box::new(check));
        self
    }
}

impl<F> TaskKind for KindFn<F>
where
    F: Fn() -> BoxTask + Send + Sync + 'static,
{
    fn config(&self) -> EngineConfig {
        self.config.clone()
    }

    fn create(&self) -> BoxTask {
        (self.factory)()
    }

    fn check(&self, input: &HealthInput<'_>) -> f64 {
        match &self.check {
            Some(f) => f(input),
            None => 1.0,
        }
    }
}
