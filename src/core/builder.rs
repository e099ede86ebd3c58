//! # Engine builder.
//!
//! Collects the task kind, an optional explicit config and the initial
//! subscribers, validates the config once, and wires the runtime pieces.

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::engine::Engine;
use crate::error::RuntimeError;
use crate::subscribers::Subscribe;
use crate::tasks::KindRef;

/// Builder for an [`Engine`].
///
/// ```rust
/// use pickvisor::{Engine, EngineConfig, KindFn, TaskContext, TaskError, TaskFn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> Result<(), pickvisor::RuntimeError> {
/// let kind = KindFn::arc(EngineConfig::named("noop"), || {
///     TaskFn::boxed(|_ctx: TaskContext| async { Ok::<_, TaskError>(()) })
/// });
/// let engine = Engine::builder(kind).build()?;
/// assert!(!engine.is_running());
/// # Ok(())
/// # }
/// ```
pub struct EngineBuilder {
    kind: KindRef,
    cfg: Option<EngineConfig>,
    subscribers: Vec<Arc<dyn Subscribe>>,
}

impl EngineBuilder {
    /// Creates a builder for `kind`, using the kind's own config by default.
    pub fn new(kind: KindRef) -> Self {
        Self {
            kind,
            cfg: None,
            subscribers: Vec::new(),
        }
    }

    /// Replaces the kind's config wholesale.
    pub fn with_config(mut self, cfg: EngineConfig) -> Self {
        self.cfg = Some(cfg);
        self
    }

    /// Sets the initial event subscribers.
    pub fn with_subscribers(mut self, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        self.subscribers = subscribers;
        self
    }

    /// Appends one subscriber.
    pub fn with_subscriber(mut self, subscriber: Arc<dyn Subscribe>) -> Self {
        self.subscribers.push(subscriber);
        self
    }

    /// Validates the config and builds the engine (not yet started).
    ///
    /// Spawns the subscriber workers and the bus listener, so it must be called
    /// from within a tokio runtime.
    pub fn build(self) -> Result<Arc<Engine>, RuntimeError> {
        let cfg = match self.cfg {
            Some(cfg) => cfg,
            None => self.kind.config(),
        };
        cfg.validate()?;
        Ok(Engine::new_internal(self.kind, cfg, self.subscribers))
    }
}
