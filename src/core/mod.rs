//! Engine core: admission, lifecycle and bookkeeping.
//!
//! The public API of this module is [`Engine`] (built through [`EngineBuilder`]),
//! the [`HistoryBuffer`] it keeps outcomes in, and [`StatsSnapshot`].
//!
//! Internal modules:
//! - [`engine`]: pickup loop, heartbeat, pause/start, graceful shutdown;
//! - [`health`]: periodic health check and backpressure;
//! - [`runner`]: one task's lifecycle and error boundary;
//! - [`sheet`]: registry, caches, counters and health history behind one lock;
//! - [`registry`]: the live set;
//! - [`shutdown`]: termination signal handling.

mod builder;
mod engine;
mod health;
mod history;
mod registry;
mod runner;
mod sheet;
mod shutdown;
mod stats;

pub use builder::EngineBuilder;
pub use engine::Engine;
pub use history::HistoryBuffer;
pub use stats::StatsSnapshot;
