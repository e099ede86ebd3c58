//! # pickvisor
//!
//! **Pickvisor** is an admission-controlled executor for short-lived async tasks.
//!
//! One [`Engine`] runs one [`TaskKind`]: a pickup loop repeatedly asks the kind's
//! factory for new tasks, keeps at most `max_concurrent` of them alive, drives each
//! through its lifecycle, and records every outcome in bounded history buffers.
//! A periodic health check scores the population and may hold admission
//! ([`BackpressurePolicy`]). Everything observable goes out on a typed event bus.
//!
//! ## Architecture
//! ```text
//!                         ┌──────────────────────────────┐
//!                         │ TaskKind (config, create,    │
//!                         │           check, delay)      │
//!                         └──────────────┬───────────────┘
//!                                        ▼
//! ┌───────────────────────────────────────────────────────────────────┐
//! │ Engine                                                            │
//! │  pickup loop ──► admit (live < max) ──► TaskTracker::spawn        │
//! │                                            └─► run_task           │
//! │                                                 initialize        │
//! │                                                 execute           │
//! │                                                 cleanup           │
//! │                                                 settle ──► Sheet  │
//! │  health loop ──► kind.check(snapshots) ──► health history         │
//! │  tick loop   ──► heartbeat                                        │
//! │                                                                   │
//! │  Sheet: Registry (live) · results · errors · stats · health       │
//! └──────┬────────────────────────────────────────────────────────────┘
//!        │ publish: pickup · popup · progress · tick · check · echo
//!        ▼
//!   Bus (broadcast) ──► listener ──► SubscriberSet ──► worker per subscriber
//! ```
//!
//! ### Lifecycle of one task
//! ```text
//! Ready ──initialize ok──► Running ──execute settles──► Ended ──► cleanup ──► popup
//!   └──initialize err──────────────────────────────────► Ended ──────────────► popup
//! ```
//!
//! | outcome | when                                        | counter | history |
//! |---------|---------------------------------------------|---------|---------|
//! | `ok`    | `execute` returned `Ok(())`                 | `ok`    | results |
//! | `fail`  | `execute` returned [`TaskError::Fail`]      | `fail`  | results |
//! | `err`   | any other error, a panic, or init failure   | `err`   | errors  |
//!
//! ## Features
//! | Area            | Description                                              | Key types                                  |
//! |-----------------|----------------------------------------------------------|--------------------------------------------|
//! | **Engine**      | Pickup loop, pause/start, graceful shutdown              | [`Engine`], [`EngineBuilder`]              |
//! | **Tasks**       | Capability traits and closure adapters                   | [`Task`], [`TaskFn`], [`TaskContext`]      |
//! | **Kinds**       | Plugin contract and built-ins                            | [`TaskKind`], [`KindFn`], [`SleepKind`]    |
//! | **Events**      | Typed channels over a broadcast bus                      | [`Event`], [`Channel`], [`Bus`]            |
//! | **Subscribers** | Isolated fan-out to presentation code                    | [`Subscribe`], [`LogWriter`], [`EchoBuffer`] |
//! | **Policies**    | Jittered pacing and health backpressure                  | [`Spread`], [`CountSpread`], [`BackpressurePolicy`] |
//! | **Config**      | Explicit settings, TOML loading                          | [`EngineConfig`]                           |
//! | **Errors**      | Typed task and runtime errors                            | [`TaskError`], [`RuntimeError`]            |
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pickvisor::{Channel, Engine, EngineConfig, KindFn, Spread, TaskContext, TaskError, TaskFn};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), pickvisor::RuntimeError> {
//!     let mut cfg = EngineConfig::named("demo");
//!     cfg.max_concurrent = 4;
//!     cfg.delay = Spread::fixed(Duration::from_millis(10));
//!
//!     let kind = KindFn::arc(cfg, || {
//!         TaskFn::boxed(|ctx: TaskContext| async move {
//!             tokio::time::sleep(Duration::from_millis(20)).await;
//!             ctx.echo(format!("{} done", ctx.title()));
//!             Ok::<_, TaskError>(())
//!         })
//!     });
//!
//!     let engine = Engine::builder(kind).build()?;
//!     engine.subscribe(Channel::Popup, |ev| {
//!         if let Some(done) = ev.finished() {
//!             println!("{} -> {}", done.task.title, done.outcome.label());
//!         }
//!     });
//!
//!     engine.start();
//!     tokio::time::sleep(Duration::from_millis(100)).await;
//!     engine.shutdown(Duration::from_secs(1)).await?;
//!
//!     assert!(engine.stats().ok > 0);
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod kinds;
pub mod logging;
mod policies;
mod subscribers;
mod tasks;

// ---- Public re-exports ----

pub use config::EngineConfig;
pub use crate::core::{Engine, EngineBuilder, HistoryBuffer, StatsSnapshot};
pub use error::{ConfigError, RuntimeError, TaskError};
pub use events::{Bus, Channel, Event, Heartbeat, Payload};
pub use kinds::SleepKind;
pub use policies::{BackpressurePolicy, CountSpread, Spread};
pub use subscribers::{EchoBuffer, FnSubscriber, LogWriter, Subscribe, SubscriberSet};
pub use tasks::{
    BoxTask, Cleanup, Execute, Finished, HealthInput, IdSequence, Initialize, KindFn, KindRef,
    Outcome, Stage, Task, TaskContext, TaskFn, TaskKind, TaskRecord, TaskSnapshot, TaskState,
};
