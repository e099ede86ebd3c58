//! # Task capabilities.
//!
//! A task is composed from three capabilities, each a small async trait:
//!
//! ```text
//! Initialize::initialize()  prepare props; failure = admission failure (never runs)
//!        │
//! Execute::execute()        the body; Ok → "ok", Err(Fail) → "fail", Err(..)/panic → "err"
//!        │
//! Cleanup::cleanup()        exactly once after execute settles; failures are logged only
//! ```
//!
//! `Initialize` and `Cleanup` have no-op defaults, so a minimal task is
//! `impl Initialize for T {}`, `impl Cleanup for T {}` plus an `Execute` impl.
//! Anything implementing all three is a [`Task`] through a blanket impl.
//!
//! # Example
//! ```
//! use async_trait::async_trait;
//! use pickvisor::{Cleanup, Execute, Initialize, TaskContext, TaskError};
//!
//! struct Probe { url: String }
//!
//! impl Initialize for Probe {}
//! impl Cleanup for Probe {}
//!
//! #[async_trait]
//! impl Execute for Probe {
//!     async fn execute(&mut self, ctx: &TaskContext) -> Result<(), TaskError> {
//!         ctx.set_title(format!("fetch {}", self.url));
//!         Ok(())
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::TaskContext;

/// Owned, type-erased task as produced by a [`TaskKind`](crate::TaskKind) factory.
pub type BoxTask = Box<dyn Task>;

/// Prepares a task before it runs.
#[async_trait]
pub trait Initialize: Send {
    /// Generates the task's parameters.
    ///
    /// An error here is an **admission failure**: the task never reaches
    /// `running`, is counted as `err`, and `cleanup` is not called.
    async fn initialize(&mut self, _ctx: &TaskContext) -> Result<(), TaskError> {
        Ok(())
    }
}

/// The task-type-specific body.
#[async_trait]
pub trait Execute: Send {
    /// Runs the body once.
    ///
    /// Returning [`TaskError::Fail`] records a soft `fail`; any other error
    /// (or a panic) records `err`. Neither affects the engine.
    async fn execute(&mut self, ctx: &TaskContext) -> Result<(), TaskError>;
}

/// Finalization hook.
#[async_trait]
pub trait Cleanup: Send {
    /// Called exactly once after `execute` settles, before the task is released.
    ///
    /// Errors and panics are logged and otherwise ignored.
    async fn cleanup(&mut self, _ctx: &TaskContext) -> Result<(), TaskError> {
        Ok(())
    }
}

/// A complete unit of work.
pub trait Task: Initialize + Execute + Cleanup + 'static {}

impl<T> Task for T where T: Initialize + Execute + Cleanup + 'static {}
