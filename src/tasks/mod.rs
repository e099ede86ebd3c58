//! # Task abstractions and task kinds.
//!
//! This module provides the task-related types:
//! - [`Initialize`], [`Execute`], [`Cleanup`] - capability traits of one unit of work
//! - [`Task`] - anything implementing all three (blanket impl)
//! - [`TaskFn`] - closure-backed task implementation
//! - [`TaskContext`] - handle a running task uses to retitle itself and publish progress/echo
//! - [`TaskRecord`] / [`TaskSnapshot`] / [`TaskState`] - engine-owned lifecycle metadata
//! - [`Outcome`] / [`Finished`] - classification of a settled task, as stored in history
//! - [`TaskKind`] / [`KindFn`] - plugin contract: config descriptor, factory, health check, delay

mod context;
mod kind;
mod kind_fn;
mod outcome;
mod record;
mod task;
mod task_fn;

pub use context::TaskContext;
pub use kind::{HealthInput, KindRef, TaskKind};
pub use kind_fn::KindFn;
pub use outcome::{Finished, Outcome, Stage};
pub use record::{IdSequence, TaskRecord, TaskSnapshot, TaskState};
pub(crate) use record::next_task_id;
pub use task::{BoxTask, Cleanup, Execute, Initialize, Task};
pub use task_fn::TaskFn;
