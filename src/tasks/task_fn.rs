//! # Closure-backed task (`TaskFn`)
//!
//! [`TaskFn`] wraps a closure `F: FnMut(TaskContext) -> Fut` as the `execute`
//! body; `initialize` and `cleanup` are no-ops. The closure gets an owned clone
//! of the [`TaskContext`], so the returned future can be `'static`.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use pickvisor::{BoxTask, TaskContext, TaskError, TaskFn};
//!
//! let t: BoxTask = TaskFn::boxed(|ctx: TaskContext| async move {
//!     tokio::time::sleep(Duration::from_millis(10)).await;
//!     ctx.echo("done");
//!     Ok::<_, TaskError>(())
//! });
//! # drop(t);
//! ```

use std::future::Future;

use async_trait::async_trait;

use crate::error::TaskError;
use crate::tasks::task::{BoxTask, Cleanup, Execute, Initialize};
use crate::tasks::TaskContext;

/// Closure-backed task implementation.
pub struct TaskFn<F> {
    f: F,
}

impl<F, Fut> TaskFn<F>
where
    F: FnMut(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Creates a new closure-backed task.
    pub fn new(f: F) -> Self {
        Self { f }
    }

    /// Creates the task and returns it type-erased, ready for a factory.
    pub fn boxed(f: F) -> BoxTask {
        Box::new(Self::new(f))
    }
}

impl<F: Send> Initialize for TaskFn<F> {}

impl<F: Send> Cleanup for TaskFn<F> {}

#[async_trait]
impl<F, Fut> Execute for TaskFn<F>
where
    F: FnMut(TaskContext) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    async fn execute(&mut self, ctx: &TaskContext) -> Result<(), TaskError> {
        (self.f)(ctx.clone()).await
    }
}
