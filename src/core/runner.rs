//! # Drive one task through its lifecycle.
//!
//! [`run_task`] is what the pickup loop spawns for every admitted task. It is the
//! task's error boundary: nothing a task does (error, panic) escapes it.
//!
//! ## Flow
//! ```text
//! initialize ──Err/panic──► Ended ─────────────────────────────► settle(err, Initialize)
//!     │ Ok
//!     ▼
//! Running ──► execute ──► Ended ──► cleanup (failure logged only) ──► settle(classify)
//!
//! settle: push cache + bump counter + leave registry ──► publish popup
//! ```
//!
//! ## Rules
//! - Exactly **one** outcome is recorded and exactly **one** `popup` is published per task.
//! - `cleanup` runs exactly once after `execute` settles; never after a failed `initialize`.
//! - The task body is owned by this function, so it cannot be executed twice.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use parking_lot::Mutex;

use crate::core::sheet::Sheet;
use crate::error::TaskError;
use crate::events::{Bus, Event};
use crate::tasks::{BoxTask, Finished, Outcome, Stage, TaskContext, TaskRecord, TaskState};

/// Runs `task` to completion and releases it.
pub(crate) async fn run_task(
    mut task: BoxTask,
    record: Arc<TaskRecord>,
    bus: Bus,
    sheet: Arc<Mutex<Sheet>>,
) {
    let ctx = TaskContext::new(Arc::clone(&record), bus.clone());
    let (stage, outcome) = drive(&mut task, &record, &ctx).await;
    drop(task);

    let finished = Arc::new(Finished {
        task: record.snapshot(),
        stage,
        outcome,
    });
    tracing::debug!(
        task = %finished.task.title,
        outcome = finished.outcome.label(),
        stage = ?finished.stage,
        used_ms = finished.task.used.as_millis() as u64,
        "task settled"
    );

    let released = sheet.lock().settle(Arc::clone(&finished));
    if released {
        bus.publish(Event::popup(finished));
    } else {
        tracing::error!(task = %finished.task.title, "task settled but was not live");
    }
}

/// Runs the three capabilities and classifies the result.
async fn drive(task: &mut BoxTask, record: &TaskRecord, ctx: &TaskContext) -> (Stage, Outcome) {
    let init = AssertUnwindSafe(task.initialize(ctx)).catch_unwind().await;
    if let Err(e) = flatten(init) {
        advance(record, TaskState::Ended);
        return (Stage::Initialize, Outcome::Err(e));
    }

    advance(record, TaskState::Running);
    let res = flatten(AssertUnwindSafe(task.execute(ctx)).catch_unwind().await);
    advance(record, TaskState::Ended);

    if let Err(e) = flatten(AssertUnwindSafe(task.cleanup(ctx)).catch_unwind().await) {
        tracing::warn!(
            task = %record.title(),
            label = e.as_label(),
            error = %e.as_message(),
            "cleanup failed"
        );
    }

    (Stage::Execute, Outcome::classify(res))
}

/// Folds a caught panic into [`TaskError::Panicked`].
fn flatten(
    res: Result<Result<(), TaskError>, Box<dyn std::any::Any + Send>>,
) -> Result<(), TaskError> {
    res.unwrap_or_else(|panic| Err(TaskError::from_panic(panic)))
}

fn advance(record: &TaskRecord, to: TaskState) {
    if let Err(e) = record.advance(to) {
        tracing::error!(label = e.as_label(), error = %e.as_message(), "lifecycle violation");
    }
}
