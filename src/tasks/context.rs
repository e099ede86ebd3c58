//! # Task context.
//!
//! [`TaskContext`] is what a running task sees of the engine: its own record
//! (id, title, note, timing) and a publish-only view of the event bus for
//! `progress` and `echo` notifications. It is cheap to clone.

use std::sync::Arc;
use std::time::Duration;

use crate::events::{Bus, Event};
use crate::tasks::{TaskRecord, TaskSnapshot};

/// Handle passed to every task capability.
#[derive(Clone, Debug)]
pub struct TaskContext {
    record: Arc<TaskRecord>,
    bus: Bus,
}

impl TaskContext {
    pub(crate) fn new(record: Arc<TaskRecord>, bus: Bus) -> Self {
        Self { record, bus }
    }

    /// Context not attached to any engine.
    ///
    /// Useful for driving a task by hand; events go to `bus`.
    pub fn standalone(id: u64, kind: &str, bus: Bus) -> Self {
        Self::new(Arc::new(TaskRecord::new(id, kind)), bus)
    }

    /// Per-kind task id.
    pub fn id(&self) -> u64 {
        self.record.id()
    }

    /// Current title.
    pub fn title(&self) -> String {
        self.record.title()
    }

    /// Replaces the title shown for this task.
    pub fn set_title(&self, title: impl Into<String>) {
        self.record.set_title(title.into());
    }

    /// Replaces the free-form note.
    pub fn set_note(&self, note: impl Into<String>) {
        self.record.set_note(note.into());
    }

    /// Time spent executing so far.
    pub fn used_time(&self) -> Duration {
        self.record.used_time()
    }

    /// Copies the task's current metadata.
    pub fn snapshot(&self) -> TaskSnapshot {
        self.record.snapshot()
    }

    /// Publishes a `progress` event (`current` of `total` steps).
    pub fn progress(&self, current: u64, total: u64) {
        self.bus
            .publish(Event::progress(self.record.snapshot(), current, total));
    }

    /// Publishes a free-form `echo` line.
    pub fn echo(&self, text: impl Into<Arc<str>>) {
        self.bus.publish(Event::echo(text));
    }
}
