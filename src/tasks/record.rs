//! # Task record: engine-owned lifecycle metadata.
//!
//! Every admitted task gets one [`TaskRecord`]. The record is shared (via `Arc`)
//! between the live registry, the task's [`TaskContext`](crate::TaskContext),
//! and the runner; the task body itself stays exclusively owned by the runner.
//!
//! ## State machine
//! ```text
//! Ready ──► Running ──► Ended
//!   └──────────────────►┘   (initialize failed: the task never ran)
//! ```
//! Transitions never go backwards; anything else is a [`RuntimeError::InvalidTransition`].
//!
//! ## Ids
//! Ids are `1, 2, 3, …` per task-kind name, process-wide ([`IdSequence`]).

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tokio::time::Instant;

use crate::error::RuntimeError;

/// Lifecycle state of a task.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TaskState {
    /// Admitted, not yet executing (initializing).
    Ready,
    /// `execute` in progress.
    Running,
    /// Settled; the outcome is classified.
    Ended,
}

impl TaskState {
    /// Whether `self → to` is a legal transition.
    pub fn can_advance(self, to: TaskState) -> bool {
        matches!(
            (self, to),
            (TaskState::Ready, TaskState::Running)
                | (TaskState::Running, TaskState::Ended)
                | (TaskState::Ready, TaskState::Ended)
        )
    }

    /// Lowercase name for display.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskState::Ready => "ready",
            TaskState::Running => "running",
            TaskState::Ended => "ended",
        }
    }
}

#[derive(Debug)]
struct Stamp {
    mono: Instant,
    wall: SystemTime,
}

impl Stamp {
    fn now() -> Self {
        Self {
            mono: Instant::now(),
            wall: SystemTime::now(),
        }
    }
}

#[derive(Debug)]
struct Inner {
    title: String,
    note: String,
    state: TaskState,
    started: Option<Stamp>,
    ended: Option<Stamp>,
}

/// Shared metadata of one task.
#[derive(Debug)]
pub struct TaskRecord {
    id: u64,
    kind: Arc<str>,
    inner: Mutex<Inner>,
}

impl TaskRecord {
    /// Creates a `Ready` record titled `"<kind> <id>"`.
    pub fn new(id: u64, kind: impl Into<Arc<str>>) -> Self {
        let kind = kind.into();
        Self {
            id,
            inner: Mutex::new(Inner {
                title: format!("{kind} {id}"),
                note: "-".to_string(),
                state: TaskState::Ready,
                started: None,
                ended: None,
            }),
            kind,
        }
    }

    /// Per-kind task id.
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Task kind name.
    pub fn kind(&self) -> &Arc<str> {
        &self.kind
    }

    /// Current title.
    pub fn title(&self) -> String {
        self.inner.lock().title.clone()
    }

    /// Current state.
    pub fn state(&self) -> TaskState {
        self.inner.lock().state
    }

    pub(crate) fn set_title(&self, title: String) {
        self.inner.lock().title = title;
    }

    pub(crate) fn set_note(&self, note: String) {
        self.inner.lock().note = note;
    }

    /// Moves the record to `to`, stamping start/end times.
    ///
    /// `Running` stamps the start; `Ended` stamps the end (the end of a task
    /// that never ran has no start).
    pub(crate) fn advance(&self, to: TaskState) -> Result<(), RuntimeError> {
        let mut g = self.inner.lock();
        if !g.state.can_advance(to) {
            return Err(RuntimeError::InvalidTransition {
                task: g.title.clone(),
                from: g.state,
                to,
            });
        }
        match to {
            TaskState::Running => g.started = Some(Stamp::now()),
            TaskState::Ended => g.ended = Some(Stamp::now()),
            TaskState::Ready => {}
        }
        g.state = to;
        Ok(())
    }

    /// Time spent executing: `end - start` once ended, `now - start` while running.
    pub fn used_time(&self) -> Duration {
        Self::used(&self.inner.lock())
    }

    fn used(g: &Inner) -> Duration {
        match (&g.started, &g.ended) {
            (Some(s), Some(e)) => e.mono.saturating_duration_since(s.mono),
            (Some(s), None) => s.mono.elapsed(),
            (None, _) => Duration::ZERO,
        }
    }

    /// Copies the current metadata.
    pub fn snapshot(&self) -> TaskSnapshot {
        let g = self.inner.lock();
        TaskSnapshot {
            id: self.id,
            kind: Arc::clone(&self.kind),
            title: g.title.clone(),
            note: g.note.clone(),
            state: g.state,
            started_at: g.started.as_ref().map(|s| s.wall),
            ended_at: g.ended.as_ref().map(|s| s.wall),
            used: Self::used(&g),
        }
    }
}

/// Point-in-time copy of a [`TaskRecord`].
#[derive(Clone, Debug, PartialEq)]
pub struct TaskSnapshot {
    /// Per-kind task id.
    pub id: u64,
    /// Task kind name.
    pub kind: Arc<str>,
    /// Title at snapshot time.
    pub title: String,
    /// Free-form note at snapshot time.
    pub note: String,
    /// State at snapshot time.
    pub state: TaskState,
    /// Wall-clock start of `execute`.
    pub started_at: Option<SystemTime>,
    /// Wall-clock settle time.
    pub ended_at: Option<SystemTime>,
    /// Execution time at snapshot time.
    pub used: Duration,
}

/// Monotonic id generator keyed by category.
///
/// # Example
/// ```
/// use pickvisor::IdSequence;
///
/// let ids = IdSequence::new();
/// assert_eq!(ids.next("a"), 1);
/// assert_eq!(ids.next("a"), 2);
/// assert_eq!(ids.next("b"), 1);
/// ```
#[derive(Debug, Default)]
pub struct IdSequence {
    counters: Mutex<HashMap<String, u64>>,
}

impl IdSequence {
    /// Creates an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next id in `category`, starting at 1.
    pub fn next(&self, category: &str) -> u64 {
        let mut g = self.counters.lock();
        let n = g.entry(category.to_string()).or_insert(0);
        *n += 1;
        *n
    }
}

static TASK_IDS: LazyLock<IdSequence> = LazyLock::new(IdSequence::new);

/// Process-wide task id for `kind`.
pub(crate) fn next_task_id(kind: &str) -> u64 {
    TASK_IDS.next(kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_title_and_state() {
        let r = TaskRecord::new(7, "sleep");
        assert_eq!(r.title(), "sleep 7");
        assert_eq!(r.state(), TaskState::Ready);
        assert_eq!(r.used_time(), Duration::ZERO);
    }

    #[test]
    fn test_forward_transitions_stamp_times() {
        let r = TaskRecord::new(1, "t");
        r.advance(TaskState::Running).unwrap();
        assert!(r.snapshot().started_at.is_some());
        r.advance(TaskState::Ended).unwrap();

        let snap = r.snapshot();
        assert_eq!(snap.state, TaskState::Ended);
        assert!(snap.ended_at.unwrap() >= snap.started_at.unwrap());
        // frozen once ended
        assert_eq!(r.used_time(), snap.used);
    }

    #[tokio::test(start_paused = true)]
    async fn test_used_time_follows_runtime_clock() {
        let r = TaskRecord::new(1, "t");
        r.advance(TaskState::Running).unwrap();
        tokio::time::advance(Duration::from_millis(100)).await;
        assert_eq!(r.used_time(), Duration::from_millis(100));

        tokio::time::advance(Duration::from_millis(50)).await;
        r.advance(TaskState::Ended).unwrap();
        tokio::time::advance(Duration::from_secs(1)).await;
        assert_eq!(r.snapshot().used, Duration::from_millis(150));
    }

    #[test]
    fn test_aborted_task_ends_without_start() {
        let r = TaskRecord::new(1, "t");
        r.advance(TaskState::Ended).unwrap();
        let snap = r.snapshot();
        assert!(snap.started_at.is_none());
        assert!(snap.ended_at.is_some());
        assert_eq!(snap.used, Duration::ZERO);
    }

    #[test]
    fn test_state_never_regresses() {
        let r = TaskRecord::new(1, "t");
        r.advance(TaskState::Running).unwrap();
        r.advance(TaskState::Ended).unwrap();

        let err = r.advance(TaskState::Running).unwrap_err();
        assert!(matches!(
            err,
            RuntimeError::InvalidTransition {
                from: TaskState::Ended,
                to: TaskState::Running,
                ..
            }
        ));
        assert!(r.advance(TaskState::Ended).is_err());
        assert!(r.advance(TaskState::Ready).is_err());
    }

    #[test]
    fn test_ids_are_per_category() {
        let ids = IdSequence::new();
        assert_eq!(ids.next("x"), 1);
        assert_eq!(ids.next("y"), 1);
        assert_eq!(ids.next("x"), 2);
        assert_eq!(ids.next("x"), 3);
    }
}
