//! # Engine events.
//!
//! Every [`Event`] belongs to exactly one [`Channel`], derived from its [`Payload`]:
//!
//! | channel    | payload                    | published when                              |
//! |------------|----------------------------|---------------------------------------------|
//! | `Pickup`   | [`Payload::Task`]          | a task was admitted                         |
//! | `Popup`    | [`Payload::Finished`]      | a task ended and was released               |
//! | `Progress` | [`Payload::Progress`]      | a task reported incremental progress        |
//! | `Tick`     | [`Payload::Tick`]          | heartbeat timer fired                       |
//! | `Check`    | [`Payload::Health`]        | a health check produced a score             |
//! | `Echo`     | [`Payload::Echo`]          | free-form diagnostic text                   |
//!
//! ## Ordering
//! `seq` comes from one process-wide counter, so sorting by it recovers publish order.
//!
//! ## Example
//! ```rust
//! use pickvisor::{Channel, Event};
//!
//! let ev = Event::check(-2.0);
//! assert_eq!(ev.channel(), Channel::Check);
//! assert_eq!(ev.score(), Some(-2.0));
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::time::{Duration, SystemTime};

use crate::core::StatsSnapshot;
use crate::tasks::{Finished, TaskSnapshot};

/// Source of `Event::seq`.
static EVENT_SEQ: AtomicU64 = AtomicU64::new(0);

/// Named event channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    /// Task admitted.
    Pickup,
    /// Task ended and removed from the live registry.
    Popup,
    /// Task-specific incremental progress.
    Progress,
    /// Periodic heartbeat.
    Tick,
    /// Health check result.
    Check,
    /// Free-form diagnostic string.
    Echo,
}

impl Channel {
    /// All channels, in declaration order.
    pub const ALL: [Channel; 6] = [
        Channel::Pickup,
        Channel::Popup,
        Channel::Progress,
        Channel::Tick,
        Channel::Check,
        Channel::Echo,
    ];

    /// Lowercase channel name.
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::Pickup => "pickup",
            Channel::Popup => "popup",
            Channel::Progress => "progress",
            Channel::Tick => "tick",
            Channel::Check => "check",
            Channel::Echo => "echo",
        }
    }
}

/// Heartbeat carried by the `tick` channel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Heartbeat {
    /// Time since the engine was built.
    pub uptime: Duration,
    /// Counters and live gauge.
    pub stats: StatsSnapshot,
    /// Whether the pickup loop is running.
    pub running: bool,
    /// Whether admission is currently held by backpressure.
    pub held: bool,
}

/// Event payload; determines the channel.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Snapshot of the admitted task.
    Task(TaskSnapshot),
    /// Settled task as stored in history.
    Finished(Arc<Finished>),
    /// Progress report.
    Progress {
        /// Task snapshot at report time.
        task: TaskSnapshot,
        /// Steps done.
        current: u64,
        /// Steps overall.
        total: u64,
    },
    /// Heartbeat.
    Tick(Heartbeat),
    /// Health score.
    Health(f64),
    /// Diagnostic text.
    Echo(Arc<str>),
}

/// Engine event.
#[derive(Debug, Clone)]
pub struct Event {
    /// Publish order across the whole process.
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Channel-specific payload.
    pub payload: Payload,
}

impl Event {
    /// Creates an event with the current timestamp and the next sequence number.
    pub fn new(payload: Payload) -> Self {
        Self {
            seq: EVENT_SEQ.fetch_add(1, AtomicOrdering::Relaxed),
            at: SystemTime::now(),
            payload,
        }
    }

    /// `pickup` event.
    #[inline]
    pub fn pickup(task: TaskSnapshot) -> Self {
        Self::new(Payload::Task(task))
    }

    /// `popup` event.
    #[inline]
    pub fn popup(finished: Arc<Finished>) -> Self {
        Self::new(Payload::Finished(finished))
    }

    /// `progress` event.
    #[inline]
    pub fn progress(task: TaskSnapshot, current: u64, total: u64) -> Self {
        Self::new(Payload::Progress {
            task,
            current,
            total,
        })
    }

    /// `tick` event.
    #[inline]
    pub fn tick(beat: Heartbeat) -> Self {
        Self::new(Payload::Tick(beat))
    }

    /// `check` event.
    #[inline]
    pub fn check(score: f64) -> Self {
        Self::new(Payload::Health(score))
    }

    /// `echo` event.
    #[inline]
    pub fn echo(text: impl Into<Arc<str>>) -> Self {
        Self::new(Payload::Echo(text.into()))
    }

    /// Channel this event belongs to.
    pub fn channel(&self) -> Channel {
        match self.payload {
            Payload::Task(_) => Channel::Pickup,
            Payload::Finished(_) => Channel::Popup,
            Payload::Progress { .. } => Channel::Progress,
            Payload::Tick(_) => Channel::Tick,
            Payload::Health(_) => Channel::Check,
            Payload::Echo(_) => Channel::Echo,
        }
    }

    /// Task snapshot carried by `pickup`, `popup` and `progress` events.
    pub fn task(&self) -> Option<&TaskSnapshot> {
        match &self.payload {
            Payload::Task(t) | Payload::Progress { task: t, .. } => Some(t),
            Payload::Finished(f) => Some(&f.task),
            _ => None,
        }
    }

    /// Settled task carried by a `popup` event.
    pub fn finished(&self) -> Option<&Arc<Finished>> {
        match &self.payload {
            Payload::Finished(f) => Some(f),
            _ => None,
        }
    }

    /// Score carried by a `check` event.
    pub fn score(&self) -> Option<f64> {
        match self.payload {
            Payload::Health(s) => Some(s),
            _ => None,
        }
    }

    /// Text carried by an `echo` event.
    pub fn text(&self) -> Option<&str> {
        match &self.payload {
            Payload::Echo(t) => Some(t),
            _ => None,
        }
    }
}
