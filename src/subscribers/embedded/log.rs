//! # LogWriter: structured event logger
//!
//! A minimal subscriber that renders incoming [`Event`]s through `tracing`.
//! Heartbeats go to `trace`, progress to `debug`, everything else to `info`.
//!
//! ## Example output
//! ```text
//! INFO pickvisor: pickup task="sleep 3" seq=12
//! INFO pickvisor: popup task="sleep 3" outcome="ok" used_ms=2411 seq=31
//! INFO pickvisor: check score=1.0 seq=40
//! INFO pickvisor: echo text="hold admission for 2s" seq=41
//! ```

use async_trait::async_trait;

use crate::events::{Event, Payload};
use crate::subscribers::Subscribe;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match &e.payload {
            Payload::Task(t) => {
                tracing::info!(target: "pickvisor", task = %t.title, seq = e.seq, "pickup");
            }
            Payload::Finished(f) => match f.outcome.error() {
                None => tracing::info!(
                    target: "pickvisor",
                    task = %f.task.title,
                    outcome = f.outcome.label(),
                    used_ms = f.task.used.as_millis() as u64,
                    seq = e.seq,
                    "popup"
                ),
                Some(err) => tracing::info!(
                    target: "pickvisor",
                    task = %f.task.title,
                    outcome = f.outcome.label(),
                    stage = ?f.stage,
                    error = %err.as_message(),
                    seq = e.seq,
                    "popup"
                ),
            },
            Payload::Progress {
                task,
                current,
                total,
            } => {
                tracing::debug!(
                    target: "pickvisor",
                    task = %task.title,
                    current,
                    total,
                    "progress"
                );
            }
            Payload::Tick(beat) => {
                tracing::trace!(
                    target: "pickvisor",
                    uptime_s = beat.uptime.as_secs(),
                    total = beat.stats.total,
                    alive = beat.stats.alive,
                    held = beat.held,
                    "tick"
                );
            }
            Payload::Health(score) => {
                tracing::info!(target: "pickvisor", score, seq = e.seq, "check");
            }
            Payload::Echo(text) => {
                tracing::info!(target: "pickvisor", text = %text, seq = e.seq, "echo");
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
