//! Outcome counters.

use crate::tasks::Outcome;

/// Monotonic counters, each updated exactly once per admitted or settled task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct Stats {
    pub total: u64,
    pub ok: u64,
    pub fail: u64,
    pub err: u64,
}

impl Stats {
    pub fn record(&mut self, outcome: &Outcome) {
        match outcome {
            Outcome::Ok => self.ok += 1,
            Outcome::Fail(_) => self.fail += 1,
            Outcome::Err(_) => self.err += 1,
        }
    }

    pub fn snapshot(&self, alive: usize) -> StatsSnapshot {
        StatsSnapshot {
            total: self.total,
            ok: self.ok,
            fail: self.fail,
            err: self.err,
            alive,
        }
    }
}

/// Point-in-time copy of the engine counters.
///
/// `total - (ok + fail + err)` tasks are still alive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Tasks admitted.
    pub total: u64,
    /// Tasks that completed normally.
    pub ok: u64,
    /// Tasks that reported a soft failure.
    pub fail: u64,
    /// Tasks that errored, panicked or failed to initialize.
    pub err: u64,
    /// Tasks currently live.
    pub alive: usize,
}

impl StatsSnapshot {
    /// Tasks whose outcome has been recorded.
    pub fn settled(&self) -> u64 {
        self.ok + self.fail + self.err
    }

    /// Share of settled tasks that completed normally; `1.0` before any settle.
    pub fn success_rate(&self) -> f64 {
        match self.settled() {
            0 => 1.0,
            n => self.ok as f64 / n as f64,
        }
    }
}
