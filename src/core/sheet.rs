//! # Engine bookkeeping.
//!
//! [`Sheet`] groups everything the scheduler mutates when a task is admitted or
//! released: the live registry, both outcome caches, the counters and the health
//! history. It lives behind one lock so that admission and release are atomic
//! with respect to each other and to readers.
//!
//! ## Release order
//! ```text
//! settle(finished):
//!   push to results/errors cache ──► bump ok/fail/err ──► remove from registry
//! (the caller publishes `popup` only after the lock is released)
//! ```

use std::sync::Arc;

use crate::config::EngineConfig;
use crate::core::history::HistoryBuffer;
use crate::core::registry::Registry;
use crate::core::stats::{Stats, StatsSnapshot};
use crate::tasks::{Finished, TaskRecord};

#[derive(Debug)]
pub(crate) struct Sheet {
    pub registry: Registry,
    pub results: HistoryBuffer<Arc<Finished>>,
    pub errors: HistoryBuffer<Arc<Finished>>,
    pub health: HistoryBuffer<f64>,
    pub stats: Stats,
}

impl Sheet {
    pub fn new(cfg: &EngineConfig) -> Self {
        Self {
            registry: Registry::default(),
            results: HistoryBuffer::new(cfg.max_result_cache),
            errors: HistoryBuffer::new(cfg.max_error_cache),
            health: HistoryBuffer::new(cfg.max_health_history),
            stats: Stats::default(),
        }
    }

    /// Registers `record` if fewer than `max` tasks are live.
    pub fn admit(&mut self, record: Arc<TaskRecord>, max: usize) -> bool {
        if self.registry.len() >= max || !self.registry.insert(record) {
            return false;
        }
        self.stats.total += 1;
        true
    }

    /// Caches the outcome, bumps its counter, then releases the task.
    ///
    /// Returns `false` if the task was not live (already released).
    pub fn settle(&mut self, finished: Arc<Finished>) -> bool {
        let id = finished.task.id;
        if !self.registry.contains(id) {
            return false;
        }
        let cache = if finished.outcome.is_err() {
            &mut self.errors
        } else {
            &mut self.results
        };
        cache.push(Arc::clone(&finished));
        self.stats.record(&finished.outcome);
        self.registry.remove(id);
        true
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot(self.registry.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TaskError;
    use crate::tasks::{Outcome, Stage};

    fn finished(record: &TaskRecord, outcome: Outcome) -> Arc<Finished> {
        Arc::new(Finished {
            task: record.snapshot(),
            stage: Stage::Execute,
            outcome,
        })
    }

    #[test]
    fn test_admit_respects_ceiling() {
        let mut sheet = Sheet::new(&EngineConfig::default());
        assert!(sheet.admit(Arc::new(TaskRecord::new(1, "t")), 2));
        assert!(sheet.admit(Arc::new(TaskRecord::new(2, "t")), 2));
        assert!(!sheet.admit(Arc::new(TaskRecord::new(3, "t")), 2));
        assert_eq!(sheet.stats().total, 2);
        assert_eq!(sheet.stats().alive, 2);
    }

    #[test]
    fn test_zero_ceiling_admits_nothing() {
        let mut sheet = Sheet::new(&EngineConfig::default());
        assert!(!sheet.admit(Arc::new(TaskRecord::new(1, "t")), 0));
        assert_eq!(sheet.stats().total, 0);
    }

    #[test]
    fn test_settle_routes_outcomes() {
        let mut sheet = Sheet::new(&EngineConfig::default());
        let records: Vec<_> = (1..=3).map(|id| Arc::new(TaskRecord::new(id, "t"))).collect();
        for r in &records {
            sheet.admit(Arc::clone(r), 16);
        }

        assert!(sheet.settle(finished(&records[0], Outcome::Ok)));
        assert!(sheet.settle(finished(&records[1], Outcome::Fail(TaskError::fail("404")))));
        assert!(sheet.settle(finished(&records[2], Outcome::Err(TaskError::error("boom")))));

        assert_eq!(sheet.results.len(), 2);
        assert_eq!(sheet.errors.len(), 1);
        let s = sheet.stats();
        assert_eq!((s.total, s.ok, s.fail, s.err, s.alive), (3, 1, 1, 1, 0));
    }

    #[test]
    fn test_settle_once() {
        let mut sheet = Sheet::new(&EngineConfig::default());
        let r = Arc::new(TaskRecord::new(1, "t"));
        sheet.admit(Arc::clone(&r), 16);

        assert!(sheet.settle(finished(&r, Outcome::Ok)));
        assert!(!sheet.settle(finished(&r, Outcome::Ok)));
        assert_eq!(sheet.stats().ok, 1);
        assert_eq!(sheet.results.len(), 1);
    }
}
