//! # Live task registry.
//!
//! The [`Registry`] holds every admitted task that has not been released yet.
//! It is the input of admission control (`len() < max_concurrent`) and of the
//! health check (`alive` snapshots).
//!
//! ## Rules
//! - Membership starts at admission (state `Ready`) and ends at release,
//!   after the outcome has been recorded.
//! - An id is never inserted twice; a removal succeeds at most once.
//! - Iteration order is admission order (ids grow per kind).

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::tasks::{TaskRecord, TaskSnapshot};

/// Set of live tasks keyed by id.
#[derive(Debug, Default)]
pub(crate) struct Registry {
    tasks: BTreeMap<u64, Arc<TaskRecord>>,
}

impl Registry {
    /// Adds `record`; returns `false` if its id is already a member.
    pub fn insert(&mut self, record: Arc<TaskRecord>) -> bool {
        let id = record.id();
        if self.contains(id) {
            return false;
        }
        self.tasks.insert(id, record);
        true
    }

    pub fn contains(&self, id: u64) -> bool {
        self.tasks.contains_key(&id)
    }

    /// Removes the task with `id`, returning it if it was a member.
    pub fn remove(&mut self, id: u64) -> Option<Arc<TaskRecord>> {
        self.tasks.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn snapshots(&self) -> Vec<TaskSnapshot> {
        self.tasks.values().map(|r| r.snapshot()).collect()
    }

    pub fn titles(&self) -> Vec<String> {
        self.tasks.values().map(|r| r.title()).collect()
    }
}
