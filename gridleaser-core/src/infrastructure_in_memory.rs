use std::collections::{BTreeMap, HashMap};

use crate::infrastructure::{StoreError, TaskStore};
use crate::types::{Lease, TaskId};

/// Volatile lease table. Leases do not survive a restart.
pub struct InMemoryTaskStore {
    // Map of task id -> lease row
    rows: BTreeMap<TaskId, Lease>,
    next_id: TaskId,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// Direct row access, mainly for tests and stats rendering.
    pub fn get(&self, id: TaskId) -> Option<&Lease> {
        self.rows.get(&id)
    }
}

impl Default for InMemoryTaskStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TaskStore for InMemoryTaskStore {
    fn insert(&mut self, expires: u64, owner: Option<&str>) -> Result<TaskId, StoreError> {
        let id = self.next_id;
        self.next_id += 1;
        self.rows.insert(
            id,
            Lease {
                id,
                expires,
                done: false,
                owner: owner.map(str::to_string),
            },
        );
        Ok(id)
    }

    fn live_ids(&self, now: u64) -> Result<Vec<TaskId>, StoreError> {
        Ok(self
            .rows
            .values()
            .filter(|l| !l.done && l.expires > now)
            .map(|l| l.id)
            .collect())
    }

    fn expired_ids(&self, now: u64) -> Result<Vec<TaskId>, StoreError> {
        Ok(self
            .rows
            .values()
            .filter(|l| !l.done && l.expires <= now)
            .map(|l| l.id)
            .collect())
    }

    fn reassign(&mut self, id: TaskId, expires: u64, owner: Option<&str>) -> Result<(), StoreError> {
        let row = self.rows.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        if !row.done {
            row.expires = expires;
            row.owner = owner.map(str::to_string);
        }
        Ok(())
    }

    fn mark_done(&mut self, id: TaskId, owner: Option<&str>) -> Result<bool, StoreError> {
        match self.rows.get_mut(&id) {
            Some(row) => {
                if !row.done {
                    row.done = true;
                    row.owner = owner.map(str::to_string);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn max_id(&self) -> Result<TaskId, StoreError> {
        Ok(self.rows.keys().next_back().copied().unwrap_or(0))
    }

    fn done_count(&self) -> Result<u64, StoreError> {
        Ok(self.rows.values().filter(|l| l.done).count() as u64)
    }

    fn owner_done_counts(&self) -> Result<HashMap<String, u64>, StoreError> {
        let mut counts = HashMap::new();
        for row in self.rows.values().filter(|l| l.done) {
            if let Some(owner) = &row.owner {
                *counts.entry(owner.clone()).or_insert(0) += 1;
            }
        }
        Ok(counts)
    }
}
