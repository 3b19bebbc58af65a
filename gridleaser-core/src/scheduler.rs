use std::collections::HashMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::infrastructure::{StoreError, TaskStore};
use crate::types::{LeaseReply, TaskEnvelope, TaskId, TaskResult};

/// The application plugs its computation into the scheduler through this
/// trait: how many units the job splits into, how long a lease lives, what
/// payload a unit carries, and which result finishes the whole job.
pub trait Job: Send + Sync {
    /// Precomputed total number of units.
    fn total_tasks(&self) -> u64;

    /// Lease grace period in milliseconds.
    fn lease_ttl_ms(&self) -> u64;

    /// Opaque payload shipped to the worker for one unit.
    fn payload(&self, id: TaskId) -> serde_json::Value;

    /// Acceptance predicate. A matching result marks the job complete;
    /// a non-matching one is consumed and discarded, never retried.
    fn accept(&self, result: &TaskResult) -> bool;
}

/// Read-only counters exposed on /stat.json.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchedulerStats {
    /// Leases handed out (including reassignments)
    pub issued: u64,
    /// Results delivered back
    pub received: u64,
    /// Rows in terminal done state
    pub done: u64,
    /// Undone leases still within their grace period
    pub in_flight: u64,
    /// Precomputed unit ceiling
    pub total: u64,
    pub percent_done: f64,
    pub complete: bool,
    /// The accepted result payload, fixed once set
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<TaskResult>,
    /// Done-row counts per owner token
    pub owners: HashMap<String, u64>,
}

/// Server-side task scheduler: assigns leases, reclaims expired ones,
/// and detects job completion.
///
/// All mutable job state (counters, completion latch, ceiling flag) lives
/// here rather than in process-wide globals, so independent jobs can run
/// side by side behind separate schedulers.
pub struct TaskScheduler {
    store: Box<dyn TaskStore + Send>,
    job: Box<dyn Job>,
    issued: u64,
    received: u64,
    winner: Option<TaskResult>,
    // Latched so the allocation path stops re-querying max_id once hit;
    // reclamation of expired rows is unaffected by the latch
    max_reached: bool,
}

impl TaskScheduler {
    pub fn new(store: Box<dyn TaskStore + Send>, job: Box<dyn Job>) -> Self {
        Self {
            store,
            job,
            issued: 0,
            received: 0,
            winner: None,
            max_reached: false,
        }
    }

    /// Issue one lease: reclaim a random expired row if any exists,
    /// otherwise allocate the next sequential id up to the job ceiling.
    ///
    /// Expired rows stay eligible even after the ceiling is hit; the
    /// `MaxReached` answer only means no fresh id can be allocated right now.
    pub fn lease(&mut self, owner: Option<&str>, now: u64) -> Result<LeaseReply, StoreError> {
        if self.winner.is_some() {
            return Ok(LeaseReply::Complete);
        }

        let expires = now + self.job.lease_ttl_ms();

        let expired = self.store.expired_ids(now)?;
        let id = if expired.is_empty() {
            if self.max_reached || self.store.max_id()? >= self.job.total_tasks() {
                self.max_reached = true;
                return Ok(LeaseReply::MaxReached);
            }
            self.store.insert(expires, owner)?
        } else {
            // Uniform pick among expired rows: spreads duplicate-work risk
            // instead of re-colliding on the lowest id
            let id = expired[rand::thread_rng().gen_range(0..expired.len())];
            self.store.reassign(id, expires, owner)?;
            id
        };

        self.issued += 1;
        Ok(LeaseReply::Ok {
            tasks: vec![TaskEnvelope {
                id,
                data: self.job.payload(id),
                expires,
            }],
        })
    }

    /// Consume delivered results and piggy-back the next lease batch.
    ///
    /// Every delivered row is marked done regardless of correctness: a
    /// delivered task is consumed, a non-matching computation is discarded
    /// but not retried. The first accepted result latches completion; the
    /// winning payload never changes afterwards.
    pub fn report(
        &mut self,
        owner: Option<&str>,
        results: &[TaskResult],
        now: u64,
    ) -> Result<LeaseReply, StoreError> {
        for result in results {
            if self.store.mark_done(result.id, owner)? {
                self.received += 1;
            }
            if self.winner.is_none() && self.job.accept(result) {
                self.winner = Some(result.clone());
            }
        }

        if self.winner.is_some() {
            return Ok(LeaseReply::Complete);
        }
        self.lease(owner, now)
    }

    pub fn is_complete(&self) -> bool {
        self.winner.is_some()
    }

    pub fn stats(&self, now: u64) -> Result<SchedulerStats, StoreError> {
        let done = self.store.done_count()?;
        let total = self.job.total_tasks();
        Ok(SchedulerStats {
            issued: self.issued,
            received: self.received,
            done,
            in_flight: self.store.live_ids(now)?.len() as u64,
            total,
            percent_done: if total == 0 {
                0.0
            } else {
                done as f64 * 100.0 / total as f64
            },
            complete: self.winner.is_some(),
            winner: self.winner.clone(),
            owners: self.store.owner_done_counts()?,
        })
    }
}
