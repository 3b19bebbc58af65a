use serde::{Deserialize, Serialize};

/// Task ids are assigned sequentially by the store, starting at 1.
pub type TaskId = u64;

/// A lease row: the server-authoritative record of one unit of work.
///
/// At most one row exists per id. A `done = true` row is immutable
/// terminal state; a non-done row may be rewritten (expires, owner)
/// arbitrarily many times as it is reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    /// Unique, monotonically assigned id
    pub id: TaskId,
    /// Absolute expiry in epoch milliseconds; reclaimable once past and not done
    pub expires: u64,
    /// Terminal completion flag
    pub done: bool,
    /// Opaque token of the last requesting client (audit only)
    pub owner: Option<String>,
}

/// Outbound wire form of a unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskEnvelope {
    pub id: TaskId,
    /// Opaque, application-defined payload
    pub data: serde_json::Value,
    /// Epoch milliseconds after which the server may reassign this task
    pub expires: u64,
}

/// Inbound wire form of a completed unit of work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResult {
    pub id: TaskId,
    pub data: serde_json::Value,
}

/// Scheduler reply carrying its status in-band, so callers can tell
/// "no more work because the job is done" from "no more work because the
/// unit ceiling was hit" from a transient failure (an HTTP error).
/// The first two are terminal: callers must stop retrying.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum LeaseReply {
    /// Fresh leases; may be empty only in degenerate configurations
    Ok { tasks: Vec<TaskEnvelope> },
    /// The job has produced an accepted result
    Complete,
    /// Every unit has been allocated at least once and none is expired
    MaxReached,
}
