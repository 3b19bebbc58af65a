use std::collections::HashMap;

use crate::types::TaskId;

/// Storage-level failure. Surfaced to workers as a transient HTTP 500,
/// retried with the same backoff as any transport failure.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("task {0} not found")]
    NotFound(TaskId),
    #[cfg(feature = "sqlite")]
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

/// Defines the contract for lease-table storage backends.
///
/// Any durable keyed store with atomic read-modify-write suffices.
/// Updates must never corrupt a row: `done = true` is idempotent and
/// monotonic — once set, never unset.
pub trait TaskStore {
    /// Create a new lease row with a fresh expiry, returning its
    /// monotonically assigned id.
    fn insert(&mut self, expires: u64, owner: Option<&str>) -> Result<TaskId, StoreError>;

    /// Ids of undone rows still within their grace period (`expires > now`).
    /// Feeds the in-flight figure in stats; lease assignment itself only
    /// consults `expired_ids`.
    fn live_ids(&self, now: u64) -> Result<Vec<TaskId>, StoreError>;

    /// Ids of undone rows whose lease has lapsed — candidates for reassignment.
    fn expired_ids(&self, now: u64) -> Result<Vec<TaskId>, StoreError>;

    /// Rewrite expiry and owner on a non-done row. Done rows are left
    /// untouched.
    fn reassign(&mut self, id: TaskId, expires: u64, owner: Option<&str>) -> Result<(), StoreError>;

    /// Mark a row done, attributing it to `owner`. Returns whether the row
    /// exists. Marking an already-done row is a no-op that returns true.
    fn mark_done(&mut self, id: TaskId, owner: Option<&str>) -> Result<bool, StoreError>;

    /// Highest id ever assigned, or 0 when empty.
    fn max_id(&self) -> Result<TaskId, StoreError>;

    /// Number of done rows.
    fn done_count(&self) -> Result<u64, StoreError>;

    /// Done-row counts grouped by owner token.
    fn owner_done_counts(&self) -> Result<HashMap<String, u64>, StoreError>;
}
