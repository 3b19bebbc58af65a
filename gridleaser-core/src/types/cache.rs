use serde::{Deserialize, Serialize};

use super::{TaskId, TaskResult};

/// Client-side task states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    /// Leased and being computed (or abandoned mid-computation)
    Progress,
    /// Computed but not yet acknowledged by the server
    Complete,
}

/// One entry in the coordinator's durable local cache, keyed by task id.
///
/// Created when an agent receives a lease; removed when its result is
/// acknowledged by the server or when `expires` passes (the server will
/// have reclaimed it by then, so it is safe to discard).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedTask {
    pub id: TaskId,
    pub state: TaskState,
    /// Soft renewal deadline: a `progress` entry past this time is
    /// considered stalled and re-offered to any requesting agent
    pub time: u64,
    /// Hard deadline mirrored from the server lease
    pub expires: u64,
    /// The leased payload, kept so a stalled task can be recomputed
    pub data: serde_json::Value,
    /// Present only when `state = complete`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskResult>,
}
