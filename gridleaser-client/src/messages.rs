use tokio::sync::oneshot;

use gridleaser_core::types::{CachedTask, TaskId, TaskResult};

/// Agent → coordinator. All fire-and-forget except `GetTasks`, which is a
/// request/response pair over the bundled oneshot channel.
#[derive(Debug)]
pub enum AgentMessage {
    Log {
        agent_id: usize,
        line: String,
    },
    /// Mirror a task state transition into the durable cache
    UpdateTask(CachedTask),
    /// Purge the given ids, or sweep the whole cache with `None`
    CleanupTasks(Option<Vec<TaskId>>),
    /// Ask for a stalled local task before hitting the network
    GetTasks {
        agent_id: usize,
        reply: oneshot::Sender<Vec<CachedTask>>,
    },
    /// Identity rejected; the coordinator stops issuing work
    Unauthorized {
        agent_id: usize,
    },
    /// Terminal scheduler status (complete or ceiling reached)
    NoTasks {
        agent_id: usize,
    },
}

/// Coordinator → agent control.
#[derive(Debug, Clone)]
pub enum AgentControl {
    Start,
    /// Finish the current unit, then stop requesting new work
    Pause,
    /// Activate with previously computed, never-flushed results to post first
    UnsentTasks(Vec<TaskResult>),
}

/// Lifecycle notifications for the embedding application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorEvent {
    /// Another instance holds the tab-lock; agents paused
    Locked,
    /// This instance holds the tab-lock; agents may run
    Unlocked,
    /// The server rejected this client's identity
    Unauthorized,
    /// The job is complete or its unit ceiling was reached
    NoTasks,
}
