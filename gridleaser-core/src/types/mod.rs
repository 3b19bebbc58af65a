mod cache;
mod lock;
mod task;

pub use cache::{CachedTask, TaskState};
pub use lock::LockRecord;
pub use task::{Lease, LeaseReply, TaskEnvelope, TaskId, TaskResult};
