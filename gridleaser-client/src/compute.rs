use async_trait::async_trait;

use gridleaser_core::types::TaskId;

/// The plugged-in compute function executed against a leased payload.
///
/// Implement directly for computations that perform I/O; the agent yields
/// while awaiting. For pure CPU work wrap a closure in [`SyncCompute`].
#[async_trait]
pub trait Compute: Send + Sync {
    async fn compute(&self, id: TaskId, data: serde_json::Value) -> serde_json::Value;
}

/// Adapter for synchronous compute functions. The closure runs inline,
/// blocking the agent's own execution until it finishes — the caller
/// accepts reduced responsiveness in exchange for simplicity.
pub struct SyncCompute<F>(pub F);

#[async_trait]
impl<F> Compute for SyncCompute<F>
where
    F: Fn(TaskId, serde_json::Value) -> serde_json::Value + Send + Sync,
{
    async fn compute(&self, id: TaskId, data: serde_json::Value) -> serde_json::Value {
        (self.0)(id, data)
    }
}
