use async_trait::async_trait;

use gridleaser_core::types::{LeaseReply, TaskResult};

/// Network-level failure as seen by an agent.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Missing or invalid identity. Terminal for the current agent cycle.
    #[error("unauthorized")]
    Unauthorized,
    /// The request exceeded its own timeout; treated like any transport failure.
    #[error("request timed out")]
    Timeout,
    /// Non-2xx reply, including the server surfacing a store failure as 500.
    #[error("server returned status {0}")]
    Status(u16),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

impl TransportError {
    /// Everything except an authorization failure retries with backoff.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, TransportError::Unauthorized)
    }
}

/// The only channel between the client side and the task scheduler.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Establish an identity (`GET /login/`); the session cookie is kept
    /// for subsequent calls.
    async fn login(&self) -> Result<(), TransportError>;

    /// Request the next lease batch (`GET /task/`).
    async fn fetch_tasks(&self) -> Result<LeaseReply, TransportError>;

    /// Deliver completed results and receive the next batch in the same
    /// round-trip (`POST /task/`).
    async fn submit_results(&self, results: &[TaskResult]) -> Result<LeaseReply, TransportError>;
}
