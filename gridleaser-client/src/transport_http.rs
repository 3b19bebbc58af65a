//! reqwest-backed `Transport` with a cookie session and per-request
//! timeouts, mirroring the XHR discipline the server expects.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;

use gridleaser_core::types::{LeaseReply, TaskResult};

use crate::transport::{Transport, TransportError};

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

pub struct HttpTransport {
    client: reqwest::Client,
    base: String,
}

impl HttpTransport {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .timeout(timeout)
            .build()?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    async fn decode(response: reqwest::Response) -> Result<LeaseReply, TransportError> {
        match response.status() {
            StatusCode::FORBIDDEN => Err(TransportError::Unauthorized),
            status if !status.is_success() => Err(TransportError::Status(status.as_u16())),
            _ => response.json::<LeaseReply>().await.map_err(map_reqwest),
        }
    }
}

fn map_reqwest(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Http(err)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn login(&self) -> Result<(), TransportError> {
        let response = self
            .client
            .get(self.url("/login/"))
            .send()
            .await
            .map_err(map_reqwest)?;
        match response.status() {
            status if status.is_success() => Ok(()),
            StatusCode::FORBIDDEN => Err(TransportError::Unauthorized),
            status => Err(TransportError::Status(status.as_u16())),
        }
    }

    async fn fetch_tasks(&self) -> Result<LeaseReply, TransportError> {
        let response = self
            .client
            .get(self.url("/task/"))
            .header("X-Requested-With", "XMLHttpRequest")
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::decode(response).await
    }

    async fn submit_results(&self, results: &[TaskResult]) -> Result<LeaseReply, TransportError> {
        let response = self
            .client
            .post(self.url("/task/"))
            .header("X-Requested-With", "XMLHttpRequest")
            .json(results)
            .send()
            .await
            .map_err(map_reqwest)?;
        Self::decode(response).await
    }
}
