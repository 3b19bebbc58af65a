//! # gridleaser-client
//!
//! The client half of the gridleaser protocol: a pool of compute agents
//! supervised by a coordinator that owns the durable local task cache and
//! the cross-instance tab-lock. Agents talk to the coordinator only via
//! typed messages and to the server only via the `Transport` seam.

use std::time::{SystemTime, UNIX_EPOCH};

pub mod agent;
pub mod compute;
pub mod coordinator;
pub mod messages;
pub mod storage;
pub mod transport;
pub mod transport_http;

#[cfg(test)]
mod storage_test;

/// Wall-clock epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}
