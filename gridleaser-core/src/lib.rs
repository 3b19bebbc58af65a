//! # gridleaser-core
//!
//! The coordination kernel for the gridleaser protocol.
//! Provides expiry-based task leasing, exponential retry backoff,
//! durable client-side task caching, and TTL-based instance locking
//! for volunteer distributed computing.

pub mod backoff;
pub mod cache;
pub mod infrastructure;
#[path = "infrastructure_in_memory.rs"]
pub mod infrastructure_in_memory;
#[cfg(feature = "sqlite")]
#[path = "infrastructure_sqlite.rs"]
pub mod infrastructure_sqlite;
pub mod lock;
pub mod scheduler;
pub mod types;

#[cfg(test)]
mod backoff_test;
#[cfg(test)]
mod cache_test;
#[cfg(test)]
#[path = "infrastructure_test.rs"]
mod infrastructure_test;
