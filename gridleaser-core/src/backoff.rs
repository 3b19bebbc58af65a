/// Default first retry delay in milliseconds.
pub const DEFAULT_FLOOR_MS: u64 = 20;
/// Default backoff ceiling in milliseconds (2 minutes).
pub const DEFAULT_CEILING_MS: u64 = 120_000;

/// Exponential retry backoff for network failures.
///
/// Each failure doubles the delay up to the ceiling; a single success
/// resets it to the floor.
#[derive(Debug, Clone)]
pub struct RetryDelay {
    floor: u64,
    ceiling: u64,
    current: u64,
}

impl RetryDelay {
    pub fn new(floor_ms: u64, ceiling_ms: u64) -> Self {
        Self {
            floor: floor_ms,
            ceiling: ceiling_ms.max(floor_ms),
            current: floor_ms,
        }
    }

    /// Current delay in milliseconds.
    pub fn current(&self) -> u64 {
        self.current
    }

    /// Register a failure: double the delay, clamped to the ceiling.
    /// Returns the delay to sleep before the next attempt.
    pub fn bump(&mut self) -> u64 {
        self.current = (self.current.saturating_mul(2)).min(self.ceiling);
        self.current
    }

    /// Register a success: back to the floor.
    pub fn reset(&mut self) {
        self.current = self.floor;
    }
}

impl Default for RetryDelay {
    fn default() -> Self {
        Self::new(DEFAULT_FLOOR_MS, DEFAULT_CEILING_MS)
    }
}
