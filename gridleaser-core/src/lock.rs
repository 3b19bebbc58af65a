use crate::types::LockRecord;

/// Contract for the shared lock-record backends (a JSON file here,
/// browser storage in other ports).
pub trait LockStore {
    fn read(&self) -> Option<LockRecord>;
    fn write(&mut self, record: &LockRecord);
}

/// Volatile lock backend for tests. Sharing one instance between two
/// `TabLock`s models two client instances on the same host.
#[derive(Default)]
pub struct MemoryLockStore {
    record: Option<LockRecord>,
}

impl MemoryLockStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockStore for MemoryLockStore {
    fn read(&self) -> Option<LockRecord> {
        self.record.clone()
    }

    fn write(&mut self, record: &LockRecord) {
        self.record = Some(record.clone());
    }
}

/// Outcome of one lock heartbeat, so the caller can pause or resume
/// its agent pool on the edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockTransition {
    /// This instance just became the active one
    Unlocked,
    /// Another instance holds the lock; this one just lost active status
    Locked,
    /// No change since the previous heartbeat
    Unchanged,
}

/// TTL-based mutual exclusion across same-host instances.
///
/// Heartbeat every interval `h` with TTL `T > h`: at most one instance is
/// active at any instant outside a window of at most `h` after the holder
/// crashes. Eventually consistent, not linearizable — two instances may
/// briefly both believe they hold the lock within one heartbeat interval.
pub struct TabLock {
    owner: String,
    ttl_ms: u64,
    // Starts locked out so the first successful heartbeat reports Unlocked
    locked_out: bool,
}

impl TabLock {
    pub fn new(owner: impl Into<String>, ttl_ms: u64) -> Self {
        Self {
            owner: owner.into(),
            ttl_ms,
            locked_out: true,
        }
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn is_locked_out(&self) -> bool {
        self.locked_out
    }

    /// One heartbeat: acquire the lock when free, expired, or already ours;
    /// otherwise stay locked out until the holder's record expires.
    pub fn heartbeat<S: LockStore>(&mut self, store: &mut S, now: u64) -> LockTransition {
        match store.read() {
            Some(record) if record.owner != self.owner && record.expires > now => {
                if self.locked_out {
                    LockTransition::Unchanged
                } else {
                    self.locked_out = true;
                    LockTransition::Locked
                }
            }
            // Free, ours, or expired (steal)
            _ => {
                store.write(&LockRecord {
                    owner: self.owner.clone(),
                    expires: now + self.ttl_ms,
                });
                if self.locked_out {
                    self.locked_out = false;
                    LockTransition::Unlocked
                } else {
                    LockTransition::Unchanged
                }
            }
        }
    }
}
