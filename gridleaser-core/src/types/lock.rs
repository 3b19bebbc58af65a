use serde::{Deserialize, Serialize};

/// Cross-instance leadership record shared by all instances on one host.
///
/// Exactly one instance may hold an unexpired lock; holding it means
/// "I may run compute agents now". Expiry makes it acquirable again if
/// the holder disappears.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockRecord {
    pub owner: String,
    pub expires: u64,
}
