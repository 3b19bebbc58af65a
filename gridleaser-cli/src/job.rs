use serde_json::{json, Value};

use gridleaser_core::scheduler::Job;
use gridleaser_core::types::{TaskId, TaskResult};

/// Built-in demo job: find the integer square root of `target` by brute
/// force. The space `[0, total * step)` is split into `total` units of
/// `step` candidates each; the first result carrying a non-null `found`
/// completes the job.
pub struct RangeSearchJob {
    pub total: u64,
    pub step: u64,
    pub target: u64,
    pub ttl_ms: u64,
}

impl Job for RangeSearchJob {
    fn total_tasks(&self) -> u64 {
        self.total
    }

    fn lease_ttl_ms(&self) -> u64 {
        self.ttl_ms
    }

    fn payload(&self, id: TaskId) -> Value {
        // Unit ids start at 1
        let min = (id - 1) * self.step;
        json!({ "min": min, "max": min + self.step, "target": self.target })
    }

    fn accept(&self, result: &TaskResult) -> bool {
        !result.data["found"].is_null()
    }
}

/// The matching worker-side computation for `work`.
pub fn range_search(_id: TaskId, data: Value) -> Value {
    let min = data["min"].as_u64().unwrap_or(0);
    let max = data["max"].as_u64().unwrap_or(0);
    let target = data["target"].as_u64().unwrap_or(0);
    let found = (min..max).find(|x| x.checked_mul(*x) == Some(target));
    json!({ "found": found })
}
