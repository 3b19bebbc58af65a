use std::collections::HashMap;

use crate::types::{CachedTask, TaskId, TaskState};

/// Contract for the coordinator's durable local cache backends.
///
/// Entries are opaque JSON so a malformed record (a stale schema, a
/// corrupted write) can still be enumerated and swept instead of
/// crashing the coordinator.
pub trait CacheStore {
    fn get(&self, id: TaskId) -> Option<serde_json::Value>;
    fn put(&mut self, id: TaskId, entry: serde_json::Value);
    fn remove(&mut self, id: TaskId);
    fn ids(&self) -> Vec<TaskId>;
}

/// Volatile cache backend for tests and cache-less clients.
#[derive(Default)]
pub struct MemoryCacheStore {
    entries: HashMap<TaskId, serde_json::Value>,
}

impl MemoryCacheStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, id: TaskId) -> Option<serde_json::Value> {
        self.entries.get(&id).cloned()
    }

    fn put(&mut self, id: TaskId, entry: serde_json::Value) {
        self.entries.insert(id, entry);
    }

    fn remove(&mut self, id: TaskId) {
        self.entries.remove(&id);
    }

    fn ids(&self) -> Vec<TaskId> {
        self.entries.keys().copied().collect()
    }
}

/// The coordinator's view of in-flight and completed tasks, keyed by id.
///
/// Per-entry lifecycle: created in `progress`, transitions to `complete`,
/// purged when flushed to the server or when `expires` passes (the sweep
/// takes the orthogonal expired edge from any state).
pub struct TaskCache<S: CacheStore> {
    store: S,
}

impl<S: CacheStore> TaskCache<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Upsert by id.
    pub fn update(&mut self, task: &CachedTask) {
        if let Ok(entry) = serde_json::to_value(task) {
            self.store.put(task.id, entry);
        }
    }

    pub fn get(&self, id: TaskId) -> Option<CachedTask> {
        self.decode(id)
    }

    /// Remove the given ids, or with `None` sweep the whole cache,
    /// discarding entries that are malformed or past their hard deadline.
    pub fn cleanup(&mut self, ids: Option<&[TaskId]>, now: u64) {
        match ids {
            Some(ids) => {
                for &id in ids {
                    self.store.remove(id);
                }
            }
            None => {
                for id in self.store.ids() {
                    match self.decode(id) {
                        Some(task) if task.expires > now => {}
                        _ => self.store.remove(id),
                    }
                }
            }
        }
    }

    /// Find a stalled `progress` entry (renewal deadline passed, hard
    /// deadline not). Renews its deadline, persists the renewal, and hands
    /// it back so a different agent can recover work abandoned
    /// mid-computation with zero network cost.
    pub fn take_stalled(&mut self, now: u64, renew_ms: u64) -> Option<CachedTask> {
        for id in self.store.ids() {
            if let Some(mut task) = self.decode(id) {
                if task.state == TaskState::Progress && task.time <= now && task.expires > now {
                    task.time = now + renew_ms;
                    self.update(&task);
                    return Some(task);
                }
            }
        }
        None
    }

    /// Completed, unexpired entries whose results never reached the server.
    /// Scanned at startup so computed-but-unflushed work survives a restart.
    pub fn unsent(&self, now: u64) -> Vec<CachedTask> {
        let mut tasks = Vec::new();
        for id in self.store.ids() {
            if let Some(task) = self.decode(id) {
                if task.state == TaskState::Complete && task.expires > now && task.result.is_some()
                {
                    tasks.push(task);
                }
            }
        }
        tasks
    }

    pub fn len(&self) -> usize {
        self.store.ids().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.ids().is_empty()
    }

    fn decode(&self, id: TaskId) -> Option<CachedTask> {
        serde_json::from_value(self.store.get(id)?).ok()
    }
}
