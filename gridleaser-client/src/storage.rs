//! JSON-file storage for the client's durable state: cached tasks under a
//! namespaced key prefix plus one lock record under a fixed key.
//!
//! Every operation re-reads the file, so instances sharing a path observe
//! each other's lock writes. Write errors degrade to a log line; the
//! protocol tolerates a lossy cache.

use std::fs;
use std::path::PathBuf;

use serde_json::{Map, Value};

use gridleaser_core::cache::CacheStore;
use gridleaser_core::lock::LockStore;
use gridleaser_core::types::{LockRecord, TaskId};

const TASK_PREFIX: &str = "gridleaser.task.";
const LOCK_KEY: &str = "gridleaser.lock";

pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn load(&self) -> Map<String, Value> {
        // A missing or corrupted file starts over empty
        let Ok(raw) = fs::read_to_string(&self.path) else {
            return Map::new();
        };
        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Object(map)) => map,
            _ => {
                tracing::warn!(path = %self.path.display(), "discarding malformed state file");
                Map::new()
            }
        }
    }

    fn save(&self, map: &Map<String, Value>) {
        let raw = Value::Object(map.clone()).to_string();
        if let Err(err) = fs::write(&self.path, raw) {
            tracing::warn!(path = %self.path.display(), error = %err, "failed to persist state");
        }
    }
}

fn task_key(id: TaskId) -> String {
    format!("{TASK_PREFIX}{id}")
}

impl CacheStore for JsonFileStore {
    fn get(&self, id: TaskId) -> Option<Value> {
        self.load().get(&task_key(id)).cloned()
    }

    fn put(&mut self, id: TaskId, entry: Value) {
        let mut map = self.load();
        map.insert(task_key(id), entry);
        self.save(&map);
    }

    fn remove(&mut self, id: TaskId) {
        let mut map = self.load();
        if map.remove(&task_key(id)).is_some() {
            self.save(&map);
        }
    }

    fn ids(&self) -> Vec<TaskId> {
        self.load()
            .keys()
            .filter_map(|k| k.strip_prefix(TASK_PREFIX))
            .filter_map(|suffix| suffix.parse().ok())
            .collect()
    }
}

impl LockStore for JsonFileStore {
    fn read(&self) -> Option<LockRecord> {
        let value = self.load().get(LOCK_KEY).cloned()?;
        serde_json::from_value(value).ok()
    }

    fn write(&mut self, record: &LockRecord) {
        let mut map = self.load();
        if let Ok(value) = serde_json::to_value(record) {
            map.insert(LOCK_KEY.to_string(), value);
            self.save(&map);
        }
    }
}
