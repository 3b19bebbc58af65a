#[cfg(test)]
mod tests {
    use serde_json::json;
    use tempfile::tempdir;

    use gridleaser_core::cache::{CacheStore, TaskCache};
    use gridleaser_core::lock::{LockStore, LockTransition, TabLock};
    use gridleaser_core::types::{CachedTask, LockRecord, TaskState};

    use crate::storage::JsonFileStore;

    #[test]
    fn test_cache_roundtrip_through_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = JsonFileStore::new(&path);
        store.put(1, json!({ "a": 1 }));
        store.put(2, json!({ "b": 2 }));

        assert_eq!(store.get(1), Some(json!({ "a": 1 })));
        let mut ids = store.ids();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 2]);

        store.remove(1);
        assert_eq!(store.get(1), None);

        // A fresh store on the same path sees the surviving entry
        let reopened = JsonFileStore::new(&path);
        assert_eq!(reopened.ids(), vec![2]);
    }

    #[test]
    fn test_missing_and_malformed_files_start_empty() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let store = JsonFileStore::new(&path);
        assert!(store.ids().is_empty());

        std::fs::write(&path, "{ not json").unwrap();
        let mut store = JsonFileStore::new(&path);
        assert!(store.ids().is_empty());

        // Writing recovers the file
        store.put(3, json!({ "c": 3 }));
        assert_eq!(store.get(3), Some(json!({ "c": 3 })));
    }

    #[test]
    fn test_lock_record_shared_between_stores_on_one_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut first = JsonFileStore::new(&path);
        let mut second = JsonFileStore::new(&path);

        first.write(&LockRecord {
            owner: "tab-a".to_string(),
            expires: 10_000,
        });

        // The second store picks the same record up off disk
        let seen = second.read().unwrap();
        assert_eq!(seen.owner, "tab-a");
        assert_eq!(seen.expires, 10_000);

        // And a TabLock driven through it stays locked out
        let mut lock = TabLock::new("tab-b", 5_000);
        assert_eq!(
            lock.heartbeat(&mut second, 1_000),
            LockTransition::Unchanged
        );
        assert!(lock.is_locked_out());

        // Until the holder's record expires
        assert_eq!(
            lock.heartbeat(&mut second, 10_000),
            LockTransition::Unlocked
        );
        assert_eq!(first.read().unwrap().owner, "tab-b");
    }

    #[test]
    fn test_cache_and_lock_coexist_in_one_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("state.json");

        let mut store = JsonFileStore::new(&path);
        store.write(&LockRecord {
            owner: "tab-a".to_string(),
            expires: u64::MAX,
        });

        let mut cache = TaskCache::new(JsonFileStore::new(&path));
        cache.update(&CachedTask {
            id: 5,
            state: TaskState::Progress,
            time: 100,
            expires: u64::MAX,
            data: json!({ "unit": 5 }),
            result: None,
        });

        // The lock record is not a task and the task is not a lock
        assert_eq!(store.ids(), vec![5]);
        assert!(store.read().is_some());
        assert_eq!(cache.get(5).unwrap().state, TaskState::Progress);
    }
}
