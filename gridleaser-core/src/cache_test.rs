#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::cache::{CacheStore, MemoryCacheStore, TaskCache};
    use crate::types::{CachedTask, TaskResult, TaskState};

    fn entry(id: u64, state: TaskState, time: u64, expires: u64) -> CachedTask {
        CachedTask {
            id,
            state,
            time,
            expires,
            data: json!({ "unit": id }),
            result: match state {
                TaskState::Complete => Some(TaskResult {
                    id,
                    data: json!({ "found": null }),
                }),
                TaskState::Progress => None,
            },
        }
    }

    #[test]
    fn test_update_upserts_by_id() {
        let mut cache = TaskCache::new(MemoryCacheStore::new());
        cache.update(&entry(1, TaskState::Progress, 100, 1000));
        cache.update(&entry(1, TaskState::Complete, 100, 1000));

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(1).unwrap().state, TaskState::Complete);
    }

    #[test]
    fn test_sweep_purges_expired_regardless_of_state() {
        let mut cache = TaskCache::new(MemoryCacheStore::new());
        cache.update(&entry(1, TaskState::Progress, 100, 500));
        cache.update(&entry(2, TaskState::Complete, 100, 500));
        cache.update(&entry(3, TaskState::Complete, 100, 2000));

        cache.cleanup(None, 1000);

        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_none());
        // Complete and unexpired survives
        assert!(cache.get(3).is_some());
    }

    #[test]
    fn test_sweep_discards_malformed_entries() {
        let mut store = MemoryCacheStore::new();
        store.put(7, json!("not a task"));
        store.put(8, json!({ "state": "progress" }));
        let mut cache = TaskCache::new(store);
        cache.update(&entry(1, TaskState::Progress, 100, 2000));

        cache.cleanup(None, 1000);

        assert_eq!(cache.len(), 1);
        assert!(cache.get(1).is_some());
    }

    #[test]
    fn test_cleanup_with_ids_removes_exactly_those() {
        let mut cache = TaskCache::new(MemoryCacheStore::new());
        cache.update(&entry(1, TaskState::Complete, 100, 5000));
        cache.update(&entry(2, TaskState::Complete, 100, 5000));

        cache.cleanup(Some(&[1]), 0);

        assert!(cache.get(1).is_none());
        assert!(cache.get(2).is_some());
    }

    #[test]
    fn test_take_stalled_renews_deadline() {
        let mut cache = TaskCache::new(MemoryCacheStore::new());
        // Renewal deadline passed at t=1000, hard deadline not
        cache.update(&entry(1, TaskState::Progress, 800, 5000));

        let stalled = cache.take_stalled(1000, 600).unwrap();
        assert_eq!(stalled.id, 1);
        assert_eq!(stalled.time, 1600);
        // Renewal persisted: not stalled again until the new deadline
        assert!(cache.take_stalled(1100, 600).is_none());
        assert!(cache.take_stalled(1600, 600).is_some());
    }

    #[test]
    fn test_take_stalled_skips_expired_and_complete() {
        let mut cache = TaskCache::new(MemoryCacheStore::new());
        // Past the hard deadline: abandoned, not stalled
        cache.update(&entry(1, TaskState::Progress, 100, 900));
        // Complete entries are never re-offered
        cache.update(&entry(2, TaskState::Complete, 100, 5000));
        // Renewal deadline still in the future
        cache.update(&entry(3, TaskState::Progress, 2000, 5000));

        assert!(cache.take_stalled(1000, 600).is_none());
    }

    #[test]
    fn test_unsent_finds_unflushed_results() {
        let mut cache = TaskCache::new(MemoryCacheStore::new());
        cache.update(&entry(1, TaskState::Complete, 100, 5000));
        cache.update(&entry(2, TaskState::Complete, 100, 500));
        cache.update(&entry(3, TaskState::Progress, 100, 5000));

        let unsent = cache.unsent(1000);
        assert_eq!(unsent.len(), 1);
        assert_eq!(unsent[0].id, 1);
    }
}
