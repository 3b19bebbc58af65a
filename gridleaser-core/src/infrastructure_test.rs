#[cfg(test)]
mod tests {
    use crate::infrastructure::TaskStore;
    use crate::infrastructure_in_memory::InMemoryTaskStore;

    #[test]
    fn test_insert_assigns_monotonic_ids() {
        let mut store = InMemoryTaskStore::new();
        assert_eq!(store.insert(1000, Some("a")).unwrap(), 1);
        assert_eq!(store.insert(1000, Some("a")).unwrap(), 2);
        assert_eq!(store.insert(1000, None).unwrap(), 3);
        assert_eq!(store.max_id().unwrap(), 3);
    }

    #[test]
    fn test_live_and_expired_partition() {
        let mut store = InMemoryTaskStore::new();
        store.insert(1000, Some("a")).unwrap();
        store.insert(3000, Some("b")).unwrap();

        // At t=2000 the first lease has lapsed, the second has not
        assert_eq!(store.expired_ids(2000).unwrap(), vec![1]);
        assert_eq!(store.live_ids(2000).unwrap(), vec![2]);

        // A lease expiring exactly now is no longer live
        assert_eq!(store.live_ids(3000).unwrap(), Vec::<u64>::new());
    }

    #[test]
    fn test_reassign_rewrites_undone_rows_only() {
        let mut store = InMemoryTaskStore::new();
        let id = store.insert(1000, Some("a")).unwrap();

        store.reassign(id, 5000, Some("b")).unwrap();
        let row = store.get(id).unwrap();
        assert_eq!(row.expires, 5000);
        assert_eq!(row.owner.as_deref(), Some("b"));

        // Done rows are terminal: reassign leaves them untouched
        store.mark_done(id, Some("b")).unwrap();
        store.reassign(id, 9000, Some("c")).unwrap();
        let row = store.get(id).unwrap();
        assert!(row.done);
        assert_eq!(row.expires, 5000);
    }

    #[test]
    fn test_mark_done_is_idempotent_and_monotonic() {
        let mut store = InMemoryTaskStore::new();
        let id = store.insert(1000, Some("a")).unwrap();

        assert!(store.mark_done(id, Some("a")).unwrap());
        assert!(store.mark_done(id, Some("b")).unwrap());
        assert!(!store.mark_done(999, Some("a")).unwrap());

        let row = store.get(id).unwrap();
        assert!(row.done);
        // First completion wins the attribution
        assert_eq!(row.owner.as_deref(), Some("a"));
        assert_eq!(store.done_count().unwrap(), 1);
    }

    #[test]
    fn test_owner_done_counts() {
        let mut store = InMemoryTaskStore::new();
        for _ in 0..3 {
            store.insert(1000, Some("a")).unwrap();
        }
        store.mark_done(1, Some("a")).unwrap();
        store.mark_done(2, Some("a")).unwrap();
        store.mark_done(3, Some("b")).unwrap();

        let counts = store.owner_done_counts().unwrap();
        assert_eq!(counts.get("a"), Some(&2));
        assert_eq!(counts.get("b"), Some(&1));
    }

    #[cfg(feature = "sqlite")]
    mod sqlite {
        use crate::infrastructure::TaskStore;
        use crate::infrastructure_sqlite::SqliteTaskStore;

        #[test]
        fn test_sqlite_store_lease_roundtrip() {
            let mut store = SqliteTaskStore::open_in_memory().unwrap();

            let id = store.insert(1000, Some("a")).unwrap();
            assert_eq!(id, 1);
            assert_eq!(store.live_ids(500).unwrap(), vec![1]);
            assert_eq!(store.expired_ids(1500).unwrap(), vec![1]);

            store.reassign(id, 2000, Some("b")).unwrap();
            assert_eq!(store.live_ids(1500).unwrap(), vec![1]);

            assert!(store.mark_done(id, Some("b")).unwrap());
            assert!(store.mark_done(id, Some("c")).unwrap());
            assert_eq!(store.done_count().unwrap(), 1);
            assert_eq!(store.expired_ids(10_000).unwrap(), Vec::<u64>::new());
            assert_eq!(store.owner_done_counts().unwrap().get("b"), Some(&1));
        }

        #[test]
        fn test_sqlite_store_missing_row() {
            let mut store = SqliteTaskStore::open_in_memory().unwrap();
            assert!(store.reassign(42, 1000, None).is_err());
            assert!(!store.mark_done(42, None).unwrap());
            assert_eq!(store.max_id().unwrap(), 0);
        }
    }
}
