//! SQLite-backed TaskStore implementation.
//! Keeps the lease table across server restarts.
//!
//! Enable with the `sqlite` feature flag:
//! ```toml
//! gridleaser-core = { path = "../gridleaser-core", features = ["sqlite"] }
//! ```

use std::collections::HashMap;

use rusqlite::{params, Connection, OptionalExtension};

use crate::infrastructure::{StoreError, TaskStore};
use crate::types::TaskId;

/// A persistent lease table backed by SQLite.
///
/// Uses WAL mode for concurrent read performance.
pub struct SqliteTaskStore {
    conn: Connection,
}

impl SqliteTaskStore {
    /// Open (or create) a SQLite database at the given path.
    pub fn open(path: &str) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    /// In-process database, used by tests.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;

        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS tasks (
                id      INTEGER PRIMARY KEY AUTOINCREMENT,
                expires INTEGER NOT NULL,
                done    INTEGER NOT NULL DEFAULT 0,
                owner   TEXT
            );
            CREATE INDEX IF NOT EXISTS idx_tasks_done_expires ON tasks(done, expires);",
        )?;

        Ok(Self { conn })
    }

    fn collect_ids(&self, sql: &str, now: u64) -> Result<Vec<TaskId>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt.query_map(params![now], |row| row.get::<_, TaskId>(0))?;
        let mut ids = Vec::new();
        for id in rows {
            ids.push(id?);
        }
        Ok(ids)
    }
}

impl TaskStore for SqliteTaskStore {
    fn insert(&mut self, expires: u64, owner: Option<&str>) -> Result<TaskId, StoreError> {
        self.conn.execute(
            "INSERT INTO tasks (expires, done, owner) VALUES (?1, 0, ?2)",
            params![expires, owner],
        )?;
        Ok(self.conn.last_insert_rowid() as TaskId)
    }

    fn live_ids(&self, now: u64) -> Result<Vec<TaskId>, StoreError> {
        self.collect_ids("SELECT id FROM tasks WHERE done = 0 AND expires > ?1", now)
    }

    fn expired_ids(&self, now: u64) -> Result<Vec<TaskId>, StoreError> {
        self.collect_ids("SELECT id FROM tasks WHERE done = 0 AND expires <= ?1", now)
    }

    fn reassign(&mut self, id: TaskId, expires: u64, owner: Option<&str>) -> Result<(), StoreError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET expires = ?1, owner = ?2 WHERE id = ?3 AND done = 0",
            params![expires, owner, id],
        )?;
        // A done row is terminal; silently skipping it preserves monotonicity
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        if changed == 0 && exists.is_none() {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    fn mark_done(&mut self, id: TaskId, owner: Option<&str>) -> Result<bool, StoreError> {
        let changed = self.conn.execute(
            "UPDATE tasks SET done = 1, owner = ?1 WHERE id = ?2 AND done = 0",
            params![owner, id],
        )?;
        if changed > 0 {
            return Ok(true);
        }
        let exists: Option<i64> = self
            .conn
            .query_row("SELECT 1 FROM tasks WHERE id = ?1", params![id], |row| {
                row.get(0)
            })
            .optional()?;
        Ok(exists.is_some())
    }

    fn max_id(&self) -> Result<TaskId, StoreError> {
        let max: Option<TaskId> =
            self.conn
                .query_row("SELECT MAX(id) FROM tasks", [], |row| row.get(0))?;
        Ok(max.unwrap_or(0))
    }

    fn done_count(&self) -> Result<u64, StoreError> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM tasks WHERE done = 1", [], |row| {
                row.get(0)
            })?)
    }

    fn owner_done_counts(&self) -> Result<HashMap<String, u64>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT owner, COUNT(*) FROM tasks WHERE done = 1 AND owner IS NOT NULL GROUP BY owner",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, u64>(1)?))
        })?;
        let mut counts = HashMap::new();
        for row in rows {
            let (owner, count) = row?;
            counts.insert(owner, count);
        }
        Ok(counts)
    }
}
