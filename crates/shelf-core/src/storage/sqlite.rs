//! SQLite-backed key-value store
//!
//! The durable store used by the CLI. Every write runs in a transaction so
//! a failed write (quota, disk) leaves the previous contents in place.

use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use tracing::debug;

use crate::snapshot::Snapshot;
use crate::storage::error::{StorageError, StorageResult};
use crate::storage::kv::{check_quota, entry_size, snapshot_size, KeyValueStore, WHOLE_STORE};
use crate::storage::schema::migrate;

/// Bytes of all entries
const SIZE_SQL: &str =
    "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0) FROM entries";

/// Bytes of all entries except `key`
const SIZE_EXCLUDING_SQL: &str = "SELECT COALESCE(SUM(length(CAST(key AS BLOB)) + length(CAST(value AS BLOB))), 0) FROM entries WHERE key != ?1";

/// Key-value store in a SQLite database
pub struct SqliteKv {
    conn: Connection,
    quota: Option<u64>,
}

impl SqliteKv {
    /// Open or create the database at `path`
    pub fn open(path: &Path, quota: Option<u64>) -> StorageResult<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| StorageError::CreateDirectory {
                path: parent.to_path_buf(),
                source,
            })?;
        }

        let conn = Connection::open(path)?;
        migrate(&conn)?;

        debug!("Opened key-value store at {:?}", path);
        Ok(Self { conn, quota })
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory(quota: Option<u64>) -> StorageResult<Self> {
        let conn = Connection::open_in_memory()?;
        migrate(&conn)?;
        Ok(Self { conn, quota })
    }
}

impl KeyValueStore for SqliteKv {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let value = self
            .conn
            .query_row(
                "SELECT value FROM entries WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?;
        Ok(value)
    }

    fn set(&mut self, key: &str, value: &str) -> StorageResult<()> {
        let tx = self.conn.transaction()?;

        let others: i64 = tx.query_row(SIZE_EXCLUDING_SQL, params![key], |row| row.get(0))?;
        check_quota(self.quota, key, others.max(0) as u64 + entry_size(key, value))?;

        tx.execute(
            "INSERT INTO entries (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        tx.commit()?;

        debug!("Wrote {} bytes under {:?}", value.len(), key);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> StorageResult<()> {
        self.conn
            .execute("DELETE FROM entries WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn entries(&self) -> StorageResult<Snapshot> {
        let mut stmt = self
            .conn
            .prepare("SELECT key, value FROM entries ORDER BY key")?;
        let rows = stmt.query_map([], |row| Ok((row.get(0)?, row.get(1)?)))?;

        let mut snapshot = Snapshot::new();
        for row in rows {
            let (key, value): (String, String) = row?;
            snapshot.insert(key, value);
        }
        Ok(snapshot)
    }

    fn replace_all(&mut self, snapshot: &Snapshot) -> StorageResult<()> {
        check_quota(self.quota, WHOLE_STORE, snapshot_size(snapshot))?;

        let tx = self.conn.transaction()?;
        tx.execute("DELETE FROM entries", [])?;
        {
            let mut stmt = tx.prepare("INSERT INTO entries (key, value) VALUES (?1, ?2)")?;
            for (key, value) in snapshot {
                stmt.execute(params![key, value])?;
            }
        }
        tx.commit()?;

        debug!("Replaced store contents with {} keys", snapshot.len());
        Ok(())
    }

    fn used_bytes(&self) -> StorageResult<u64> {
        let used: i64 = self.conn.query_row(SIZE_SQL, [], |row| row.get(0))?;
        Ok(used.max(0) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_set_get_remove() {
        let mut kv = SqliteKv::open_in_memory(None).unwrap();
        assert!(kv.get("a").unwrap().is_none());

        kv.set("a", "1").unwrap();
        kv.set("a", "2").unwrap();
        assert_eq!(kv.get("a").unwrap().as_deref(), Some("2"));

        kv.remove("a").unwrap();
        assert!(kv.get("a").unwrap().is_none());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("shelf.db");

        {
            let mut kv = SqliteKv::open(&path, None).unwrap();
            kv.set("shelf:v1", "{}").unwrap();
            kv.set("other", "value").unwrap();
        }

        let kv = SqliteKv::open(&path, None).unwrap();
        let entries = kv.entries().unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries["other"], "value");
    }

    #[test]
    fn test_quota_exceeded_keeps_previous_value() {
        let mut kv = SqliteKv::open_in_memory(Some(16)).unwrap();
        kv.set("key", "small").unwrap();

        let err = kv.set("key", "this value is far too long").unwrap_err();
        assert!(matches!(err, StorageError::QuotaExceeded { .. }));
        assert_eq!(kv.get("key").unwrap().as_deref(), Some("small"));
    }

    #[test]
    fn test_quota_counts_other_keys() {
        let mut kv = SqliteKv::open_in_memory(Some(20)).unwrap();
        kv.set("a", "123456789").unwrap();
        assert!(kv.set("b", "123456789").is_ok());
        assert!(kv.set("c", "1").is_err());
        assert_eq!(kv.used_bytes().unwrap(), 20);
    }

    #[test]
    fn test_replace_all() {
        let mut kv = SqliteKv::open_in_memory(None).unwrap();
        kv.set("stale", "x").unwrap();

        let mut snapshot = Snapshot::new();
        snapshot.insert("a".to_string(), "1".to_string());
        snapshot.insert("b".to_string(), "2".to_string());
        kv.replace_all(&snapshot).unwrap();

        assert_eq!(kv.entries().unwrap(), snapshot);
    }

    #[test]
    fn test_replace_all_over_quota_is_rejected() {
        let mut kv = SqliteKv::open_in_memory(Some(8)).unwrap();
        kv.set("keep", "me").unwrap();

        let mut snapshot = Snapshot::new();
        snapshot.insert("big".to_string(), "0123456789".to_string());
        let err = kv.replace_all(&snapshot).unwrap_err();
        match err {
            StorageError::QuotaExceeded { key, needed, quota } => {
                assert_eq!(key, WHOLE_STORE);
                assert_eq!((needed, quota), (13, 8));
            }
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(kv.get("keep").unwrap().as_deref(), Some("me"));
    }

    #[test]
    fn test_clear() {
        let mut kv = SqliteKv::open_in_memory(None).unwrap();
        kv.set("a", "1").unwrap();
        kv.clear().unwrap();
        assert!(kv.entries().unwrap().is_empty());
    }
}
