//! SQLite schema for the key-value backend
//!
//! A single `entries` table of string keys and string values. The schema
//! version lives in `PRAGMA user_version`.

use rusqlite::{Connection, Result};
use tracing::info;

/// Version written by this build
pub const SCHEMA_VERSION: i32 = 1;

/// Version recorded in the database, 0 for a fresh file
pub fn schema_version(conn: &Connection) -> Result<i32> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
}

/// Bring the database up to [`SCHEMA_VERSION`]
///
/// Safe to call on every open. A database written by a newer build is left
/// untouched.
pub fn migrate(conn: &Connection) -> Result<()> {
    let version = schema_version(conn)?;
    if version >= SCHEMA_VERSION {
        return Ok(());
    }

    if version < 1 {
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS entries (
                key   TEXT PRIMARY KEY,
                value TEXT NOT NULL
            ) WITHOUT ROWID;",
        )?;
    }

    conn.pragma_update(None, "user_version", SCHEMA_VERSION)?;
    info!(from = version, to = SCHEMA_VERSION, "Migrated key-value schema");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_database_is_migrated() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(schema_version(&conn).unwrap(), 0);

        migrate(&conn).unwrap();

        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
        let tables: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='entries'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[test]
    fn test_migrate_keeps_entries() {
        let conn = Connection::open_in_memory().unwrap();
        migrate(&conn).unwrap();
        conn.execute("INSERT INTO entries (key, value) VALUES ('k', 'v')", [])
            .unwrap();

        migrate(&conn).unwrap();

        let value: String = conn
            .query_row("SELECT value FROM entries WHERE key = 'k'", [], |row| {
                row.get(0)
            })
            .unwrap();
        assert_eq!(value, "v");
    }

    #[test]
    fn test_newer_database_left_alone() {
        let conn = Connection::open_in_memory().unwrap();
        conn.pragma_update(None, "user_version", SCHEMA_VERSION + 1)
            .unwrap();

        migrate(&conn).unwrap();
        assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION + 1);
    }
}
