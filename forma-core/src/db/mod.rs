pub mod migrations;
pub mod uploads;

use std::path::Path;

// Re-export rusqlite Connection for consumers
pub use rusqlite::Connection;

/// Open or create the SQLite database at the given path.
///
/// Sets WAL journal mode and enables foreign keys.
/// Creates parent directories if needed.
pub fn open_or_create(path: &Path) -> rusqlite::Result<Connection> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                Some(format!("Cannot create directory {}: {}", parent.display(), e)),
            )
        })?;
    }

    let conn = Connection::open(path)?;
    conn.pragma_update(None, "journal_mode", "WAL")?;
    conn.pragma_update(None, "foreign_keys", "ON")?;
    Ok(conn)
}

/// Create an in-memory database with migrations applied, for testing.
#[cfg(test)]
pub fn test_db() -> Connection {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    conn.pragma_update(None, "foreign_keys", "ON").expect("enable foreign keys");
    migrations::migrate(&conn).expect("run migrations");
    conn
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_or_create_creates_db() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("subdir").join("test.db");

        let conn = open_or_create(&db_path).expect("open_or_create should succeed");

        assert!(db_path.exists());

        let mode: String = conn
            .pragma_query_value(None, "journal_mode", |row| row.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "wal");

        let fk: i32 = conn
            .pragma_query_value(None, "foreign_keys", |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
    }
}
