use rusqlite::Connection;

/// Run all pending migrations on the database.
///
/// Uses `PRAGMA user_version` to track which migrations have been applied.
pub fn migrate(conn: &Connection) -> rusqlite::Result<()> {
    let version: u32 = conn.pragma_query_value(None, "user_version", |row| row.get(0))?;

    if version < 1 {
        migrate_v0_to_v1(conn)?;
    }

    Ok(())
}

fn migrate_v0_to_v1(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE uploads (
            id              INTEGER PRIMARY KEY,
            stored_name     TEXT NOT NULL UNIQUE,
            original_name   TEXT NOT NULL,
            convert_from    TEXT NOT NULL,
            convert_to      TEXT NOT NULL,
            created_at      TEXT NOT NULL
        );

        CREATE INDEX idx_uploads_created ON uploads(created_at);

        PRAGMA user_version = 1;
        ",
    )?;
    Ok(())
}
