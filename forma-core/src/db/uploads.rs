use std::path::Path;

use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::debug;

use crate::storage;

/// A stored upload plus the requested conversion.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Upload {
    pub id: i64,
    pub stored_name: String,
    pub original_name: String,
    pub convert_from: String,
    pub convert_to: String,
    pub created_at: String,
}

/// Insert a new upload record, returning its id.
pub fn insert(
    conn: &Connection,
    stored_name: &str,
    original_name: &str,
    convert_from: &str,
    convert_to: &str,
) -> rusqlite::Result<i64> {
    let now = chrono::Utc::now().to_rfc3339();
    conn.execute(
        "INSERT INTO uploads (stored_name, original_name, convert_from, convert_to, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![stored_name, original_name, convert_from, convert_to, now],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Find an upload record by its stored name.
pub fn find_by_stored_name(
    conn: &Connection,
    stored_name: &str,
) -> rusqlite::Result<Option<Upload>> {
    conn.query_row(
        "SELECT id, stored_name, original_name, convert_from, convert_to, created_at
         FROM uploads WHERE stored_name = ?1",
        params![stored_name],
        row_to_upload,
    )
    .optional()
}

/// List all upload records, newest first.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Upload>> {
    let mut stmt = conn.prepare(
        "SELECT id, stored_name, original_name, convert_from, convert_to, created_at
         FROM uploads ORDER BY created_at DESC, id DESC",
    )?;
    let rows = stmt.query_map([], row_to_upload)?;
    rows.collect()
}

/// Delete an upload record along with its stored file and any converted
/// artifacts (the autodelete policy).
///
/// Returns false when no record with the stored name exists.
pub fn delete(
    conn: &Connection,
    upload_dir: &Path,
    stored_name: &str,
) -> crate::error::Result<bool> {
    let affected = conn.execute(
        "DELETE FROM uploads WHERE stored_name = ?1",
        params![stored_name],
    )?;
    if affected == 0 {
        return Ok(false);
    }
    storage::remove_upload_files(upload_dir, stored_name)?;
    debug!(stored = %stored_name, "deleted upload record and files");
    Ok(true)
}

fn row_to_upload(row: &rusqlite::Row<'_>) -> rusqlite::Result<Upload> {
    Ok(Upload {
        id: row.get(0)?,
        stored_name: row.get(1)?,
        original_name: row.get(2)?,
        convert_from: row.get(3)?,
        convert_to: row.get(4)?,
        created_at: row.get(5)?,
    })
}
