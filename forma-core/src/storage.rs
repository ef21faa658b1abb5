//! Stored-name scheme and upload directory operations.
//!
//! Uploads are written under a structured name
//! `<table>.<field>.<key>.<hex(stem)>.<ext>`: `table` and `field` identify
//! the owning record slot, `key` is a random hex key unique per upload, and
//! the original filename stem is hex-encoded so it can be recovered from the
//! stored name alone. The extension is kept in clear text so the conversion
//! command sees it.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;
use uuid::Uuid;

use crate::error::{ConvertError, Result};

/// Table owning stored uploads.
pub const UPLOAD_TABLE: &str = "uploads";
/// Upload field within the table.
pub const UPLOAD_FIELD: &str = "upload_input_file";

/// The parts recovered from a stored upload name.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredName {
    pub table: String,
    pub field: String,
    pub key: String,
    /// The filename the client uploaded, `<stem>.<ext>`.
    pub original_name: String,
    pub extension: String,
}

/// Split a filename into (stem, extension).
///
/// Any path components are stripped first; names without a non-empty stem
/// and extension are rejected.
pub fn split_filename(name: &str) -> Result<(String, String)> {
    let base = name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(name);

    let invalid = |reason: &str| {
        ConvertError::InvalidFilename(name.to_string(), reason.to_string())
    };

    let dot = base.rfind('.').ok_or_else(|| invalid("missing extension"))?;
    let (stem, ext) = (&base[..dot], &base[dot + 1..]);
    if stem.is_empty() {
        return Err(invalid("missing name before extension"));
    }
    if ext.is_empty() {
        return Err(invalid("missing extension"));
    }
    Ok((stem.to_string(), ext.to_string()))
}

/// Generate a stored name for an original filename.
pub fn generate_stored_name(table: &str, field: &str, original: &str) -> Result<String> {
    let (stem, ext) = split_filename(original)?;
    let key = Uuid::new_v4().simple().to_string();
    Ok(format!(
        "{}.{}.{}.{}.{}",
        table,
        field,
        key,
        hex::encode(stem.as_bytes()),
        ext.to_ascii_lowercase()
    ))
}

/// Parse a stored name back into its parts, recovering the original filename.
pub fn parse_stored_name(stored: &str) -> Result<StoredName> {
    let malformed = || ConvertError::MalformedStoredName(stored.to_string());

    let parts: Vec<&str> = stored.split('.').collect();
    let &[table, field, key, stem_hex, ext] = parts.as_slice() else {
        return Err(malformed());
    };
    if table.is_empty() || field.is_empty() || key.is_empty() || ext.is_empty() {
        return Err(malformed());
    }

    let stem_bytes = hex::decode(stem_hex).map_err(|_| malformed())?;
    let stem = String::from_utf8(stem_bytes).map_err(|_| malformed())?;
    if stem.is_empty() {
        return Err(malformed());
    }

    Ok(StoredName {
        table: table.to_string(),
        field: field.to_string(),
        key: key.to_string(),
        original_name: format!("{}.{}", stem, ext),
        extension: ext.to_string(),
    })
}

/// Write uploaded bytes under the upload directory, returning the stored name.
pub fn store_upload(upload_dir: &Path, original: &str, bytes: &[u8]) -> Result<String> {
    fs::create_dir_all(upload_dir)?;
    let stored = generate_stored_name(UPLOAD_TABLE, UPLOAD_FIELD, original)?;
    fs::write(upload_dir.join(&stored), bytes)?;
    debug!(stored = %stored, bytes = bytes.len(), "stored upload");
    Ok(stored)
}

/// Path of a stored upload on disk.
pub fn source_path(upload_dir: &Path, stored: &str) -> PathBuf {
    upload_dir.join(stored)
}

/// Path the conversion command writes to: the source path with the target
/// extension appended.
pub fn destination_path(upload_dir: &Path, stored: &str, target_ext: &str) -> PathBuf {
    upload_dir.join(format!("{}.{}", stored, target_ext))
}

/// Download filename for a conversion: the original stem with the target
/// extension.
pub fn download_name(stored: &str, target_ext: &str) -> Result<String> {
    let parsed = parse_stored_name(stored)?;
    let (stem, _) = split_filename(&parsed.original_name)?;
    Ok(format!("{}.{}", stem, target_ext))
}

/// Remove a stored upload and any converted artifacts derived from it.
///
/// Converted artifacts carry the stored name as a prefix, so everything with
/// that prefix in the upload directory belongs to this upload.
pub fn remove_upload_files(upload_dir: &Path, stored: &str) -> Result<()> {
    if !upload_dir.is_dir() {
        return Ok(());
    }
    let prefix = format!("{}.", stored);
    for entry in fs::read_dir(upload_dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if name == stored || name.starts_with(&prefix) {
            fs::remove_file(entry.path())?;
        }
    }
    Ok(())
}
