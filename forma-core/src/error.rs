use std::path::PathBuf;

use thiserror::Error;

/// Error types for forma-core operations.
/// These are used by both the library and the web crate.
#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Invalid upload filename '{0}': {1}")]
    InvalidFilename(String, String),

    #[error("Malformed stored name '{0}'")]
    MalformedStoredName(String),

    #[error("Conversion command '{command}' failed ({status}): {output}")]
    ConversionFailed {
        command: String,
        status: String,
        output: String,
    },

    #[error("Converted output not found at {0}")]
    MissingOutput(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Db(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, ConvertError>;
