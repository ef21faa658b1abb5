//! External conversion command invocation.

use std::path::{Path, PathBuf};
use std::process::Command;

use tracing::{debug, info};

use crate::error::{ConvertError, Result};
use crate::storage;

/// Runs the external conversion binary over stored uploads.
///
/// The binary takes two positional arguments: the source path and the
/// destination path whose extension names the target format.
#[derive(Debug, Clone)]
pub struct Converter {
    binary: String,
}

impl Converter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Invoke the conversion command with the source and destination paths.
    ///
    /// The command is spawned argv-style; paths are never interpreted by a
    /// shell. Blocks until the command exits.
    pub fn run(&self, source: &Path, dest: &Path) -> Result<()> {
        info!(
            binary = %self.binary,
            source = %source.display(),
            dest = %dest.display(),
            "running conversion command"
        );

        let output = Command::new(&self.binary)
            .arg(source)
            .arg(dest)
            .output()
            .map_err(|e| ConvertError::ConversionFailed {
                command: self.binary.clone(),
                status: "failed to spawn".to_string(),
                output: e.to_string(),
            })?;

        if !output.status.success() {
            let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
            combined.push_str(&String::from_utf8_lossy(&output.stderr));
            return Err(ConvertError::ConversionFailed {
                command: self.binary.clone(),
                status: output.status.to_string(),
                output: combined.trim().to_string(),
            });
        }

        debug!(dest = %dest.display(), "conversion command succeeded");
        Ok(())
    }
}

/// Convert a stored upload to the target extension, returning the path of
/// the converted output.
///
/// The command is invoked exactly once; a zero exit with no output file is
/// still a failure.
pub fn convert_upload(
    converter: &Converter,
    upload_dir: &Path,
    stored: &str,
    target_ext: &str,
) -> Result<PathBuf> {
    let source = storage::source_path(upload_dir, stored);
    let dest = storage::destination_path(upload_dir, stored, target_ext);

    converter.run(&source, &dest)?;

    if !dest.is_file() {
        return Err(ConvertError::MissingOutput(dest));
    }
    Ok(dest)
}
