use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Service configuration loaded from file and/or environment.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub listen_port: u16,
    pub upload_dir: PathBuf,
    pub db_path: PathBuf,
    pub convert_bin: String,
}

/// Raw TOML file structure for `~/.config/forma/config.toml`.
#[derive(Debug, Deserialize, Default)]
struct ConfigFile {
    listen_port: Option<u16>,
    upload_dir: Option<PathBuf>,
    db_path: Option<PathBuf>,
    convert_bin: Option<String>,
}

/// Default config file location.
fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .expect("could not determine config directory")
        .join("forma")
        .join("config.toml")
}

/// Default data directory for uploads and the database.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .expect("could not determine local data directory")
        .join("forma")
}

impl ServiceConfig {
    /// Load configuration from file and environment variables.
    ///
    /// Priority: environment variables override file values. Every field has
    /// a default, so a missing config file is not an error.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        let path = config_path.cloned().unwrap_or_else(default_config_path);

        let file_config = if path.exists() {
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read config: {}", path.display()))?;
            toml::from_str::<ConfigFile>(&content)
                .with_context(|| format!("failed to parse config: {}", path.display()))?
        } else {
            ConfigFile::default()
        };

        Ok(Self::from_file_and_env(file_config))
    }

    /// Build config from parsed file values and current environment.
    fn from_file_and_env(file: ConfigFile) -> Self {
        let listen_port = std::env::var("FORMA_PORT")
            .ok()
            .and_then(|s| s.parse::<u16>().ok())
            .or(file.listen_port)
            .unwrap_or(3900);
        let upload_dir = std::env::var("FORMA_UPLOAD_DIR")
            .ok()
            .map(PathBuf::from)
            .or(file.upload_dir)
            .unwrap_or_else(|| default_data_dir().join("uploads"));
        let db_path = std::env::var("FORMA_DB_PATH")
            .ok()
            .map(PathBuf::from)
            .or(file.db_path)
            .unwrap_or_else(|| default_data_dir().join("forma.db"));
        let convert_bin = std::env::var("FORMA_CONVERT_BIN")
            .ok()
            .or(file.convert_bin)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "convert".to_string());

        Self {
            listen_port,
            upload_dir,
            db_path,
            convert_bin,
        }
    }
}
