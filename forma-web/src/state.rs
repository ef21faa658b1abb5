use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use forma_core::config::ServiceConfig;
use forma_core::convert::Converter;
use forma_core::db::{self, Connection};

/// Shared application state accessible by all handlers
pub struct AppState {
    config: ServiceConfig,
    converter: Converter,
    conn: Mutex<Connection>,
}

impl AppState {
    /// Open the database at the configured path, run migrations, and build
    /// the shared state.
    pub fn open(config: ServiceConfig) -> anyhow::Result<Arc<Self>> {
        let conn = db::open_or_create(&config.db_path)?;
        db::migrations::migrate(&conn)?;
        let converter = Converter::new(config.convert_bin.clone());
        Ok(Arc::new(Self {
            config,
            converter,
            conn: Mutex::new(conn),
        }))
    }

    pub async fn conn(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().await
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    pub fn converter(&self) -> &Converter {
        &self.converter
    }
}
