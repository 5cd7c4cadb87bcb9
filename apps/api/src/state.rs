//! Shared application state.

use std::sync::Arc;

use defter_db::Database;

use crate::config::ApiConfig;

/// Handed to every handler through axum's `State`.
///
/// Cloning is cheap: the pool and the config are reference counted.
#[derive(Debug, Clone)]
pub struct AppState {
    pub db: Database,
    pub config: Arc<ApiConfig>,
}

impl AppState {
    pub fn new(db: Database, config: ApiConfig) -> Self {
        AppState {
            db,
            config: Arc::new(config),
        }
    }
}
