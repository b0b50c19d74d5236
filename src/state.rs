use std::sync::Arc;

use sqlx::PgPool;

use crate::analytics::rollup::RollupEngine;
use crate::config::AppConfig;
use crate::store::session::SessionStore;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub sessions: SessionStore,
    pub engine: RollupEngine,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub fn new(db_pool: PgPool, config: AppConfig) -> Self {
        Self {
            db_pool,
            sessions: SessionStore::new(config.session_ttl),
            engine: RollupEngine::new(config.rollup),
            config: Arc::new(config),
        }
    }
}
