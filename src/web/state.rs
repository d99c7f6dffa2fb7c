use std::sync::Arc;

use anyhow::{Context, Result};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{config::AppConfig, db};

#[derive(Clone)]
pub struct AppState {
    pool: SqlitePool,
    config: Arc<AppConfig>,
}

impl AppState {
    pub async fn new(config: AppConfig) -> Result<Self> {
        let pool = db::connect(&config.database_url)
            .await
            .context("failed to prepare the database")?;
        info!(database_url = %config.database_url, run_mode = ?config.run_mode, "database ready");

        if config.admin_password_hash.is_none() {
            warn!("ADMIN_PASSWORD_HASH is not set; admin login is disabled");
        }
        if config.auth_bypass() {
            warn!("development mode: admin authentication is bypassed");
        }

        Ok(Self::from_parts(pool, config))
    }

    pub fn from_parts(pool: SqlitePool, config: AppConfig) -> Self {
        Self {
            pool,
            config: Arc::new(config),
        }
    }

    pub fn pool(&self) -> SqlitePool {
        self.pool.clone()
    }

    pub fn pool_ref(&self) -> &SqlitePool {
        &self.pool
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }
}
