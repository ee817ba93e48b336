use std::time::Duration;

use serde::Deserialize;
use sqlx::mysql::{MySqlPool, MySqlPoolOptions};

use super::{env_flag, env_parse, env_required};
use crate::core::{AppError, Result};

/// MySQL connection settings
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Apply `migrations/` before serving
    pub run_migrations: bool,
}

impl DatabaseConfig {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            url: env_required("DATABASE_URL")?,
            min_connections: env_parse("DATABASE_MIN_CONNECTIONS", 2)?,
            max_connections: env_parse("DATABASE_MAX_CONNECTIONS", 10)?,
            run_migrations: env_flag("DATABASE_RUN_MIGRATIONS", false)?,
        })
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_connections == 0 || self.min_connections > self.max_connections {
            return Err(AppError::Configuration(format!(
                "Database pool bounds {}..{} are invalid",
                self.min_connections, self.max_connections
            )));
        }
        Ok(())
    }

    /// Open the pool, and migrate when asked to
    pub async fn create_pool(&self) -> Result<MySqlPool> {
        let pool = MySqlPoolOptions::new()
            .min_connections(self.min_connections)
            .max_connections(self.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(&self.url)
            .await?;

        if self.run_migrations {
            sqlx::migrate!("./migrations")
                .run(&pool)
                .await
                .map_err(|e| AppError::Configuration(format!("Migration failed: {}", e)))?;
            tracing::info!("Settlement schema migrated");
        }

        Ok(pool)
    }
}
