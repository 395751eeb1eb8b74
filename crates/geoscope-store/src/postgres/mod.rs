//! PostgreSQL/PostGIS storage adapter implementation

pub mod config;
pub mod ledger;
pub mod migrations;
pub mod spatial;

pub use config::PostgresConfig;
pub use migrations::{MigrationError, MigrationManager};

use geoscope_core::error::{GeoscopeError, Result};
use sqlx::{postgres::PgPoolOptions, PgPool};

/// PostgreSQL storage adapter implementing both the Geometry Store and the
/// Task Ledger over one connection pool
#[derive(Clone)]
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Connect with the given configuration, applying migrations when
    /// `run_migrations` is set
    pub async fn new(config: PostgresConfig) -> Result<Self> {
        config.validate()?;

        let pool = PgPoolOptions::new()
            .min_connections(config.min_connections)
            .max_connections(config.max_connections)
            .acquire_timeout(config.acquire_timeout)
            .connect(&config.database_url)
            .await
            .map_err(|e| GeoscopeError::Storage(format!("Failed to connect to database: {}", e)))?;

        let store = Self { pool };
        store.health_check().await?;

        if config.run_migrations {
            store.run_migrations().await?;
        }

        tracing::info!(max_connections = config.max_connections, "Connected to PostgreSQL");
        Ok(store)
    }

    /// Run all pending migrations
    pub async fn run_migrations(&self) -> Result<()> {
        MigrationManager::new(self.pool.clone())
            .run_migrations()
            .await
            .map_err(|e| GeoscopeError::Storage(format!("Migration failed: {}", e)))
    }

    /// Get a reference to the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Perform a health check on the database connection
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| GeoscopeError::Storage(format!("Health check failed: {}", e)))?;
        Ok(())
    }
}

/// Map a sqlx error with context
pub(crate) fn storage_error(context: &str) -> impl FnOnce(sqlx::Error) -> GeoscopeError + '_ {
    move |e| GeoscopeError::Storage(format!("{}: {}", context, e))
}
