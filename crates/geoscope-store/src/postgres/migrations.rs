use sqlx::PgPool;
use thiserror::Error;

/// Migration error types
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("Migration failed: {0}")]
    Failed(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Applies the embedded schema migrations under `migrations/`
pub struct MigrationManager {
    pool: PgPool,
}

impl MigrationManager {
    /// Create a new migration manager
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run all pending migrations in version order
    pub async fn run_migrations(&self) -> Result<(), MigrationError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}
