//! PostgreSQL connection settings

use geoscope_core::error::{GeoscopeError, Result};
use std::time::Duration;

/// Connection settings for [`PostgresStore`](super::PostgresStore)
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// `postgres://` or `postgresql://` connection URL
    pub database_url: String,
    pub min_connections: u32,
    pub max_connections: u32,
    /// Timeout for acquiring a connection from the pool
    pub acquire_timeout: Duration,
    /// Apply the embedded migrations when the store connects
    pub run_migrations: bool,
}

impl PostgresConfig {
    /// Validated settings with the default pool size
    pub fn new(database_url: impl Into<String>) -> Result<Self> {
        let config = Self {
            database_url: database_url.into(),
            min_connections: 2,
            max_connections: 10,
            acquire_timeout: Duration::from_secs(30),
            run_migrations: true,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = self.database_url.trim();
        if !url.starts_with("postgres://") && !url.starts_with("postgresql://") {
            return Err(invalid("database_url", "expected a postgres:// or postgresql:// URL"));
        }
        if self.max_connections == 0 {
            return Err(invalid("max_connections", "must be greater than 0"));
        }
        if self.min_connections > self.max_connections {
            return Err(invalid(
                "min_connections",
                format!(
                    "{} exceeds max_connections ({})",
                    self.min_connections, self.max_connections
                ),
            ));
        }
        Ok(())
    }
}

fn invalid(key: &str, reason: impl Into<String>) -> GeoscopeError {
    GeoscopeError::ConfigInvalid { key: key.to_string(), reason: reason.into() }
}
