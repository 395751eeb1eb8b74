use std::time::Duration;

use geoscope_analysis::RetryPolicy;
use geoscope_core::config::LayeredConfig;
use geoscope_tasks::OrchestratorConfig;

/// API server configuration resolved from the layered configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub port: u16,
    pub cors_origin: String,
    pub database_url: Option<String>,
    pub analysis_url: String,
    pub analysis_deadline: Duration,
    pub retry: RetryPolicy,
    pub max_concurrent_dispatches: usize,
    pub relay_capacity: usize,
    pub stale_task_age: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::from_layered(&LayeredConfig::with_defaults())
    }
}

impl ApiConfig {
    pub fn from_layered(config: &LayeredConfig) -> Self {
        Self {
            port: config.port.value,
            cors_origin: config.cors_origin.value.clone(),
            database_url: config.database_url.value.clone(),
            analysis_url: config.analysis_url.value.clone(),
            analysis_deadline: Duration::from_secs(config.analysis_deadline_secs.value),
            retry: RetryPolicy::new(
                config.retry_max_attempts.value,
                Duration::from_millis(config.retry_initial_backoff_ms.value),
                Duration::from_millis(config.retry_max_backoff_ms.value),
            ),
            max_concurrent_dispatches: config.max_concurrent_dispatches.value,
            relay_capacity: config.relay_capacity.value,
            stale_task_age: Duration::from_secs(config.stale_task_secs.value),
        }
    }

    /// Get the server bind address
    pub fn bind_address(&self) -> String {
        format!("0.0.0.0:{}", self.port)
    }

    /// Check if PostgreSQL storage is configured
    pub fn uses_postgres(&self) -> bool {
        self.database_url.is_some()
    }

    pub fn orchestrator(&self) -> OrchestratorConfig {
        OrchestratorConfig {
            deadline: self.analysis_deadline,
            max_concurrent_dispatches: self.max_concurrent_dispatches,
        }
    }
}
