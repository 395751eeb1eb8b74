//! Error types for GeoScope

use thiserror::Error;

use crate::models::{TaskId, TaskStatus};

#[derive(Debug, Error)]
pub enum GeoscopeError {
    // Boundary errors
    #[error("Validation failed for {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("Conflict: {reason}")]
    Conflict { reason: String },

    // Ingestion errors
    #[error("Malformed geometry at feature index {index}: {reason}")]
    MalformedGeometry { index: usize, reason: String },

    // Task lifecycle errors
    #[error("Invalid transition for task {task_id}: expected {expected}, found {actual}, requested {requested}")]
    InvalidTransition {
        task_id: TaskId,
        expected: TaskStatus,
        actual: TaskStatus,
        requested: TaskStatus,
    },

    // Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Missing required configuration: {key}")]
    ConfigMissing { key: String },

    #[error("Invalid configuration value for {key}: {reason}")]
    ConfigInvalid { key: String, reason: String },

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl GeoscopeError {
    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation { field: field.into(), reason: reason.into() }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound { entity, id: id.to_string() }
    }

    pub fn conflict(reason: impl Into<String>) -> Self {
        Self::Conflict { reason: reason.into() }
    }

    /// True for the benign CAS race outcome
    pub fn is_invalid_transition(&self) -> bool {
        matches!(self, Self::InvalidTransition { .. })
    }
}

impl From<serde_json::Error> for GeoscopeError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GeoscopeError>;
