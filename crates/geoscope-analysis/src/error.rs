use thiserror::Error;

/// Final outcome of a failed analysis invocation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalysisError {
    /// Every attempt failed with a retryable error
    #[error("analysis service unavailable after {attempts} attempts: {reason}")]
    TransientFailure { attempts: u32, reason: String },

    /// The service refused the request or answered with something unusable
    #[error("analysis rejected: {reason}")]
    Rejected { reason: String },
}

impl AnalysisError {
    pub fn rejected(reason: impl Into<String>) -> Self {
        Self::Rejected { reason: reason.into() }
    }
}

/// Failure of a single backend call, classified for the retry loop
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BackendError {
    /// Connection failures, timeouts, 5xx, 408, 429, or `transient: true` bodies
    #[error("{0}")]
    Transient(String),

    /// Other 4xx, `transient: false` bodies, or malformed responses
    #[error("{0}")]
    Permanent(String),
}

impl BackendError {
    pub fn is_transient(&self) -> bool {
        matches!(self, BackendError::Transient(_))
    }
}
