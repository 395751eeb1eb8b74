//! Retrying analysis client

use async_trait::async_trait;
use geoscope_core::models::{
    AnalysisKind, AnalysisOutput, AnalysisParams, DatasetId, SpatialFeature, TaskId,
};
use std::time::Duration;

use crate::error::{AnalysisError, BackendError};
use crate::retry::RetryPolicy;

/// One outbound analysis call
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub task_id: TaskId,
    pub dataset_id: DatasetId,
    pub kind: AnalysisKind,
    pub params: AnalysisParams,
    pub features: Vec<SpatialFeature>,
}

/// Port used by the orchestrator to run an analysis
#[async_trait]
pub trait AnalysisService: Send + Sync {
    /// Run the analysis, retrying transient failures internally.
    ///
    /// Each attempt is bounded by `deadline`.
    async fn invoke(
        &self,
        request: &AnalysisRequest,
        deadline: Duration,
    ) -> Result<AnalysisOutput, AnalysisError>;
}

/// Transport for a single attempt
#[async_trait]
pub trait AnalysisBackend: Send + Sync {
    async fn call(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, BackendError>;
}

/// `AnalysisService` over a backend with bounded retries
pub struct AnalysisClient<B> {
    backend: B,
    policy: RetryPolicy,
}

impl<B: AnalysisBackend> AnalysisClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend, policy: RetryPolicy::default() }
    }

    pub fn with_policy(mut self, policy: RetryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    async fn attempt(
        &self,
        request: &AnalysisRequest,
        deadline: Duration,
    ) -> Result<AnalysisOutput, BackendError> {
        match tokio::time::timeout(deadline, self.backend.call(request)).await {
            Ok(result) => result,
            Err(_) => Err(BackendError::Transient(format!(
                "request timed out after {} ms",
                deadline.as_millis()
            ))),
        }
    }
}

#[async_trait]
impl<B: AnalysisBackend> AnalysisService for AnalysisClient<B> {
    async fn invoke(
        &self,
        request: &AnalysisRequest,
        deadline: Duration,
    ) -> Result<AnalysisOutput, AnalysisError> {
        let mut attempt = 0;

        loop {
            attempt += 1;

            match self.attempt(request, deadline).await {
                Ok(output) => {
                    output
                        .validate_for(request.kind)
                        .map_err(|e| AnalysisError::rejected(format!("invalid response: {}", e)))?;
                    tracing::debug!(
                        task_id = %request.task_id,
                        attempt,
                        results = output.len(),
                        "Analysis succeeded"
                    );
                    return Ok(output);
                }
                Err(BackendError::Permanent(reason)) => {
                    tracing::warn!(task_id = %request.task_id, attempt, %reason, "Analysis rejected");
                    return Err(AnalysisError::Rejected { reason });
                }
                Err(BackendError::Transient(reason)) => {
                    if !self.policy.should_retry(attempt) {
                        tracing::warn!(
                            task_id = %request.task_id,
                            attempts = attempt,
                            %reason,
                            "Analysis retries exhausted"
                        );
                        return Err(AnalysisError::TransientFailure { attempts: attempt, reason });
                    }

                    let backoff = self.policy.backoff(attempt);
                    tracing::info!(
                        task_id = %request.task_id,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        %reason,
                        "Transient analysis failure, retrying"
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }
}
