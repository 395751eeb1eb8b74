//! HTTP transport for the analysis service

use async_trait::async_trait;
use geoscope_core::models::{AnalysisKind, AnalysisOutput, AnalysisParams, DatasetId, TaskId};
use geoscope_geo::features::to_feature_collection;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::client::{AnalysisBackend, AnalysisRequest};
use crate::error::BackendError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Backend calling `POST {base_url}/analyze/{kind}`
pub struct HttpAnalysisBackend {
    /// Base URL of the analysis service (e.g., "http://localhost:8000")
    base_url: String,

    client: reqwest::Client,
}

impl HttpAnalysisBackend {
    pub fn new(base_url: impl Into<String>) -> Result<Self, BackendError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| BackendError::Permanent(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self { base_url: base_url.into().trim_end_matches('/').to_string(), client })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn endpoint(&self, kind: AnalysisKind) -> String {
        format!("{}/analyze/{}", self.base_url, kind)
    }
}

/// Request body sent to the analysis service
#[derive(Debug, Serialize)]
struct AnalyzeBody<'a> {
    task_id: TaskId,
    dataset_id: DatasetId,
    kind: AnalysisKind,
    params: &'a AnalysisParams,
    features: geojson::FeatureCollection,
}

/// Structured error returned by the analysis service
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    transient: Option<bool>,
}

fn status_is_transient(status: StatusCode) -> bool {
    status.is_server_error()
        || status == StatusCode::REQUEST_TIMEOUT
        || status == StatusCode::TOO_MANY_REQUESTS
}

/// Classify a non-2xx response
fn classify_failure(status: StatusCode, body: &str) -> BackendError {
    let parsed: ErrorBody = serde_json::from_str(body).unwrap_or_default();

    let message = match parsed.error {
        Some(error) => format!("analysis service returned {}: {}", status, error),
        None if body.trim().is_empty() => format!("analysis service returned {}", status),
        None => format!("analysis service returned {}: {}", status, body.trim()),
    };

    if parsed.transient.unwrap_or_else(|| status_is_transient(status)) {
        BackendError::Transient(message)
    } else {
        BackendError::Permanent(message)
    }
}

#[async_trait]
impl AnalysisBackend for HttpAnalysisBackend {
    async fn call(&self, request: &AnalysisRequest) -> Result<AnalysisOutput, BackendError> {
        let body = AnalyzeBody {
            task_id: request.task_id,
            dataset_id: request.dataset_id,
            kind: request.kind,
            params: &request.params,
            features: to_feature_collection(&request.features),
        };

        let response = self
            .client
            .post(self.endpoint(request.kind))
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_builder() {
                    BackendError::Permanent(format!("invalid analysis request: {}", e))
                } else {
                    BackendError::Transient(format!(
                        "failed to reach analysis service at {}: {}",
                        self.base_url, e
                    ))
                }
            })?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| BackendError::Transient(format!("failed to read response body: {}", e)))?;

        if !status.is_success() {
            return Err(classify_failure(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| BackendError::Permanent(format!("malformed analysis response: {}", e)))
    }
}
