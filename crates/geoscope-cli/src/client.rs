//! Thin HTTP client over the GeoScope API

use chrono::{DateTime, Utc};
use geoscope_core::models::{
    AnalysisKind, AnalysisOutput, Dataset, DatasetId, DatasetStats, FeatureId, ProjectId, TaskId,
    TaskStatus,
};
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

/// Failures talking to the server
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("cannot reach {url}: {source}")]
    Unreachable {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{message} ({status})")]
    Api {
        status: StatusCode,
        message: String,
        details: Option<String>,
    },

    #[error("unexpected response from server: {0}")]
    Decode(String),
}

impl ClientError {
    pub fn details(&self) -> Option<&str> {
        match self {
            ClientError::Api { details, .. } => details.as_deref(),
            _ => None,
        }
    }
}

/// Error body produced by the API
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
    #[serde(default)]
    details: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct HealthView {
    pub status: String,
    pub service: String,
    pub storage: String,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct IngestReceipt {
    pub ids: Vec<FeatureId>,
    pub count: usize,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct SubmitReceipt {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct DeleteReceipt {
    pub success: bool,
    pub message: String,
}

/// Task as reported by `GET /api/v1/tasks/{id}`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TaskView {
    pub id: TaskId,
    pub dataset_id: DatasetId,
    pub project_id: ProjectId,
    pub kind: AnalysisKind,
    pub params: Value,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<AnalysisOutput>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct CreateDatasetBody {
    pub project_id: ProjectId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub source_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Value>,
}

#[derive(Debug, Serialize)]
struct SubmitBody<'a> {
    kind: &'a str,
    params: Value,
}

pub struct ApiClient {
    base_url: String,
    http: reqwest::Client,
}

impl ApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|source| ClientError::Unreachable { url: base_url.clone(), source })?;

        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn health(&self) -> Result<HealthView, ClientError> {
        self.send(self.request(Method::GET, "/health")).await
    }

    pub async fn create_dataset(&self, body: &CreateDatasetBody) -> Result<Dataset, ClientError> {
        self.send(self.request(Method::POST, "/api/v1/datasets").json(body)).await
    }

    pub async fn list_datasets(
        &self,
        project: Option<ProjectId>,
    ) -> Result<Vec<Dataset>, ClientError> {
        let path = match project {
            Some(project) => format!("/api/v1/datasets?project_id={}", project),
            None => "/api/v1/datasets".to_string(),
        };
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn get_dataset(&self, id: DatasetId) -> Result<Dataset, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/v1/datasets/{}", id))).await
    }

    pub async fn dataset_stats(&self, id: DatasetId) -> Result<DatasetStats, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/v1/datasets/{}/stats", id))).await
    }

    pub async fn delete_dataset(&self, id: DatasetId) -> Result<DeleteReceipt, ClientError> {
        self.send(self.request(Method::DELETE, &format!("/api/v1/datasets/{}", id))).await
    }

    pub async fn ingest(&self, id: DatasetId, geojson: &Value) -> Result<IngestReceipt, ClientError> {
        let path = format!("/api/v1/datasets/{}/features", id);
        self.send(self.request(Method::POST, &path).json(geojson)).await
    }

    pub async fn query_features(
        &self,
        id: DatasetId,
        bbox: Option<&str>,
    ) -> Result<geojson::FeatureCollection, ClientError> {
        let mut path = format!("/api/v1/datasets/{}/features", id);
        if let Some(bbox) = bbox {
            path.push_str(&format!("?bbox={}", bbox));
        }
        self.send(self.request(Method::GET, &path)).await
    }

    pub async fn submit_analysis(
        &self,
        id: DatasetId,
        kind: &str,
        params: Value,
    ) -> Result<SubmitReceipt, ClientError> {
        let path = format!("/api/v1/datasets/{}/analyses", id);
        self.send(self.request(Method::POST, &path).json(&SubmitBody { kind, params })).await
    }

    pub async fn get_task(&self, id: TaskId) -> Result<TaskView, ClientError> {
        self.send(self.request(Method::GET, &format!("/api/v1/tasks/{}", id))).await
    }

    pub async fn cancel_task(&self, id: TaskId) -> Result<TaskView, ClientError> {
        self.send(self.request(Method::POST, &format!("/api/v1/tasks/{}/cancel", id))).await
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        self.http.request(method, format!("{}{}", self.base_url, path))
    }

    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ClientError> {
        let response = request.send().await.map_err(|source| ClientError::Unreachable {
            url: self.base_url.clone(),
            source,
        })?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| ClientError::Decode(format!("failed to read body: {}", e)))?;

        if !status.is_success() {
            return Err(match serde_json::from_slice::<ErrorBody>(&bytes) {
                Ok(body) => ClientError::Api { status, message: body.error, details: body.details },
                Err(_) => ClientError::Api {
                    status,
                    message: String::from_utf8_lossy(&bytes).trim().to_string(),
                    details: None,
                },
            });
        }

        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}
