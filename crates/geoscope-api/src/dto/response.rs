use chrono::{DateTime, Utc};
use geoscope_core::models::{
    AnalysisKind, AnalysisOutput, AnalysisParams, AnalysisTask, DatasetId, FeatureId, ProjectId,
    TaskId, TaskStatus,
};
use serde::Serialize;

/// Ingest operation response
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    pub ids: Vec<FeatureId>,
    pub count: usize,
}

impl IngestResponse {
    pub fn new(ids: Vec<FeatureId>) -> Self {
        let count = ids.len();
        Self { ids, count }
    }
}

/// Analysis submission response (202 Accepted)
#[derive(Debug, Serialize)]
pub struct SubmitAnalysisResponse {
    pub task_id: TaskId,
    pub status: TaskStatus,
}

/// Task status, with output or error once terminal
#[derive(Debug, Serialize)]
pub struct TaskResponse {
    pub id: TaskId,
    pub dataset_id: DatasetId,
    pub project_id: ProjectId,
    pub kind: AnalysisKind,
    pub params: AnalysisParams,
    pub status: TaskStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output: Option<AnalysisOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl From<AnalysisTask> for TaskResponse {
    fn from(task: AnalysisTask) -> Self {
        Self {
            id: task.id,
            dataset_id: task.dataset_id,
            project_id: task.project_id,
            kind: task.kind,
            params: task.params,
            status: task.status,
            output: task.output,
            error: task.error,
            created_at: task.created_at,
            started_at: task.started_at,
            completed_at: task.completed_at,
            updated_at: task.updated_at,
        }
    }
}

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: &'static str,
    pub storage: &'static str,
}

impl HealthResponse {
    pub fn ok(storage: &'static str) -> Self {
        Self { status: "ok", service: "geoscope-api", storage }
    }
}

/// Delete operation response
#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub success: bool,
    pub message: String,
}

impl DeleteResponse {
    pub fn success(entity: &str, id: &str) -> Self {
        Self {
            success: true,
            message: format!("Successfully deleted {} {}", entity, id),
        }
    }
}
