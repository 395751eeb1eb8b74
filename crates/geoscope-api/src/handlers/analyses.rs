use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use geoscope_core::models::{DatasetId, TaskFilter, TaskStatus};

use crate::dto::{ListTasksQuery, SubmitAnalysisRequest, SubmitAnalysisResponse, TaskResponse};
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

pub async fn submit_analysis(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
    Json(request): Json<SubmitAnalysisRequest>,
) -> Result<(StatusCode, Json<SubmitAnalysisResponse>), ApiError> {
    let task = state.orchestrator.submit(id, &request.kind, request.params).await?;

    Ok((
        StatusCode::ACCEPTED,
        Json(SubmitAnalysisResponse { task_id: task.id, status: task.status }),
    ))
}

pub async fn list_analyses(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
    Query(query): Query<ListTasksQuery>,
) -> Result<Json<Vec<TaskResponse>>, ApiError> {
    let mut filter = TaskFilter::for_dataset(id);
    if let Some(status) = query.status.as_deref() {
        filter = filter.with_status(status.parse::<TaskStatus>()?);
    }

    let tasks = state.orchestrator.list(filter).await?;
    Ok(Json(tasks.into_iter().map(TaskResponse::from).collect()))
}
