use std::sync::Arc;

use axum::{extract::State, Json};
use geoscope_core::models::TaskId;

use crate::dto::{DeleteResponse, TaskResponse};
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

pub async fn get_task(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<TaskResponse>, ApiError> {
    let task = state.orchestrator.get(id).await?;
    Ok(Json(task.into()))
}

pub async fn cancel_task(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<TaskResponse>, ApiError> {
    tracing::info!(task_id = %id, "Cancelling task");
    let task = state.orchestrator.cancel(id).await?;
    Ok(Json(task.into()))
}

/// Operator removal of a terminal task
pub async fn purge_task(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<TaskId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    tracing::info!(task_id = %id, "Purging task");
    state.ledger.purge_task(id).await?;
    Ok(Json(DeleteResponse::success("task", &id.to_string())))
}
