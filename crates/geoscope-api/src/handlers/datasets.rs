use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use geoscope_core::error::GeoscopeError;
use geoscope_core::models::{Dataset, DatasetId, DatasetStats};
use geoscope_geo::dataset_stats;

use crate::dto::{CreateDatasetRequest, DeleteResponse, ListDatasetsQuery, UpdateDatasetRequest};
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

pub async fn create_dataset(
    State(state): State<Arc<AppState>>,
    Json(request): Json<CreateDatasetRequest>,
) -> Result<(StatusCode, Json<Dataset>), ApiError> {
    tracing::info!(name = %request.name, source_type = %request.source_type, "Creating dataset");

    let dataset = state.store.create_dataset(request.into_new_dataset()?).await?;

    Ok((StatusCode::CREATED, Json(dataset)))
}

pub async fn list_datasets(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListDatasetsQuery>,
) -> Result<Json<Vec<Dataset>>, ApiError> {
    let datasets = state.store.list_datasets(query.project_id).await?;
    Ok(Json(datasets))
}

pub async fn get_dataset(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
) -> Result<Json<Dataset>, ApiError> {
    let dataset = state
        .store
        .get_dataset(id)
        .await?
        .ok_or_else(|| GeoscopeError::not_found("Dataset", id))?;
    Ok(Json(dataset))
}

/// Feature count, combined bounds and area of the dataset's features
pub async fn get_dataset_stats(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
) -> Result<Json<DatasetStats>, ApiError> {
    let features = state.store.features_for_dataset(id).await?;
    Ok(Json(dataset_stats(id, &features)))
}

pub async fn update_dataset(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
    Json(request): Json<UpdateDatasetRequest>,
) -> Result<Json<Dataset>, ApiError> {
    let update = request.into_update()?;
    if update.is_empty() {
        return Err(ApiError::bad_request("Nothing to update")
            .with_details("Provide at least one of name, description or metadata"));
    }

    tracing::info!(dataset_id = %id, "Updating dataset");
    let dataset = state.store.update_dataset(id, update).await?;
    Ok(Json(dataset))
}

pub async fn delete_dataset(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
) -> Result<Json<DeleteResponse>, ApiError> {
    tracing::info!(dataset_id = %id, "Deleting dataset");

    state.store.delete_dataset(id).await?;

    Ok(Json(DeleteResponse::success("dataset", &id.to_string())))
}
