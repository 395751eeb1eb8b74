use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use geojson::FeatureCollection;
use geoscope_core::models::{DatasetId, Envelope};
use geoscope_geo::features::{parse_features_value, to_feature_collection};

use crate::dto::{FeatureQuery, IngestResponse};
use crate::error::ApiError;
use crate::extract::ApiPath;
use crate::state::AppState;

/// Ingest a GeoJSON FeatureCollection (or single Feature) as one atomic batch
pub async fn ingest_features(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
    Json(body): Json<serde_json::Value>,
) -> Result<(StatusCode, Json<IngestResponse>), ApiError> {
    let features = parse_features_value(body)?;
    tracing::info!(dataset_id = %id, count = features.len(), "Ingesting features");

    let ids = state.store.ingest_features(id, features).await?;

    Ok((StatusCode::CREATED, Json(IngestResponse::new(ids))))
}

/// Features intersecting `bbox`, or every feature when no bbox is given
pub async fn query_features(
    State(state): State<Arc<AppState>>,
    ApiPath(id): ApiPath<DatasetId>,
    Query(query): Query<FeatureQuery>,
) -> Result<Json<FeatureCollection>, ApiError> {
    let features = match query.bbox.as_deref() {
        Some(bbox) => {
            let envelope = Envelope::parse_bbox(bbox)?;
            tracing::debug!(dataset_id = %id, ?envelope, "Bounding box query");
            state.store.query_bounding_box(id, &envelope).await?
        }
        None => state.store.features_for_dataset(id).await?,
    };

    Ok(Json(to_feature_collection(&features)))
}
