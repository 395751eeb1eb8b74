use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use crate::handlers;
use crate::state::AppState;

/// Create the API router with all routes
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health_check))

        // Datasets
        .route("/api/v1/datasets", post(handlers::create_dataset).get(handlers::list_datasets))
        .route(
            "/api/v1/datasets/{id}",
            get(handlers::get_dataset)
                .patch(handlers::update_dataset)
                .delete(handlers::delete_dataset),
        )
        .route("/api/v1/datasets/{id}/stats", get(handlers::get_dataset_stats))

        // Features
        .route(
            "/api/v1/datasets/{id}/features",
            post(handlers::ingest_features).get(handlers::query_features),
        )

        // Analyses
        .route(
            "/api/v1/datasets/{id}/analyses",
            post(handlers::submit_analysis).get(handlers::list_analyses),
        )

        // Tasks
        .route("/api/v1/tasks/{id}", get(handlers::get_task).delete(handlers::purge_task))
        .route("/api/v1/tasks/{id}/cancel", post(handlers::cancel_task))

        // Events
        .route("/api/v1/events", get(handlers::stream_events))

        .with_state(state)
}
