use std::sync::Arc;

use axum::{
    extract::{Query, State},
    response::sse::{Event, KeepAlive, Sse},
};
use futures::{Stream, StreamExt};
use geoscope_core::models::Scope;

use crate::dto::EventsQuery;
use crate::error::ApiError;
use crate::state::AppState;

/// Server-sent stream of task status events for a dataset, a project, or everything
pub async fn stream_events(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EventsQuery>,
) -> Result<Sse<impl Stream<Item = Result<Event, axum::Error>>>, ApiError> {
    let scope = match (query.dataset_id, query.project_id) {
        (Some(_), Some(_)) => {
            return Err(ApiError::bad_request("Ambiguous scope")
                .with_details("Pass either dataset_id or project_id, not both"))
        }
        (Some(dataset), None) => Scope::Dataset(dataset),
        (None, Some(project)) => Scope::Project(project),
        (None, None) => Scope::All,
    };

    tracing::info!(?scope, "Event subscriber connected");

    let stream = state
        .orchestrator
        .subscribe(scope)
        .map(|event| Event::default().event("task_status").json_data(&event));

    Ok(Sse::new(stream).keep_alive(KeepAlive::default()))
}
