//! Router tests driven through `tower::ServiceExt::oneshot`

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use geoscope_analysis::{AnalysisError, AnalysisRequest, AnalysisService};
use geoscope_api::{create_router, AppState};
use geoscope_core::models::{AnalysisOutput, Detection, Envelope};
use geoscope_store::MemoryStore;
use geoscope_tasks::{NotificationRelay, OrchestratorConfig, TaskOrchestrator};
use serde_json::{json, Value};
use tower::ServiceExt;

struct TwoDetections;

#[async_trait]
impl AnalysisService for TwoDetections {
    async fn invoke(
        &self,
        _request: &AnalysisRequest,
        _deadline: Duration,
    ) -> Result<AnalysisOutput, AnalysisError> {
        tokio::time::sleep(Duration::from_millis(200)).await;
        let geometry = Envelope::new(5.0, 5.0, 6.0, 6.0).unwrap().to_polygon();
        let detection = Detection {
            label: "building".to_string(),
            confidence: 0.9,
            bbox: [5.0, 5.0, 6.0, 6.0],
            geometry,
        };
        Ok(AnalysisOutput::ObjectDetection { detections: vec![detection.clone(), detection] })
    }
}

fn app() -> Router {
    let store = MemoryStore::new();
    let orchestrator = TaskOrchestrator::new(
        Arc::new(store.clone()),
        Arc::new(store.clone()),
        Arc::new(TwoDetections),
        NotificationRelay::default(),
        OrchestratorConfig::default(),
    );
    let state = AppState::new(Arc::new(store.clone()), Arc::new(store), orchestrator, "memory");
    create_router(Arc::new(state))
}

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
    (status, value)
}

async fn create_dataset(app: &Router) -> String {
    let (status, body) = send(
        app,
        Method::POST,
        "/api/v1/datasets",
        Some(json!({
            "project_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "name": "harbour",
            "source_type": "satellite",
            "metadata": {"sensor": "S2"}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["id"].as_str().unwrap().to_string()
}

fn points(coords: &[[f64; 2]]) -> Value {
    json!({
        "type": "FeatureCollection",
        "features": coords.iter().enumerate().map(|(i, c)| json!({
            "type": "Feature",
            "geometry": {"type": "Point", "coordinates": c},
            "properties": {"n": i}
        })).collect::<Vec<_>>()
    })
}

#[tokio::test]
async fn test_health() {
    let (status, body) = send(&app(), Method::GET, "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["storage"], "memory");
}

#[tokio::test]
async fn test_dataset_crud() {
    let app = app();
    let id = create_dataset(&app).await;

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/datasets/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["source_type"], "satellite");
    assert_eq!(body["feature_count"], 0);

    let (status, body) = send(
        &app,
        Method::PATCH,
        &format!("/api/v1/datasets/{}", id),
        Some(json!({"name": "harbour-2024"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "harbour-2024");

    let (status, body) = send(&app, Method::GET, "/api/v1/datasets", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/datasets/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, Method::GET, &format!("/api/v1/datasets/{}", id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}

#[tokio::test]
async fn test_unknown_source_type_is_rejected() {
    let (status, body) = send(
        &app(),
        Method::POST,
        "/api/v1/datasets",
        Some(json!({
            "project_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "name": "x",
            "source_type": "radar"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("radar"));
}

#[tokio::test]
async fn test_ingest_and_bbox_query() {
    let app = app();
    let id = create_dataset(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/datasets/{}/features", id),
        Some(points(&[[5.0, 5.0], [20.0, 20.0]])),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 2);

    let (status, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/datasets/{}/features?bbox=0,0,10,10", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["type"], "FeatureCollection");
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["geometry"]["coordinates"], json!([5.0, 5.0]));

    let (status, _) = send(
        &app,
        Method::GET,
        &format!("/api/v1/datasets/{}/features?bbox=10,0,0,10", id),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_malformed_geometry_rejects_batch() {
    let app = app();
    let id = create_dataset(&app).await;

    let batch = json!({
        "type": "FeatureCollection",
        "features": [
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [1.0, 1.0]}, "properties": {}},
            {"type": "Feature", "geometry": {"type": "Point", "coordinates": [200.0, 1.0]}, "properties": {}}
        ]
    });
    let (status, body) =
        send(&app, Method::POST, &format!("/api/v1/datasets/{}/features", id), Some(batch)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("index 1"));

    let (_, body) =
        send(&app, Method::GET, &format!("/api/v1/datasets/{}/features", id), None).await;
    assert!(body["features"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_analysis_lifecycle_over_http() {
    let app = app();
    let id = create_dataset(&app).await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/datasets/{}/features", id),
        Some(points(&[[1.0, 1.0], [2.0, 2.0], [3.0, 3.0]])),
    )
    .await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/datasets/{}/analyses", id),
        Some(json!({"kind": "object_detection", "params": {"confidence_threshold": 0.5}})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["status"], "pending");
    let task_id = body["task_id"].as_str().unwrap().to_string();

    // Dataset with an in-flight task cannot be deleted
    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/datasets/{}", id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let task = tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let (_, task) =
                send(&app, Method::GET, &format!("/api/v1/tasks/{}", task_id), None).await;
            if task["status"] == "completed" || task["status"] == "failed" {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .unwrap();

    assert_eq!(task["status"], "completed");
    assert_eq!(task["output"]["detections"].as_array().unwrap().len(), 2);
    assert!(task.get("error").is_none());

    let (status, body) =
        send(&app, Method::GET, &format!("/api/v1/datasets/{}/analyses?status=completed", id), None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 1);

    // Too late to cancel
    let (status, _) =
        send(&app, Method::POST, &format!("/api/v1/tasks/{}/cancel", task_id), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) = send(&app, Method::DELETE, &format!("/api/v1/tasks/{}", task_id), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = send(&app, Method::GET, &format!("/api/v1/tasks/{}", task_id), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_unknown_analysis_kind() {
    let app = app();
    let id = create_dataset(&app).await;

    let (status, _) = send(
        &app,
        Method::POST,
        &format!("/api/v1/datasets/{}/analyses", id),
        Some(json!({"kind": "super_resolution"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, body) =
        send(&app, Method::GET, &format!("/api/v1/datasets/{}/analyses", id), None).await;
    assert!(body.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_events_reject_ambiguous_scope() {
    let (status, _) = send(
        &app(),
        Method::GET,
        "/api/v1/events?dataset_id=7c9e6679-7425-40de-944b-e07fc1f90ae7&project_id=7c9e6679-7425-40de-944b-e07fc1f90ae7",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_params_cannot_retag_analysis_kind() {
    let app = app();
    let id = create_dataset(&app).await;

    let (status, body) = send(
        &app,
        Method::POST,
        &format!("/api/v1/datasets/{}/analyses", id),
        Some(json!({
            "kind": "object_detection",
            "params": {"kind": "segmentation", "confidence_threshold": 0.5}
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["details"].as_str().unwrap().contains("params.kind"));
}

#[tokio::test]
async fn test_invalid_path_ids_use_error_body() {
    let app = app();

    let (status, body) = send(&app, Method::GET, "/api/v1/datasets/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid path parameter");
    assert!(body["details"].is_string());

    let (status, body) = send(&app, Method::POST, "/api/v1/tasks/42/cancel", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "Invalid path parameter");
}

#[tokio::test]
async fn test_three_dimensional_ingest_keeps_user_properties() {
    let app = app();
    let id = create_dataset(&app).await;

    let batch = json!({
        "type": "FeatureCollection",
        "features": [
            {
                "type": "Feature",
                "geometry": {"type": "Point", "coordinates": [3.0, 4.0, 55.0]},
                "properties": {"dataset_id": "sensor-7"}
            },
            {
                "type": "Feature",
                "geometry": {"type": "LineString", "coordinates": [[0.0, 0.0, 1.0], [2.0, 2.0, 3.0]]},
                "properties": {}
            }
        ]
    });
    let (status, body) =
        send(&app, Method::POST, &format!("/api/v1/datasets/{}/features", id), Some(batch)).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["count"], 2);

    let (_, body) = send(
        &app,
        Method::GET,
        &format!("/api/v1/datasets/{}/features?bbox=3,4,3,4", id),
        None,
    )
    .await;
    let features = body["features"].as_array().unwrap();
    assert_eq!(features.len(), 1);
    assert_eq!(features[0]["geometry"]["coordinates"], json!([3.0, 4.0]));
    assert_eq!(features[0]["properties"]["dataset_id"], "sensor-7");
    assert_eq!(features[0]["dataset_id"], id);
}

#[tokio::test]
async fn test_dataset_stats() {
    let app = app();
    let id = create_dataset(&app).await;

    let square = json!({
        "type": "Feature",
        "geometry": {
            "type": "Polygon",
            "coordinates": [[[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]]]
        },
        "properties": {}
    });
    send(&app, Method::POST, &format!("/api/v1/datasets/{}/features", id), Some(square)).await;
    send(
        &app,
        Method::POST,
        &format!("/api/v1/datasets/{}/features", id),
        Some(points(&[[-1.0, 5.0]])),
    )
    .await;

    let (status, body) =
        send(&app, Method::GET, &format!("/api/v1/datasets/{}/stats", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["dataset_id"], id);
    assert_eq!(body["feature_count"], 2);
    assert_eq!(body["bounds"], json!([-1.0, 0.0, 2.0, 5.0]));
    assert_eq!(body["total_area"], 4.0);
    assert_eq!(body["mean_area"], 2.0);
    assert_eq!(body["crs"], "EPSG:4326");

    let (status, _) = send(
        &app,
        Method::GET,
        "/api/v1/datasets/7c9e6679-7425-40de-944b-e07fc1f90ae7/stats",
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
