//! HTTP ingestion endpoint.
//!
//! - `POST /api/v1/events` accepts one tracking event for asynchronous
//!   processing.
//! - `GET /healthz` reports liveness.

pub mod events;

use std::sync::Arc;
use std::time::Instant;

use axum::Router;
use axum::extract::State;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Serialize;
use tower_http::trace::TraceLayer;

use crate::ingest::Ingestor;

/// Shared state accessible from handlers.
#[derive(Clone)]
pub struct AppState {
    pub ingestor: Arc<Ingestor>,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(ingestor: Arc<Ingestor>) -> Self {
        Self {
            ingestor,
            start_time: Instant::now(),
        }
    }
}

/// Build the router with all routes.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(health_handler))
        .route("/api/v1/events", post(events::create_event))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Health check response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
}

/// GET /healthz
async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: state.start_time.elapsed().as_secs(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::error::{Error, Result};
    use crate::queue::{DispatchReceipt, Dispatcher, Task};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, StatusCode, header};
    use chrono::{TimeZone, Utc};
    use std::sync::Mutex;
    use std::time::Duration;
    use tower::ServiceExt;

    #[derive(Default)]
    struct RecordingDispatcher {
        tasks: Mutex<Vec<Task>>,
    }

    #[async_trait]
    impl Dispatcher for RecordingDispatcher {
        async fn dispatch(&self, task: &Task) -> Result<DispatchReceipt> {
            let mut tasks = self.tasks.lock().unwrap();
            tasks.push(task.clone());
            Ok(DispatchReceipt {
                queue: "test".to_string(),
                msg_id: tasks.len() as i64,
            })
        }
    }

    struct DownDispatcher;

    #[async_trait]
    impl Dispatcher for DownDispatcher {
        async fn dispatch(&self, _task: &Task) -> Result<DispatchReceipt> {
            Err(Error::Dispatch("connection refused".to_string()))
        }
    }

    fn app(dispatcher: Arc<dyn Dispatcher>) -> Router {
        let clock = FixedClock(Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap());
        let ingestor = Ingestor::new(dispatcher)
            .with_clock(Arc::new(clock))
            .with_timeouts(Duration::from_millis(500), Duration::from_secs(3));
        router(AppState::new(Arc::new(ingestor)))
    }

    fn post_json(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/v1/events")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(resp: axum::response::Response) -> serde_json::Value {
        let body = axum::body::to_bytes(resp.into_body(), 64 * 1024)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let resp = app(Arc::new(RecordingDispatcher::default()))
            .oneshot(Request::builder().uri("/healthz").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);

        let parsed = body_json(resp).await;
        assert_eq!(parsed["status"], "ok");
        assert!(parsed["uptime_secs"].is_number());
    }

    #[tokio::test]
    async fn accepted_event_returns_id_and_received_at() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let resp = app(dispatcher.clone())
            .oneshot(post_json(
                r#"{"name":"click","user_id":"u1","source":"web","metadata":{"x":1}}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::ACCEPTED);

        let parsed = body_json(resp).await;
        let id = parsed["id"].as_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
        assert_eq!(parsed["received_at"], "2026-03-01T12:00:00Z");

        let tasks = dispatcher.tasks.lock().unwrap();
        assert_eq!(tasks.len(), 1);
        assert_eq!(tasks[0].decode().unwrap().id().to_string(), id);
    }

    #[tokio::test]
    async fn empty_name_is_bad_request() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let resp = app(dispatcher.clone())
            .oneshot(post_json(r#"{"name":"","user_id":"u1","source":"web"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let parsed = body_json(resp).await;
        assert!(parsed["error"].as_str().unwrap().contains("name is required"));
        assert!(dispatcher.tasks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_fields_report_which_is_required() {
        let dispatcher = Arc::new(RecordingDispatcher::default());
        let resp = app(dispatcher.clone())
            .oneshot(post_json(r#"{"user_id":"u1","source":"web"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_json(resp).await["error"]
                .as_str()
                .unwrap()
                .contains("name is required")
        );

        let resp = app(dispatcher.clone())
            .oneshot(post_json(r#"{"name":"click","user_id":"u1"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(
            body_json(resp).await["error"]
                .as_str()
                .unwrap()
                .contains("source is required")
        );
        assert!(dispatcher.tasks.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn malformed_body_is_bad_request() {
        let resp = app(Arc::new(RecordingDispatcher::default()))
            .oneshot(post_json(r#"{"name": 42"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(resp).await["error"], "invalid payload");
    }

    #[tokio::test]
    async fn non_object_metadata_is_bad_request() {
        let resp = app(Arc::new(RecordingDispatcher::default()))
            .oneshot(post_json(
                r#"{"name":"click","user_id":"u1","source":"web","metadata":[1,2]}"#,
            ))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn dispatch_failure_is_server_error() {
        let resp = app(Arc::new(DownDispatcher))
            .oneshot(post_json(r#"{"name":"click","user_id":"u1","source":"web"}"#))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(
            body_json(resp).await["error"]
                .as_str()
                .unwrap()
                .contains("dispatch failed")
        );
    }

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let resp = app(Arc::new(RecordingDispatcher::default()))
            .oneshot(Request::builder().uri("/nonexistent").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }
}
