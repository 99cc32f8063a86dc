//! `POST /api/v1/events`

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use chrono::{DateTime, FixedOffset, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::Error;
use crate::model::NewEvent;

use super::AppState;

/// Request body. Omitted strings bind as empty and fail validation with a
/// field-specific message.
#[derive(Debug, Deserialize)]
pub struct CreateEventRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub user_id: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub metadata: Option<serde_json::Map<String, serde_json::Value>>,
    #[serde(default)]
    pub occurred_at: Option<DateTime<FixedOffset>>,
}

impl From<CreateEventRequest> for NewEvent {
    fn from(req: CreateEventRequest) -> Self {
        let mut new = NewEvent::new(req.name, req.user_id, req.source);
        if let Some(metadata) = req.metadata {
            new = new.metadata(serde_json::Value::Object(metadata));
        }
        if let Some(at) = req.occurred_at {
            new = new.occurred_at(at);
        }
        new
    }
}

/// Accepted response: enough to correlate the event later. Carries no
/// claim that the event is stored yet.
#[derive(Debug, Serialize)]
pub struct CreateEventResponse {
    pub id: String,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, error: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: error.into(),
        }),
    )
        .into_response()
}

pub async fn create_event(
    State(state): State<AppState>,
    body: Result<Json<CreateEventRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "invalid request payload");
            return error_response(StatusCode::BAD_REQUEST, "invalid payload");
        }
    };

    match state.ingestor.ingest(req.into()).await {
        Ok(event) => (
            StatusCode::ACCEPTED,
            Json(CreateEventResponse {
                id: event.id().to_string(),
                received_at: event.received_at(),
            }),
        )
            .into_response(),
        Err(e @ Error::Validation(_)) => error_response(StatusCode::BAD_REQUEST, e.to_string()),
        Err(e) => error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}
