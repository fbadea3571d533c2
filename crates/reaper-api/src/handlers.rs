//! HTTP intake handlers.
//!
//! Each handler delegates to the dispatcher, sweeper, or registry and
//! returns JSON responses.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::Value;

use reaper_sweep::SweepError;

use crate::dispatch::ApiError;
use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(serde::Serialize)]
struct ApiResponse<T: serde::Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: serde::Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Malformed input is the caller's fault; registry failures are ours. The
/// at-least-once transport retries on 5xx only.
fn status_for(error: &ApiError) -> StatusCode {
    match error {
        ApiError::MalformedRecord(_) => StatusCode::BAD_REQUEST,
        ApiError::Sweep(SweepError::MissingInstanceId) => StatusCode::BAD_REQUEST,
        ApiError::Sweep(SweepError::Registry(_)) | ApiError::Registry(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

// ── Notifications ──────────────────────────────────────────────

/// POST /v1/notifications
pub async fn intake_notification(
    State(state): State<ApiState>,
    Json(envelope): Json<Value>,
) -> impl IntoResponse {
    match state.dispatcher.handle(&envelope).await {
        Ok(disposition) => ApiResponse::ok(disposition).into_response(),
        Err(e) => error_response(&e.to_string(), status_for(&e)).into_response(),
    }
}

// ── Instances ──────────────────────────────────────────────────

/// POST /v1/instances/{id}/sweep
pub async fn sweep_instance(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.sweeper.sweep_instance(&id).await {
        Ok(report) => ApiResponse::ok(report).into_response(),
        Err(e) => {
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}

/// GET /v1/instances/{id}/resources
pub async fn list_resources(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    match state.store.records_for_instance(&id) {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => {
            error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response()
        }
    }
}
