//! Doctor handlers: remote load control and the metrics snapshot.

use axum::Json;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use triage_health::ControlError;

use crate::DoctorState;

fn control_error(e: ControlError) -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

/// /api/start
pub async fn start(State(state): State<DoctorState>) -> Response {
    match state.switch.start().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => control_error(e),
    }
}

/// /api/stop
pub async fn stop(State(state): State<DoctorState>) -> Response {
    match state.switch.stop().await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => control_error(e),
    }
}

/// /api/metrics
///
/// Serializes to `null` until the first health event has been collected.
pub async fn metrics(State(state): State<DoctorState>) -> impl IntoResponse {
    Json(state.engine.snapshot().await)
}
