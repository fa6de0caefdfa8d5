//! Patient handlers: local load control and the calibrated health check.
//!
//! Start, stop and the work unit are CPU-bound or blocking, so they run on
//! the blocking pool rather than on the async workers.

use std::sync::atomic::Ordering;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tokio::task::JoinError;
use tracing::error;

use crate::PatientState;

fn join_error(e: JoinError) -> Response {
    error!(error = %e, "blocking task failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
}

/// GET /api/start
pub async fn start(State(state): State<PatientState>) -> Response {
    let burner = state.burner.clone();
    match tokio::task::spawn_blocking(move || burner.start()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => join_error(e),
    }
}

/// GET /api/stop
///
/// Returns once every burner thread has exited.
pub async fn stop(State(state): State<PatientState>) -> Response {
    let burner = state.burner.clone();
    match tokio::task::spawn_blocking(move || burner.stop()).await {
        Ok(()) => StatusCode::OK.into_response(),
        Err(e) => join_error(e),
    }
}

/// /api/healthcheck
///
/// Burns one work unit, then replies with the next sequence number so
/// the caller can identify and order health checks.
pub async fn healthcheck(State(state): State<PatientState>) -> Response {
    let work = state.work;
    if let Err(e) = tokio::task::spawn_blocking(move || work.run()).await {
        return join_error(e);
    }
    let seq = state.sequence.fetch_add(1, Ordering::SeqCst);
    seq.to_string().into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use axum::body::to_bytes;
    use triage_stress::{LoadGenerator, WorkUnit};

    fn test_state() -> PatientState {
        let burner = Arc::new(LoadGenerator::with_burn_iterations(2, 1_000));
        PatientState::new(burner, WorkUnit::new(10))
    }

    async fn body_text(resp: Response) -> String {
        let bytes = to_bytes(resp.into_body(), 1024).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn start_and_stop_toggle_burner() {
        let state = test_state();

        let resp = start(State(state.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(state.burner.is_running());
        assert_eq!(state.burner.live_workers(), 2);

        let resp = stop(State(state.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert!(!state.burner.is_running());
        assert_eq!(state.burner.live_workers(), 0);
    }

    #[tokio::test]
    async fn repeated_start_is_ok() {
        let state = test_state();
        start(State(state.clone())).await;
        let resp = start(State(state.clone())).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(state.burner.live_workers(), 2);
        stop(State(state)).await;
    }

    #[tokio::test]
    async fn healthcheck_counts_up_from_zero() {
        let state = test_state();
        for expected in 0..3 {
            let resp = healthcheck(State(state.clone())).await;
            assert_eq!(resp.status(), StatusCode::OK);
            assert_eq!(body_text(resp).await, expected.to_string());
        }
    }

    #[tokio::test]
    async fn concurrent_healthchecks_get_distinct_numbers() {
        let state = test_state();
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let state = state.clone();
                tokio::spawn(async move { body_text(healthcheck(State(state)).await).await })
            })
            .collect();

        let mut seen = Vec::new();
        for h in handles {
            seen.push(h.await.unwrap().parse::<u64>().unwrap());
        }
        seen.sort_unstable();
        assert_eq!(seen, (0..16).collect::<Vec<_>>());
    }
}
