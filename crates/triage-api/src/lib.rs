//! triage-api — HTTP surfaces for the doctor and the patient.
//!
//! # Doctor routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | any | `/api/start` | Start load on the patient |
//! | any | `/api/stop` | Stop load on the patient |
//! | any | `/api/metrics` | Current `MetricsSnapshot` as JSON, `null` before any data |
//! | GET | everything else | Static assets, served with `Cache-Control: no-cache` |
//!
//! # Patient routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/api/start` | Start the local CPU burner (idempotent) |
//! | GET | `/api/stop` | Stop the local CPU burner (idempotent) |
//! | any | `/api/healthcheck` | Run one work unit, reply with the sequence number |

pub mod assets;
pub mod doctor;
pub mod logging;
pub mod patient;

use std::path::PathBuf;
use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use axum::Router;
use axum::middleware;
use axum::routing::{any, get};

use triage_health::LoadSwitch;
use triage_metrics::MetricsEngine;
use triage_stress::{LoadGenerator, WorkUnit};

/// Shared state for doctor handlers.
#[derive(Clone)]
pub struct DoctorState {
    pub engine: Arc<MetricsEngine>,
    pub switch: Arc<LoadSwitch>,
    /// Directory served for non-API paths.
    pub assets: PathBuf,
}

/// Shared state for patient handlers.
#[derive(Clone)]
pub struct PatientState {
    pub burner: Arc<LoadGenerator>,
    pub work: WorkUnit,
    /// Health-check sequence. Starts at 0, never reset.
    pub sequence: Arc<AtomicU64>,
}

impl PatientState {
    pub fn new(burner: Arc<LoadGenerator>, work: WorkUnit) -> Self {
        Self {
            burner,
            work,
            sequence: Arc::new(AtomicU64::new(0)),
        }
    }
}

/// Build the doctor router (API + static assets + request log).
pub fn doctor_router(state: DoctorState) -> Router {
    let api_routes = Router::new()
        .route("/start", any(doctor::start))
        .route("/stop", any(doctor::stop))
        .route("/metrics", any(doctor::metrics));

    Router::new()
        .nest("/api", api_routes)
        .fallback(assets::serve)
        .with_state(state)
        .layer(middleware::from_fn(logging::log_requests))
}

/// Build the patient router.
pub fn patient_router(state: PatientState) -> Router {
    let api_routes = Router::new()
        .route("/start", get(patient::start))
        .route("/stop", get(patient::stop))
        .route("/healthcheck", any(patient::healthcheck));

    Router::new()
        .nest("/api", api_routes)
        .with_state(state)
        .layer(middleware::from_fn(logging::log_requests))
}
