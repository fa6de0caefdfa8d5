//! Doctor mode — health collection, diagnosis, and remote load control.
//!
//! In this mode, the daemon:
//! 1. Connects to Docker and resolves the target container
//! 2. Runs the collector loop as a supervised background task
//! 3. Serves the doctor API and static assets over HTTP
//! 4. On Ctrl-C, stops the server, then signals and joins the collector

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::sync::watch;
use tracing::info;

use triage_api::{DoctorState, doctor_router};
use triage_health::{Collector, DockerProbe, LoadSwitch, PatientClient};
use triage_metrics::MetricsEngine;
use triage_state::{HealthEventStore, PollState};

pub struct DoctorConfig {
    pub port: u16,
    pub target: String,
    pub patient_host: String,
    pub docker_socket: PathBuf,
    pub assets: PathBuf,
    pub poll_interval_ms: u64,
}

pub async fn run_doctor(config: DoctorConfig) -> anyhow::Result<()> {
    info!(target_container = %config.target, "doctor starting");

    // ── Collaborators ────────────────────────────────────────────
    let docker = DockerProbe::connect(&config.docker_socket, &config.target)
        .await
        .with_context(|| format!("connect to docker at {}", config.docker_socket.display()))?;
    let patient = Arc::new(PatientClient::new(config.patient_host.clone()));
    info!(patient = %config.patient_host, "patient client initialized");

    // ── Shared state ─────────────────────────────────────────────
    let store = HealthEventStore::new();
    let poll = PollState::new();
    let switch = Arc::new(LoadSwitch::new(patient));
    let engine = Arc::new(MetricsEngine::new(store.clone(), poll.clone(), switch.clone()));

    // ── Collector task ───────────────────────────────────────────
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let collector = Collector::new(Arc::new(docker), store, poll)
        .with_interval(Duration::from_millis(config.poll_interval_ms));
    let collector_handle = tokio::spawn(async move {
        collector.run(shutdown_rx).await;
    });

    // ── API server ───────────────────────────────────────────────
    let router = doctor_router(DoctorState {
        engine,
        switch,
        assets: config.assets,
    });
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, "doctor API listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(async move {
            crate::shutdown_signal().await;
            let _ = shutdown_tx.send(true);
        })
        .await?;

    let _ = collector_handle.await;
    info!("doctor stopped");
    Ok(())
}
