//! Patient mode — the service under test.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tracing::info;

use triage_api::{PatientState, patient_router};
use triage_stress::{LoadGenerator, find_work_unit};

pub async fn run_patient(port: u16, workers: usize, calibration_ms: u64) -> anyhow::Result<()> {
    info!(workers, "patient starting");

    let target = Duration::from_millis(calibration_ms);
    let work = tokio::task::spawn_blocking(move || find_work_unit(target)).await?;
    info!(size = work.size(), target_ms = calibration_ms, "work unit sized for this CPU");

    let burner = Arc::new(LoadGenerator::new(workers));
    let router = patient_router(PatientState::new(burner.clone(), work));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!(%addr, "patient API listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router)
        .with_graceful_shutdown(crate::shutdown_signal())
        .await?;

    // Join any burner threads before exiting.
    tokio::task::spawn_blocking(move || burner.stop()).await?;
    info!("patient stopped");
    Ok(())
}
