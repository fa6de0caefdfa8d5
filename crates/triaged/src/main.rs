//! triaged — the Triage daemon.
//!
//! One binary, two roles:
//! - `doctor`: polls Docker for the patient container's health-check log,
//!   diagnoses latency drift, and drives the patient's load generator.
//! - `patient`: the service under test. Calibrates a CPU-bound work unit
//!   at startup, serves it as its health check, and burns CPU on demand.
//!
//! # Usage
//!
//! ```text
//! triaged patient --port 80
//! triaged doctor --port 8080 --target patient --patient-host patient
//! ```

mod doctor;
mod patient;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "triaged", about = "Health-check drift monitor and CPU load target")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Monitor a patient container and control its load.
    Doctor {
        /// Port to listen on.
        #[arg(long, default_value = "8080")]
        port: u16,

        /// Name of the container whose health checks are collected.
        #[arg(long, default_value = "patient")]
        target: String,

        /// Host (and optional port) of the patient's API.
        #[arg(long, default_value = "patient")]
        patient_host: String,

        /// Docker Engine unix socket.
        #[arg(long, default_value = triage_health::DEFAULT_DOCKER_SOCKET)]
        docker_socket: PathBuf,

        /// Directory of static assets for the web page.
        #[arg(long, default_value = "static")]
        assets: PathBuf,

        /// Probe-source poll interval in milliseconds.
        #[arg(long, default_value = "2000")]
        poll_interval_ms: u64,
    },

    /// Serve the calibrated health check and the CPU burner.
    Patient {
        /// Port to listen on.
        #[arg(long, default_value = "80")]
        port: u16,

        /// Burner threads (defaults to the number of CPUs).
        #[arg(long)]
        workers: Option<usize>,

        /// Target duration of one health-check work unit in milliseconds.
        #[arg(long, default_value = "400")]
        calibration_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new("info,triaged=debug,triage=debug")
            }),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Doctor {
            port,
            target,
            patient_host,
            docker_socket,
            assets,
            poll_interval_ms,
        } => {
            doctor::run_doctor(doctor::DoctorConfig {
                port,
                target,
                patient_host,
                docker_socket,
                assets,
                poll_interval_ms,
            })
            .await
        }
        Command::Patient {
            port,
            workers,
            calibration_ms,
        } => {
            let workers = workers.unwrap_or_else(num_cpus::get).max(1);
            patient::run_patient(port, workers, calibration_ms).await
        }
    }
}

/// Resolves on Ctrl-C. If the handler cannot be installed the daemon runs
/// until killed.
pub(crate) async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to install CTRL+C handler");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
