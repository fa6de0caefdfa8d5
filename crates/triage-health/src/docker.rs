//! Docker Engine probe source.
//!
//! Reads the patient container's health-check log from the Docker Engine
//! API over its unix socket. Docker keeps the last few probe results in
//! `State.Health.Log`; each entry's output is the patient's sequence
//! number, which becomes the event id.

use std::path::PathBuf;
use std::time::Duration;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tokio::net::UnixStream;
use tracing::{debug, info};

use triage_state::HealthEvent;

use crate::error::ProbeError;
use crate::source::{ProbeFuture, ProbeSource};
use crate::transport;

pub const DEFAULT_DOCKER_SOCKET: &str = "/var/run/docker.sock";

/// Deadline for the connectivity check at construction and for each
/// health poll.
const PING_TIMEOUT: Duration = Duration::from_secs(5);

/// Host header sent over the socket; the daemon ignores it.
const DOCKER_HOST: &str = "docker";

// ── Wire types (subset of the Engine API) ──────────────────────────

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerSummary {
    id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerInspect {
    state: ContainerState,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerState {
    health: Option<Health>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct Health {
    status: String,
    #[serde(default)]
    log: Vec<HealthLog>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct HealthLog {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    exit_code: i64,
    output: String,
}

impl From<HealthLog> for HealthEvent {
    fn from(log: HealthLog) -> Self {
        HealthEvent::new(log.output.trim(), log.start, log.end, log.exit_code)
    }
}

/// Whether a container health status counts as up.
fn is_good_status(status: &str) -> bool {
    matches!(status, "starting" | "healthy")
}

/// Extract health events from a `GET /containers/{id}/json` body.
fn events_from_inspect(body: &[u8]) -> Result<Vec<HealthEvent>, ProbeError> {
    let inspect: ContainerInspect = serde_json::from_slice(body)?;
    let health = inspect
        .state
        .health
        .ok_or_else(|| ProbeError::NotReady("none".to_string()))?;

    if !is_good_status(&health.status) {
        return Err(ProbeError::NotReady(health.status));
    }
    Ok(health.log.into_iter().map(HealthEvent::from).collect())
}

/// `GET /containers/json` path filtered to containers named `name`.
fn container_list_path(name: &str) -> String {
    let filters = serde_json::json!({ "name": [name] }).to_string();
    format!("/containers/json?filters={}", urlencoding::encode(&filters))
}

/// Probe source backed by one container on a local Docker daemon.
#[derive(Debug, Clone)]
pub struct DockerProbe {
    socket: PathBuf,
    container_id: String,
    request_timeout: Duration,
}

impl DockerProbe {
    /// Connect to the daemon at `socket` and resolve the container named
    /// `name`. Fails unless exactly one container matches.
    pub async fn connect(socket: impl Into<PathBuf>, name: &str) -> Result<Self, ProbeError> {
        let mut probe = Self {
            socket: socket.into(),
            container_id: String::new(),
            request_timeout: PING_TIMEOUT,
        };

        tokio::time::timeout(PING_TIMEOUT, probe.get("/_ping"))
            .await
            .map_err(|_| ProbeError::Timeout(PING_TIMEOUT))??;
        info!(socket = %probe.socket.display(), "connected to docker");

        probe.container_id = probe.find_container(name).await?;
        info!(container = name, id = %probe.container_id, "target container found");
        Ok(probe)
    }

    /// Override the per-poll deadline.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    async fn find_container(&self, name: &str) -> Result<String, ProbeError> {
        let body = self.get(&container_list_path(name)).await?;
        let mut containers: Vec<ContainerSummary> = serde_json::from_slice(&body)?;

        if containers.len() != 1 {
            return Err(ProbeError::ContainerLookup {
                name: name.to_string(),
                found: containers.len(),
            });
        }
        Ok(containers.remove(0).id)
    }

    /// Current health-check log of the target container.
    ///
    /// A daemon that does not answer within the request timeout counts as
    /// a failed poll.
    pub async fn inspect_health(&self) -> Result<Vec<HealthEvent>, ProbeError> {
        let path = format!("/containers/{}/json", self.container_id);
        let body = tokio::time::timeout(self.request_timeout, self.get(&path))
            .await
            .map_err(|_| ProbeError::Timeout(self.request_timeout))??;
        let events = events_from_inspect(&body)?;
        debug!(count = events.len(), "health log read");
        Ok(events)
    }

    async fn get(&self, path: &str) -> Result<Bytes, ProbeError> {
        let stream = UnixStream::connect(&self.socket)
            .await
            .map_err(ProbeError::Connect)?;
        let (status, body) = transport::get(stream, DOCKER_HOST, path).await?;

        if !status.is_success() {
            return Err(ProbeError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).trim().to_string(),
            });
        }
        Ok(body)
    }
}

impl ProbeSource for DockerProbe {
    fn health_events(&self) -> ProbeFuture<'_> {
        Box::pin(self.inspect_health())
    }
}
