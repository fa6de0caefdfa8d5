//! HTTP client for the patient's load-control endpoints.

use std::time::Duration;

use http::StatusCode;
use tokio::net::TcpStream;
use tracing::debug;

use crate::error::ControlError;
use crate::source::{ControlFuture, LoadControl};
use crate::transport;

/// Deadline for one start/stop round trip.
pub const CONTROL_TIMEOUT: Duration = Duration::from_secs(10);

/// Drives `GET http://{host}/api/{start|stop}` on the patient.
#[derive(Debug, Clone)]
pub struct PatientClient {
    /// `host` or `host:port`.
    host: String,
    timeout: Duration,
}

impl PatientClient {
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            timeout: CONTROL_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Address to dial, defaulting to port 80.
    fn authority(&self) -> String {
        if self.host.contains(':') {
            self.host.clone()
        } else {
            format!("{}:80", self.host)
        }
    }

    async fn call(&self, endpoint: &str) -> Result<(), ControlError> {
        let path = format!("/api/{endpoint}");
        tokio::time::timeout(self.timeout, self.get(&path))
            .await
            .map_err(|_| ControlError::Timeout(self.timeout))?
    }

    async fn get(&self, path: &str) -> Result<(), ControlError> {
        let authority = self.authority();
        let stream = TcpStream::connect(&authority)
            .await
            .map_err(|source| ControlError::Connect {
                host: authority.clone(),
                source,
            })?;
        let (status, _) = transport::get(stream, &authority, path).await?;
        debug!(%status, host = %authority, %path, "patient responded");

        match status {
            StatusCode::OK => Ok(()),
            other => Err(ControlError::Status(other)),
        }
    }
}

impl LoadControl for PatientClient {
    fn start(&self) -> ControlFuture<'_> {
        Box::pin(self.call("start"))
    }

    fn stop(&self) -> ControlFuture<'_> {
        Box::pin(self.call("stop"))
    }
}
