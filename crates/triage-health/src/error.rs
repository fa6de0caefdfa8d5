//! Error types for probe sources and load control.

use std::time::Duration;

use thiserror::Error;

/// Failure to obtain health events from the probe source.
///
/// Every variant is treated as transient by the collector.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("failed to connect to docker daemon: {0}")]
    Connect(#[source] std::io::Error),

    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("docker returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode docker response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("not yet active (health status {0:?})")]
    NotReady(String),

    #[error("failed to find container {name}, instead found {found} containers")]
    ContainerLookup { name: String, found: usize },

    #[error("docker daemon did not answer within {0:?}")]
    Timeout(Duration),
}

/// Failure of a remote start/stop call.
#[derive(Debug, Error)]
pub enum ControlError {
    #[error("failed to connect to {host}: {source}")]
    Connect {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid request: {0}")]
    Request(#[from] http::Error),

    #[error("http error: {0}")]
    Http(#[from] hyper::Error),

    #[error("failed with {0}")]
    Status(http::StatusCode),

    #[error("no response within {0:?}")]
    Timeout(Duration),
}
