//! Outcome of the most recent probe-source poll.
//!
//! Written only by the collector loop; read by the metrics engine when
//! building a snapshot. A poll that has not happened yet counts as OK.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::types::PollStatus;

#[derive(Clone, Default)]
pub struct PollState {
    last_error: Arc<RwLock<Option<String>>>,
}

impl PollState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark the latest poll as successful.
    pub async fn record_ok(&self) {
        *self.last_error.write().await = None;
    }

    /// Mark the latest poll as failed with `error`.
    pub async fn record_error(&self, error: impl Into<String>) {
        *self.last_error.write().await = Some(error.into());
    }

    pub async fn status(&self) -> PollStatus {
        match *self.last_error.read().await {
            None => PollStatus::Ok,
            Some(_) => PollStatus::Error,
        }
    }

    pub async fn last_error(&self) -> Option<String> {
        self.last_error.read().await.clone()
    }
}
