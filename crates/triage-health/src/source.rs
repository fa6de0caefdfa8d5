//! Collaborator seams: where health events come from and how load is
//! toggled on the patient. Both are injected so tests can script them.

use std::future::Future;
use std::pin::Pin;

use triage_state::HealthEvent;

use crate::error::{ControlError, ProbeError};

/// Boxed future returned by [`ProbeSource::health_events`].
pub type ProbeFuture<'a> =
    Pin<Box<dyn Future<Output = Result<Vec<HealthEvent>, ProbeError>> + Send + 'a>>;

/// Boxed future returned by [`LoadControl`] calls.
pub type ControlFuture<'a> = Pin<Box<dyn Future<Output = Result<(), ControlError>> + Send + 'a>>;

/// Reports the complete list of health events the runtime currently
/// remembers for the monitored target.
///
/// A target whose overall health is not ready must be reported as an
/// error rather than an empty list.
pub trait ProbeSource: Send + Sync {
    fn health_events(&self) -> ProbeFuture<'_>;
}

/// Remote start/stop of the patient's load generator.
pub trait LoadControl: Send + Sync {
    fn start(&self) -> ControlFuture<'_>;
    fn stop(&self) -> ControlFuture<'_>;
}
