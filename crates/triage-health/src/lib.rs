//! triage-health — health-signal collection for the doctor.
//!
//! Talks to the outside world on the doctor's behalf: the container
//! runtime that records the patient's health checks, and the patient's
//! own load-control endpoints.
//!
//! # Architecture
//!
//! ```text
//! Collector (2s tick)
//!   ├── ProbeSource::health_events()  ← DockerProbe over the unix socket
//!   ├── PollState::record_ok / record_error
//!   └── HealthEventStore::upsert (first-seen wins)
//!
//! LoadSwitch (doctor's view of patient load)
//!   └── LoadControl::start / stop     ← PatientClient over HTTP
//! ```
//!
//! Any probe failure is transient: it is logged, flips the poll status
//! to `Error` until the next successful tick, and never clears the
//! events already stored.

pub mod collector;
pub mod docker;
pub mod error;
pub mod patient;
pub mod source;
pub mod switch;
mod transport;

pub use collector::{Collector, POLL_INTERVAL};
pub use docker::{DockerProbe, DEFAULT_DOCKER_SOCKET};
pub use error::{ControlError, ProbeError};
pub use patient::{PatientClient, CONTROL_TIMEOUT};
pub use source::{ControlFuture, LoadControl, ProbeFuture, ProbeSource};
pub use switch::LoadSwitch;
