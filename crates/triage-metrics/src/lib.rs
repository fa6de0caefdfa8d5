//! triage-metrics — diagnosis of the patient's health-check latency.
//!
//! # Diagnosis
//!
//! ```text
//! events  = store, newest first (by id)
//! last    = latency(events[0])
//! mean    = mean latency of the newest min(10, n) events
//! min     = min latency over all events
//!
//! mean > 1.3 * min  →  "Getting hot!"
//! otherwise         →  "All good!"
//! ```
//!
//! The window and drift factor are fixed constants.

pub mod engine;

pub use engine::{diagnose, LatencyStats, MetricsEngine, DRIFT_FACTOR, MEAN_WINDOW};
