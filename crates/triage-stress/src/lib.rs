//! triage-stress — synthetic CPU pressure for the patient service.
//!
//! Two pieces:
//!
//! - [`LoadGenerator`]: a pool of busy-loop OS threads that can be
//!   started and stopped idempotently. Stopping joins every worker.
//! - [`find_work_unit`]: one-shot startup calibration that sizes a naive
//!   recursive Fibonacci so that one evaluation takes a target wall-clock
//!   duration on the current hardware. The resulting [`WorkUnit`] is run
//!   once per health-check request.
//!
//! Calibration is hardware-sensitive on purpose: the same problem size
//! yields different latencies on different machines, and the search
//! assumes the reference function keeps getting slower as N grows.

pub mod burner;
pub mod calibrate;

pub use burner::{LoadGenerator, DEFAULT_BURN_ITERATIONS};
pub use calibrate::{calibrate_with, fib, find_work_unit, WorkUnit, CALIBRATION_TARGET};
