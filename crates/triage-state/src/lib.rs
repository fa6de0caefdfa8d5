//! triage-state — in-memory state shared by the doctor subsystems.
//!
//! Holds the observed health events of the patient container and the
//! outcome of the most recent poll. Nothing here is persisted; a restart
//! starts from an empty store.
//!
//! # Architecture
//!
//! ```text
//! Collector ──upsert()──▶ HealthEventStore ◀──snapshot()── MetricsEngine
//!     └─record_ok/record_error─▶ PollState ◀──status()──────┘
//! ```
//!
//! Both types are `Clone` (backed by `Arc`) and can be shared across
//! async tasks.

pub mod poll;
pub mod store;
pub mod types;

pub use poll::PollState;
pub use store::HealthEventStore;
pub use types::*;
