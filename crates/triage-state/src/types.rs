//! Domain types for the doctor's health-signal pipeline.
//!
//! A `HealthEvent` is one recorded outcome of the patient container's
//! liveness probe. A `MetricsSnapshot` is derived on demand from the
//! stored events and is serialized straight onto the `/api/metrics`
//! wire object.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize, Serializer};

/// Identifier of a health event (the probe output, a decimal sequence).
pub type EventId = String;

// ── Health events ──────────────────────────────────────────────────

/// One observed health-check outcome. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct HealthEvent {
    pub id: EventId,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub exit_code: i64,
}

impl HealthEvent {
    pub fn new(
        id: impl Into<EventId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        exit_code: i64,
    ) -> Self {
        Self {
            id: id.into(),
            start,
            end,
            exit_code,
        }
    }

    /// Wall-clock span of the probe. Clock skew producing `end < start`
    /// yields zero.
    pub fn latency(&self) -> Duration {
        (self.end - self.start).to_std().unwrap_or_default()
    }

    /// Ordering rank: the id read as an integer sequence number.
    ///
    /// Ids that do not parse rank as 0, so they sort after every positive
    /// sequence number.
    pub fn rank(&self) -> i64 {
        self.id.trim().parse::<i64>().unwrap_or(0)
    }

    /// Whether the id is a well-formed sequence number.
    pub fn has_numeric_id(&self) -> bool {
        self.id.trim().parse::<i64>().is_ok()
    }
}

// ── Derived status ─────────────────────────────────────────────────

/// Outcome of the most recent poll of the probe source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PollStatus {
    #[serde(rename = "OK")]
    Ok,
    #[serde(rename = "Error")]
    Error,
}

/// Drift label derived from recent vs. best-ever probe latency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Diagnosis {
    #[serde(rename = "All good!")]
    AllGood,
    #[serde(rename = "Getting hot!")]
    GettingHot,
}

/// Point-in-time view of the patient's health, recomputed per request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub status: PollStatus,
    #[serde(rename = "patientBurning")]
    pub load_active: bool,
    #[serde(rename = "meanTimming", serialize_with = "as_nanos")]
    pub mean_latency: Duration,
    #[serde(rename = "lastTimming", serialize_with = "as_nanos")]
    pub last_latency: Duration,
    #[serde(rename = "prognosis")]
    pub diagnosis: Diagnosis,
    /// Best latency over every stored event.
    #[serde(skip)]
    pub min_latency: Duration,
    /// Number of stored events the snapshot was derived from.
    #[serde(skip)]
    pub sample_count: usize,
}

/// Anything that can report whether synthetic load is currently applied.
///
/// Implemented by the local `LoadGenerator` and by the doctor's remote
/// load switch.
pub trait LoadState: Send + Sync {
    fn is_active(&self) -> bool;
}

fn as_nanos<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_i64(i64::try_from(d.as_nanos()).unwrap_or(i64::MAX))
}
