//! Metrics engine — builds a `MetricsSnapshot` on demand.
//!
//! Read-only over the event store, the poll status, and the load state;
//! safe to call concurrently with the collector and with start/stop.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

use triage_state::{
    Diagnosis, HealthEvent, HealthEventStore, LoadState, MetricsSnapshot, PollState,
};

/// Number of newest events averaged into the mean latency.
pub const MEAN_WINDOW: usize = 10;

/// Mean latency above `DRIFT_FACTOR × min` is diagnosed as getting hot.
pub const DRIFT_FACTOR: f64 = 1.3;

/// Latency statistics over events ordered newest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LatencyStats {
    pub last: Duration,
    pub mean: Duration,
    pub min: Duration,
    pub count: usize,
}

impl LatencyStats {
    /// `None` when there are no samples.
    pub fn compute(newest_first: &[Duration]) -> Option<Self> {
        let last = *newest_first.first()?;
        let window = &newest_first[..newest_first.len().min(MEAN_WINDOW)];
        let sum: Duration = window.iter().sum();
        // Window length is at most MEAN_WINDOW, so it fits.
        let mean = sum / window.len() as u32;
        let min = newest_first.iter().copied().min().unwrap_or(last);

        Some(Self {
            last,
            mean,
            min,
            count: newest_first.len(),
        })
    }

    pub fn diagnosis(&self) -> Diagnosis {
        diagnose(self.mean, self.min)
    }
}

/// Drift detector: has recent latency grown materially above the best?
pub fn diagnose(mean: Duration, min: Duration) -> Diagnosis {
    if mean.as_nanos() as f64 > DRIFT_FACTOR * min.as_nanos() as f64 {
        Diagnosis::GettingHot
    } else {
        Diagnosis::AllGood
    }
}

pub struct MetricsEngine {
    store: HealthEventStore,
    poll: PollState,
    load: Arc<dyn LoadState>,
}

impl MetricsEngine {
    pub fn new(store: HealthEventStore, poll: PollState, load: Arc<dyn LoadState>) -> Self {
        Self { store, poll, load }
    }

    /// Current snapshot, or `None` if no health event has been seen yet.
    pub async fn snapshot(&self) -> Option<MetricsSnapshot> {
        let events = self.store.snapshot().await;
        let latencies: Vec<Duration> = events.iter().map(HealthEvent::latency).collect();
        let Some(stats) = LatencyStats::compute(&latencies) else {
            debug!("no health events yet");
            return None;
        };

        Some(MetricsSnapshot {
            status: self.poll.status().await,
            load_active: self.load.is_active(),
            last_latency: stats.last,
            mean_latency: stats.mean,
            diagnosis: stats.diagnosis(),
            min_latency: stats.min,
            sample_count: stats.count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::{TimeZone, Utc};
    use triage_state::PollStatus;

    struct Flag(AtomicBool);

    impl LoadState for Flag {
        fn is_active(&self) -> bool {
            self.0.load(Ordering::Relaxed)
        }
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn event(id: u64, latency_ms: i64) -> HealthEvent {
        let start = Utc.timestamp_millis_opt(id as i64 * 2_000).unwrap();
        let end = Utc.timestamp_millis_opt(id as i64 * 2_000 + latency_ms).unwrap();
        HealthEvent::new(id.to_string(), start, end, 0)
    }

    fn engine(active: bool) -> (MetricsEngine, HealthEventStore, PollState) {
        let store = HealthEventStore::new();
        let poll = PollState::new();
        let load = Arc::new(Flag(AtomicBool::new(active)));
        (MetricsEngine::new(store.clone(), poll.clone(), load), store, poll)
    }

    #[test]
    fn stats_empty_is_none() {
        assert!(LatencyStats::compute(&[]).is_none());
    }

    #[test]
    fn stats_single_sample() {
        let stats = LatencyStats::compute(&[ms(250)]).unwrap();
        assert_eq!(stats.last, ms(250));
        assert_eq!(stats.mean, ms(250));
        assert_eq!(stats.min, ms(250));
        assert_eq!(stats.diagnosis(), Diagnosis::AllGood);
    }

    #[test]
    fn mean_over_140_vs_min_100_is_getting_hot() {
        assert_eq!(diagnose(ms(140), ms(100)), Diagnosis::GettingHot);
    }

    #[test]
    fn mean_120_vs_min_100_is_all_good() {
        assert_eq!(diagnose(ms(120), ms(100)), Diagnosis::AllGood);
    }

    #[test]
    fn mean_exactly_at_threshold_is_all_good() {
        assert_eq!(diagnose(ms(130), ms(100)), Diagnosis::AllGood);
        assert_eq!(
            diagnose(Duration::from_nanos(13), Duration::from_nanos(10)),
            Diagnosis::AllGood
        );
        assert_eq!(diagnose(ms(131), ms(100)), Diagnosis::GettingHot);
    }

    #[test]
    fn mean_uses_newest_ten_and_min_uses_all() {
        // 15 samples newest first: ten at 140ms, then five older at 100ms.
        let mut samples = vec![ms(140); 10];
        samples.extend(vec![ms(100); 5]);

        let stats = LatencyStats::compute(&samples).unwrap();
        assert_eq!(stats.mean, ms(140));
        assert_eq!(stats.min, ms(100));
        assert_eq!(stats.count, 15);
        assert_eq!(stats.diagnosis(), Diagnosis::GettingHot);
    }

    #[tokio::test]
    async fn empty_store_has_no_snapshot() {
        let (engine, _, _) = engine(false);
        assert!(engine.snapshot().await.is_none());
    }

    #[tokio::test]
    async fn snapshot_windows_by_id_order() {
        let (engine, store, _) = engine(true);
        // Oldest five (ids 1..=5) are fast, newest ten (ids 6..=15) slow.
        for id in 1..=15u64 {
            let latency = if id <= 5 { 100 } else { 140 };
            store.upsert(event(id, latency)).await;
        }

        let snap = engine.snapshot().await.unwrap();
        assert_eq!(snap.sample_count, 15);
        assert_eq!(snap.last_latency, ms(140));
        assert_eq!(snap.mean_latency, ms(140));
        assert_eq!(snap.min_latency, ms(100));
        assert_eq!(snap.diagnosis, Diagnosis::GettingHot);
        assert!(snap.load_active);
        assert_eq!(snap.status, PollStatus::Ok);
    }

    #[tokio::test]
    async fn slow_old_events_fall_out_of_window() {
        let (engine, store, _) = engine(false);
        // Oldest five slow, newest ten at 120ms against a 100ms best.
        for id in 1..=15u64 {
            let latency = match id {
                1..=5 => 500,
                6 => 100,
                _ => 122,
            };
            store.upsert(event(id, latency)).await;
        }

        let snap = engine.snapshot().await.unwrap();
        // (100 + 9 * 122) / 10 = 119.8ms
        assert_eq!(snap.mean_latency, Duration::from_micros(119_800));
        assert_eq!(snap.min_latency, ms(100));
        assert_eq!(snap.diagnosis, Diagnosis::AllGood);
        assert!(!snap.load_active);
    }

    #[tokio::test]
    async fn last_latency_is_highest_id() {
        let (engine, store, _) = engine(false);
        store.upsert(event(3, 300)).await;
        store.upsert(event(10, 150)).await;
        store.upsert(event(7, 200)).await;

        let snap = engine.snapshot().await.unwrap();
        assert_eq!(snap.last_latency, ms(150));
    }

    #[tokio::test]
    async fn status_reflects_last_poll() {
        let (engine, store, poll) = engine(false);
        store.upsert(event(1, 100)).await;
        poll.record_error("docker unreachable").await;

        let snap = engine.snapshot().await.unwrap();
        assert_eq!(snap.status, PollStatus::Error);
        // Diagnosis is independent of the poll status.
        assert_eq!(snap.diagnosis, Diagnosis::AllGood);
    }

    #[tokio::test]
    async fn snapshot_does_not_mutate_store() {
        let (engine, store, _) = engine(false);
        store.upsert(event(1, 100)).await;
        engine.snapshot().await;
        engine.snapshot().await;
        assert_eq!(store.len().await, 1);
    }
}
