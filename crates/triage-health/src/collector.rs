//! Collector — background task that polls the probe source and merges
//! newly observed health events into the store.
//!
//! The collector is the only writer of the store and of the poll status.
//! It runs until its shutdown signal flips, which is honored between
//! ticks; a poll in flight always completes first.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use triage_state::{HealthEventStore, PollState};

use crate::error::ProbeError;
use crate::source::ProbeSource;

/// How often the probe source is polled.
pub const POLL_INTERVAL: Duration = Duration::from_secs(2);

pub struct Collector {
    source: Arc<dyn ProbeSource>,
    store: HealthEventStore,
    poll: PollState,
    interval: Duration,
}

impl Collector {
    pub fn new(source: Arc<dyn ProbeSource>, store: HealthEventStore, poll: PollState) -> Self {
        Self {
            source,
            store,
            poll,
            interval: POLL_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run a single poll. Returns how many previously unseen events were
    /// stored.
    ///
    /// On failure the poll status becomes `Error` and the store is left
    /// untouched.
    pub async fn poll_once(&self) -> Result<usize, ProbeError> {
        let events = match self.source.health_events().await {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "failed to fetch health events");
                self.poll.record_error(e.to_string()).await;
                return Err(e);
            }
        };
        self.poll.record_ok().await;

        let mut added = 0;
        for event in events {
            let (id, latency, exit_code) = (event.id.clone(), event.latency(), event.exit_code);
            if self.store.upsert(event).await {
                debug!(%id, latency_ms = latency.as_millis() as u64, exit_code, "new health event");
                added += 1;
            }
        }
        Ok(added)
    }

    /// Poll on every tick until `shutdown` flips to `true`.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(interval_ms = self.interval.as_millis() as u64, "health collector started");

        let mut ticker = tokio::time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            if *shutdown.borrow() {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    // Failures are recorded in the poll status.
                    let _ = self.poll_once().await;
                }
                _ = shutdown.changed() => {
                    debug!("health collector received shutdown");
                    break;
                }
            }
        }

        info!("health collector stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use chrono::{TimeZone, Utc};
    use triage_state::{HealthEvent, PollStatus};

    use crate::source::ProbeFuture;

    /// Replays a fixed sequence of poll results, then keeps returning the
    /// last successful list.
    struct ScriptedSource {
        script: Mutex<VecDeque<Result<Vec<HealthEvent>, ProbeError>>>,
        calls: Mutex<usize>,
    }

    impl ScriptedSource {
        fn new(script: Vec<Result<Vec<HealthEvent>, ProbeError>>) -> Arc<Self> {
            Arc::new(Self {
                script: Mutex::new(script.into()),
                calls: Mutex::new(0),
            })
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    impl ProbeSource for ScriptedSource {
        fn health_events(&self) -> ProbeFuture<'_> {
            *self.calls.lock().unwrap() += 1;
            let next = self.script.lock().unwrap().pop_front().unwrap_or(Ok(Vec::new()));
            Box::pin(async move { next })
        }
    }

    fn event(id: &str, latency_ms: i64) -> HealthEvent {
        let start = Utc.timestamp_millis_opt(1_000).unwrap();
        let end = Utc.timestamp_millis_opt(1_000 + latency_ms).unwrap();
        HealthEvent::new(id, start, end, 0)
    }

    fn not_ready() -> ProbeError {
        ProbeError::NotReady("unhealthy".to_string())
    }

    fn collector(source: Arc<ScriptedSource>) -> (Collector, HealthEventStore, PollState) {
        let store = HealthEventStore::new();
        let poll = PollState::new();
        let collector = Collector::new(source, store.clone(), poll.clone());
        (collector, store, poll)
    }

    #[tokio::test]
    async fn merges_new_events() {
        let source = ScriptedSource::new(vec![Ok(vec![event("1", 100), event("2", 110)])]);
        let (collector, store, poll) = collector(source);

        assert_eq!(collector.poll_once().await.unwrap(), 2);
        assert_eq!(store.len().await, 2);
        assert_eq!(poll.status().await, PollStatus::Ok);
    }

    #[tokio::test]
    async fn repeated_history_is_not_double_counted() {
        let source = ScriptedSource::new(vec![
            Ok(vec![event("1", 100), event("2", 110)]),
            Ok(vec![event("2", 999), event("3", 120)]),
        ]);
        let (collector, store, _) = collector(source);

        collector.poll_once().await.unwrap();
        assert_eq!(collector.poll_once().await.unwrap(), 1);

        let events = store.snapshot().await;
        assert_eq!(events.len(), 3);
        let second = events.iter().find(|e| e.id == "2").unwrap();
        assert_eq!(second.latency(), Duration::from_millis(110));
    }

    #[tokio::test]
    async fn failure_keeps_events_and_marks_error() {
        let source = ScriptedSource::new(vec![Ok(vec![event("1", 100)]), Err(not_ready())]);
        let (collector, store, poll) = collector(source);

        collector.poll_once().await.unwrap();
        assert!(collector.poll_once().await.is_err());

        assert_eq!(store.len().await, 1);
        assert_eq!(poll.status().await, PollStatus::Error);
        assert!(poll.last_error().await.unwrap().contains("not yet active"));
    }

    #[tokio::test]
    async fn success_after_failure_clears_error() {
        let source = ScriptedSource::new(vec![Err(not_ready()), Ok(vec![event("1", 100)])]);
        let (collector, _, poll) = collector(source);

        let _ = collector.poll_once().await;
        assert_eq!(poll.status().await, PollStatus::Error);

        collector.poll_once().await.unwrap();
        assert_eq!(poll.status().await, PollStatus::Ok);
    }

    #[tokio::test]
    async fn run_polls_until_shutdown() {
        let source = ScriptedSource::new(vec![
            Ok(vec![event("1", 100)]),
            Err(not_ready()),
            Ok(vec![event("1", 100), event("2", 120)]),
        ]);
        let (collector, store, _) = collector(source.clone());
        let collector = Arc::new(collector.with_interval(Duration::from_millis(10)));

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = {
            let collector = collector.clone();
            tokio::spawn(async move { collector.run(shutdown_rx).await })
        };

        tokio::time::sleep(Duration::from_millis(200)).await;
        shutdown_tx.send(true).unwrap();
        task.await.unwrap();

        assert!(source.calls() >= 3);
        assert_eq!(store.len().await, 2);

        // No polls after the loop has exited.
        let calls = source.calls();
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(source.calls(), calls);
    }

    #[tokio::test]
    async fn run_exits_immediately_when_already_shut_down() {
        let source = ScriptedSource::new(vec![]);
        let (collector, _, _) = collector(source.clone());

        let (_tx, rx) = watch::channel(true);
        collector.run(rx).await;
        assert_eq!(source.calls(), 0);
    }
}
