//! Deduplicating store of observed health events.
//!
//! Events are keyed by id and inserted add-if-absent: the first
//! observation of an id wins and later ones are discarded, so merging the
//! probe source's full history on every poll is safe.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use crate::types::{EventId, HealthEvent};

/// Thread-safe `id → HealthEvent` map. Cloning shares the same map.
#[derive(Clone, Default)]
pub struct HealthEventStore {
    events: Arc<Mutex<HashMap<EventId, HealthEvent>>>,
}

impl HealthEventStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `event` unless its id is already stored.
    ///
    /// Returns `true` when the event was new.
    pub async fn upsert(&self, event: HealthEvent) -> bool {
        let mut events = self.events.lock().await;
        if events.contains_key(&event.id) {
            return false;
        }
        if !event.has_numeric_id() {
            debug!(id = %event.id, "health event id is not a sequence number, ranking it last");
        }
        events.insert(event.id.clone(), event);
        true
    }

    /// All stored events, newest first.
    ///
    /// Newest means highest id read as an integer; ids of equal rank
    /// (including unparseable ones, which rank 0) fall back to descending
    /// string order.
    pub async fn snapshot(&self) -> Vec<HealthEvent> {
        let mut out: Vec<HealthEvent> = {
            let events = self.events.lock().await;
            events.values().cloned().collect()
        };
        out.sort_by(|a, b| b.rank().cmp(&a.rank()).then_with(|| b.id.cmp(&a.id)));
        out
    }

    pub async fn len(&self) -> usize {
        self.events.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.events.lock().await.is_empty()
    }
}
