//! CPU burner — a fixed-size pool of busy-loop worker threads.
//!
//! Workers check a shared cancel flag once per burn iteration, so stop
//! latency is proportional to one iteration (`burn_iterations` loop
//! steps), not instantaneous.

use std::hint::black_box;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use tracing::{debug, info, warn};

use triage_state::LoadState;

/// Loop steps per burn iteration between cancellation checks.
pub const DEFAULT_BURN_ITERATIONS: u64 = 1 << 27;

/// The live worker group of a running generator.
struct WorkerGroup {
    cancel: Arc<AtomicBool>,
    handles: Vec<JoinHandle<()>>,
}

/// Decrements the live-worker counter when a worker exits, even by panic.
struct ExitGuard(Arc<AtomicUsize>);

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::AcqRel);
    }
}

/// Idempotent start/stop pool of `num_workers` CPU-burning threads.
pub struct LoadGenerator {
    num_workers: usize,
    burn_iterations: u64,
    /// Serializes start/stop. `Some` iff workers are live.
    group: Mutex<Option<WorkerGroup>>,
    /// Mirrors `group.is_some()` for lock-free readers.
    running: AtomicBool,
    live: Arc<AtomicUsize>,
}

impl LoadGenerator {
    pub fn new(num_workers: usize) -> Self {
        Self::with_burn_iterations(num_workers, DEFAULT_BURN_ITERATIONS)
    }

    /// Create a generator with a custom burn-iteration length (for testing).
    pub fn with_burn_iterations(num_workers: usize, burn_iterations: u64) -> Self {
        Self {
            num_workers,
            burn_iterations,
            group: Mutex::new(None),
            running: AtomicBool::new(false),
            live: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Spawn the worker pool. No-op if already running.
    pub fn start(&self) {
        let mut group = self.lock();
        if group.is_some() {
            info!("already burning");
            return;
        }

        let cancel = Arc::new(AtomicBool::new(false));
        let handles = (0..self.num_workers)
            .map(|id| {
                self.live.fetch_add(1, Ordering::AcqRel);
                let guard = ExitGuard(self.live.clone());
                let cancel = cancel.clone();
                let iterations = self.burn_iterations;
                thread::spawn(move || burn(id, &cancel, iterations, guard))
            })
            .collect();

        *group = Some(WorkerGroup { cancel, handles });
        self.running.store(true, Ordering::Release);
        info!(workers = self.num_workers, "cpu burn started");
    }

    /// Cancel the pool and block until every worker has exited. No-op if
    /// already stopped.
    pub fn stop(&self) {
        let mut group = self.lock();
        let Some(WorkerGroup { cancel, handles }) = group.take() else {
            info!("already stopped");
            return;
        };

        cancel.store(true, Ordering::Release);
        for handle in handles {
            if handle.join().is_err() {
                warn!("cpu burn worker panicked");
            }
        }
        self.running.store(false, Ordering::Release);
        info!(workers = self.num_workers, "cpu burn stopped");
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// Workers spawned and not yet exited.
    pub fn live_workers(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    pub fn num_workers(&self) -> usize {
        self.num_workers
    }

    fn lock(&self) -> MutexGuard<'_, Option<WorkerGroup>> {
        // A panic while holding the lock leaves the group in a consistent
        // state (either fully spawned or fully taken), so poison is ignored.
        self.group.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LoadState for LoadGenerator {
    fn is_active(&self) -> bool {
        self.is_running()
    }
}

impl Drop for LoadGenerator {
    fn drop(&mut self) {
        self.stop();
    }
}

fn burn(id: usize, cancel: &AtomicBool, iterations: u64, _guard: ExitGuard) {
    debug!(worker = id, "starting cpu burn");
    while !cancel.load(Ordering::Acquire) {
        let mut acc = 0u64;
        for i in 0..iterations {
            acc = black_box(acc.wrapping_add(i));
        }
        black_box(acc);
        thread::yield_now();
    }
    debug!(worker = id, "stopping cpu burn");
}
