//! Work-unit calibration.
//!
//! Finds the smallest Fibonacci input whose naive recursive evaluation
//! takes at least a target duration on this machine. The exponential
//! growth of `fib` means each step up in N costs roughly 1.6x more, so the
//! linear search terminates after a few dozen probes.

use std::hint::black_box;
use std::time::{Duration, Instant};

use tracing::{debug, info};

/// Wall-clock cost of one health-check work unit.
pub const CALIBRATION_TARGET: Duration = Duration::from_millis(400);

/// Smallest input where `fib` does any recursion.
const MIN_PROBLEM_SIZE: u32 = 2;

/// A calibrated problem size for [`fib`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkUnit(u32);

impl WorkUnit {
    pub fn new(size: u32) -> Self {
        Self(size)
    }

    pub fn size(&self) -> u32 {
        self.0
    }

    /// Evaluate the reference function once at this size.
    pub fn run(&self) -> u64 {
        black_box(fib(black_box(self.0)))
    }
}

/// Naive exponential-time Fibonacci.
pub fn fib(n: u32) -> u64 {
    if n < 2 {
        return u64::from(n);
    }
    fib(n - 1).wrapping_add(fib(n - 2))
}

/// Size a work unit so one [`WorkUnit::run`] takes at least `target`.
///
/// Never returns if `fib` stops getting slower, which it does not.
pub fn find_work_unit(target: Duration) -> WorkUnit {
    calibrate_with(target, |n| {
        let start = Instant::now();
        black_box(fib(black_box(n)));
        start.elapsed()
    })
}

/// Linear search from the smallest problem size for the first N whose
/// measured cost reaches `target`.
pub fn calibrate_with<F>(target: Duration, mut measure: F) -> WorkUnit
where
    F: FnMut(u32) -> Duration,
{
    let mut n = MIN_PROBLEM_SIZE;
    loop {
        let elapsed = measure(n);
        if elapsed >= target {
            info!(size = n, elapsed_ms = elapsed.as_millis() as u64, "work unit calibrated");
            return WorkUnit(n);
        }
        debug!(size = n, elapsed_us = elapsed.as_micros() as u64, "work unit too small");
        n += 1;
    }
}
