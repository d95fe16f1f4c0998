//! Monotonic clock abstraction
//!
//! The decision stage measures its fixed latency floor against a `Clock` so
//! tests and replay can substitute a deterministic clock for the real one.

use std::cell::Cell;
use std::time::Instant;

/// Source of monotonic nanoseconds
pub trait Clock {
    /// Nanoseconds since an arbitrary fixed origin. Never decreases.
    fn now_ns(&self) -> u64;
}

/// Real monotonic clock anchored at construction time
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline(always)]
    fn now_ns(&self) -> u64 {
        // u64 nanoseconds cover ~584 years of uptime
        self.origin.elapsed().as_nanos() as u64
    }
}

/// Deterministic clock that advances by `step_ns` on every read
///
/// Busy-wait loops driven by this clock terminate after exactly
/// `ceil(floor / step)` reads, independent of the host machine.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Cell<u64>,
    step_ns: u64,
}

impl ManualClock {
    pub fn new(start_ns: u64, step_ns: u64) -> Self {
        Self {
            now: Cell::new(start_ns),
            step_ns,
        }
    }

    /// Jump the clock forward (never backward)
    pub fn set(&self, now_ns: u64) {
        if now_ns > self.now.get() {
            self.now.set(now_ns);
        }
    }

    /// Current value without advancing
    pub fn peek(&self) -> u64 {
        self.now.get()
    }
}

impl Clock for ManualClock {
    #[inline]
    fn now_ns(&self) -> u64 {
        let now = self.now.get();
        self.now.set(now.saturating_add(self.step_ns));
        now
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    #[inline(always)]
    fn now_ns(&self) -> u64 {
        (**self).now_ns()
    }
}
