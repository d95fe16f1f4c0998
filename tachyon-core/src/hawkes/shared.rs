//! Lock-free publication of the latest intensity state
//!
//! One writer (the intensity stage) and any number of readers. Each field is
//! an `AtomicU64` holding f64 bits; a version counter brackets every write so
//! readers retry instead of observing a torn snapshot.

use super::kernel::IntensityState;
use std::sync::atomic::{fence, AtomicU64, Ordering};

#[repr(C, align(64))]
pub struct SharedIntensity {
    /// Odd while a write is in progress
    version: AtomicU64,
    buy_bits: AtomicU64,
    sell_bits: AtomicU64,
    last_update_ns: AtomicU64,
}

impl SharedIntensity {
    pub const fn new() -> Self {
        Self {
            version: AtomicU64::new(0),
            buy_bits: AtomicU64::new(0),
            sell_bits: AtomicU64::new(0),
            last_update_ns: AtomicU64::new(0),
        }
    }

    /// Publish a new state (single writer only)
    #[inline]
    pub fn store(&self, state: &IntensityState) {
        let v = self.version.load(Ordering::Relaxed);
        self.version.store(v.wrapping_add(1), Ordering::Relaxed);
        fence(Ordering::Release);

        self.buy_bits.store(state.buy_intensity.to_bits(), Ordering::Relaxed);
        self.sell_bits.store(state.sell_intensity.to_bits(), Ordering::Relaxed);
        self.last_update_ns.store(state.last_update_ns, Ordering::Relaxed);

        self.version.store(v.wrapping_add(2), Ordering::Release);
    }

    /// Read a consistent snapshot
    #[inline]
    pub fn load(&self) -> IntensityState {
        loop {
            let before = self.version.load(Ordering::Acquire);
            if before & 1 == 1 {
                std::hint::spin_loop();
                continue;
            }

            let state = IntensityState {
                buy_intensity: f64::from_bits(self.buy_bits.load(Ordering::Relaxed)),
                sell_intensity: f64::from_bits(self.sell_bits.load(Ordering::Relaxed)),
                last_update_ns: self.last_update_ns.load(Ordering::Relaxed),
            };

            fence(Ordering::Acquire);
            if self.version.load(Ordering::Relaxed) == before {
                return state;
            }
        }
    }

    /// Number of completed publications
    pub fn publications(&self) -> u64 {
        self.version.load(Ordering::Acquire) / 2
    }
}

impl Default for SharedIntensity {
    fn default() -> Self {
        Self::new()
    }
}
