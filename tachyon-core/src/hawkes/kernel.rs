//! Exponential-kernel Hawkes intensity
//!
//! Per side `I(t) = Σ α·w_i·exp(-λ (t - t_i))` over past events on that side,
//! updated recursively in O(1):
//!
//! ```text
//! I_side ← I_side · exp(-λ Δt) + [side == event.side] · α · w
//! ```
//!
//! `w` is the event size when `size_weighted` is set, 1 otherwise. Cancels
//! excite nothing. With no baseline term every side decays strictly toward
//! zero between events and rises only on a matching event.

use crate::config::IntensityConfig;
use crate::core::{ConfigError, EventKind, MarketEvent, Side};

/// Values below this snap to exactly zero
pub const INTENSITY_FLOOR: f64 = 1e-300;

/// Snapshot of both side intensities
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct IntensityState {
    pub buy_intensity: f64,
    pub sell_intensity: f64,
    pub last_update_ns: u64,
}

impl IntensityState {
    #[inline(always)]
    pub fn total(&self) -> f64 {
        self.buy_intensity + self.sell_intensity
    }

    /// Signed imbalance `(buy - sell) / (buy + sell)`, 0 when both are 0
    #[inline]
    pub fn imbalance(&self) -> f64 {
        let total = self.total();
        if total > 0.0 {
            (self.buy_intensity - self.sell_intensity) / total
        } else {
            0.0
        }
    }
}

/// Single-writer intensity updater
#[derive(Debug, Clone)]
pub struct IntensityEngine {
    /// λ converted to 1/ns
    decay_per_ns: f64,
    excitation: f64,
    size_weighted: bool,
    state: IntensityState,
    events_processed: u64,
}

impl IntensityEngine {
    pub fn new(config: IntensityConfig) -> Result<Self, ConfigError> {
        let decay_per_sec = ConfigError::require_positive("intensity.decay_per_sec", config.decay_per_sec)?;
        if !config.excitation.is_finite() || config.excitation < 0.0 {
            return Err(ConfigError::OutOfRange {
                field: "intensity.excitation",
                reason: format!("must be finite and non-negative (got {})", config.excitation),
            });
        }

        Ok(Self {
            decay_per_ns: decay_per_sec / 1e9,
            excitation: config.excitation,
            size_weighted: config.size_weighted,
            state: IntensityState::default(),
            events_processed: 0,
        })
    }

    /// Decay to `now_ns`, then excite the event's side
    #[inline]
    pub fn update(&mut self, event: &MarketEvent, now_ns: u64) -> IntensityState {
        self.decay_to(now_ns);

        if event.kind != EventKind::Cancel {
            let jump = if self.size_weighted {
                self.excitation * event.size as f64
            } else {
                self.excitation
            };
            match event.side {
                Side::Buy => self.state.buy_intensity += jump,
                Side::Sell => self.state.sell_intensity += jump,
            }
        }

        self.events_processed += 1;
        self.state
    }

    /// Apply pure decay up to `now_ns`
    ///
    /// Timestamps at or before the last update decay by zero and leave the
    /// clock where it is.
    #[inline]
    pub fn decay_to(&mut self, now_ns: u64) -> IntensityState {
        let dt = now_ns.saturating_sub(self.state.last_update_ns);
        if dt > 0 {
            let factor = self.decay_factor(dt);
            self.state.buy_intensity = snap(self.state.buy_intensity * factor);
            self.state.sell_intensity = snap(self.state.sell_intensity * factor);
            self.state.last_update_ns = now_ns;
        }
        self.state
    }

    /// Forecast the state `horizon_ns` ahead without mutating
    pub fn predict(&self, horizon_ns: u64) -> IntensityState {
        let factor = self.decay_factor(horizon_ns);
        IntensityState {
            buy_intensity: snap(self.state.buy_intensity * factor),
            sell_intensity: snap(self.state.sell_intensity * factor),
            last_update_ns: self.state.last_update_ns.saturating_add(horizon_ns),
        }
    }

    #[inline(always)]
    fn decay_factor(&self, dt_ns: u64) -> f64 {
        // argument is never positive, so exp never overflows
        (-self.decay_per_ns * dt_ns as f64).exp()
    }

    #[inline(always)]
    pub fn state(&self) -> IntensityState {
        self.state
    }

    pub fn imbalance(&self) -> f64 {
        self.state.imbalance()
    }

    pub fn events_processed(&self) -> u64 {
        self.events_processed
    }

    /// Back to zero intensity at time zero
    pub fn reset(&mut self) {
        self.state = IntensityState::default();
        self.events_processed = 0;
    }
}

#[inline(always)]
fn snap(value: f64) -> f64 {
    if value < INTENSITY_FLOOR {
        0.0
    } else {
        value
    }
}
