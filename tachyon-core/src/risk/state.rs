//! Process-wide risk state
//!
//! Shared through `Arc` and mutated only with atomics:
//! - `position`: signed net position, updated by the gate's CAS loop
//! - `regime_word`: regime tag and limit multiplier packed into one `u64`,
//!   so a regime change is a single atomic store
//! - `limit`: absolute position limit before the multiplier
//!
//! ```text
//! regime_word = [ regime tag : 8 bits | multiplier × 1e6 : 56 bits ]
//! ```

use super::types::{Regime, RiskSnapshot};
use crate::config::{RegimeTable, RiskConfig};
use crate::core::Decision;
use crossbeam_utils::CachePadded;
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};

/// Fixed-point scale of the packed multiplier
pub const MULTIPLIER_SCALE: u64 = 1_000_000;

const REGIME_SHIFT: u32 = 56;
const MULTIPLIER_MASK: u64 = (1 << REGIME_SHIFT) - 1;

#[inline(always)]
pub(crate) const fn pack_regime(regime: Regime, multiplier_micros: u64) -> u64 {
    ((regime as u64) << REGIME_SHIFT) | (multiplier_micros & MULTIPLIER_MASK)
}

#[inline(always)]
pub(crate) const fn unpack_regime(word: u64) -> (Regime, u64) {
    (
        Regime::from_u8((word >> REGIME_SHIFT) as u8),
        word & MULTIPLIER_MASK,
    )
}

/// `floor(limit * multiplier)` in exact integer arithmetic
#[inline(always)]
pub(crate) fn effective_limit(limit: i64, multiplier_micros: u64) -> i64 {
    let scaled = (limit.max(0) as i128 * multiplier_micros as i128) / MULTIPLIER_SCALE as i128;
    scaled.min(i64::MAX as i128) as i64
}

#[inline]
fn multiplier_to_micros(multiplier: f64) -> u64 {
    if multiplier.is_nan() {
        return 0;
    }
    (multiplier.clamp(0.0, 1.0) * MULTIPLIER_SCALE as f64).round() as u64
}

pub struct RiskState {
    pub(crate) position: CachePadded<AtomicI64>,
    pub(crate) regime_word: CachePadded<AtomicU64>,
    pub(crate) limit: CachePadded<AtomicI64>,
    regimes: RegimeTable,
}

impl RiskState {
    /// Flat position, `Normal` regime, multiplier 1.0
    pub fn new(limit: i64, regimes: RegimeTable) -> Self {
        Self {
            position: CachePadded::new(AtomicI64::new(0)),
            regime_word: CachePadded::new(AtomicU64::new(pack_regime(Regime::Normal, MULTIPLIER_SCALE))),
            limit: CachePadded::new(AtomicI64::new(limit.max(0))),
            regimes,
        }
    }

    pub fn from_config(config: &RiskConfig) -> Self {
        Self::new(config.position_limit, config.regimes)
    }

    #[inline(always)]
    pub fn position(&self) -> i64 {
        self.position.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn limit(&self) -> i64 {
        self.limit.load(Ordering::Acquire)
    }

    #[inline(always)]
    pub fn regime(&self) -> Regime {
        unpack_regime(self.regime_word.load(Ordering::Acquire)).0
    }

    pub fn multiplier(&self) -> f64 {
        let (_, micros) = unpack_regime(self.regime_word.load(Ordering::Acquire));
        micros as f64 / MULTIPLIER_SCALE as f64
    }

    /// `floor(limit * multiplier)`, 0 when halted
    #[inline]
    pub fn effective_limit(&self) -> i64 {
        let (regime, micros) = unpack_regime(self.regime_word.load(Ordering::Acquire));
        if regime == Regime::Halted {
            return 0;
        }
        effective_limit(self.limit(), micros)
    }

    /// Switch regime and multiplier in one atomic store
    ///
    /// The multiplier is clamped to `[0, 1]` and kept to six decimals.
    pub fn set_regime(&self, regime: Regime, multiplier: f64) {
        let word = pack_regime(regime, multiplier_to_micros(multiplier));
        self.regime_word.store(word, Ordering::Release);
    }

    /// Kill switch
    pub fn halt(&self) {
        self.set_regime(Regime::Halted, 0.0);
    }

    /// Map a volatility index onto the regime table and apply it
    ///
    /// NaN or negative readings halt trading.
    pub fn apply_volatility(&self, volatility_index: f64) -> Regime {
        let t = &self.regimes;
        let (regime, multiplier) = if volatility_index.is_nan() || volatility_index < 0.0 {
            (Regime::Halted, 0.0)
        } else if volatility_index < t.normal_max {
            (Regime::Normal, 1.0)
        } else if volatility_index < t.elevated_max {
            (Regime::Elevated, t.elevated_multiplier)
        } else if volatility_index < t.stress_max {
            (Regime::Elevated, t.stress_multiplier)
        } else {
            (Regime::Halted, 0.0)
        };

        let previous = self.regime();
        self.set_regime(regime, multiplier);
        if previous != regime {
            tracing::info!(
                "Regime {} -> {} (volatility index {:.3}, multiplier {})",
                previous,
                regime,
                volatility_index,
                multiplier
            );
        }
        regime
    }

    /// Replace the absolute limit (negative values clamp to 0)
    pub fn set_limit(&self, limit: i64) {
        self.limit.store(limit.max(0), Ordering::Release);
    }

    pub fn snapshot(&self) -> RiskSnapshot {
        let (regime, micros) = unpack_regime(self.regime_word.load(Ordering::Acquire));
        let limit = self.limit();
        RiskSnapshot {
            position: self.position(),
            limit,
            regime,
            multiplier: micros as f64 / MULTIPLIER_SCALE as f64,
            effective_limit: if regime == Regime::Halted {
                0
            } else {
                effective_limit(limit, micros)
            },
        }
    }

    /// Scale a base quote size by the remaining capacity
    ///
    /// `base * (max - |pos|) / max`, 0 when no capacity is left.
    pub fn safe_quote_size(&self, base_size: u64) -> u64 {
        let max = self.effective_limit();
        let used = self.position().unsigned_abs().min(i64::MAX as u64) as i64;
        let available = max - used;
        if max <= 0 || available <= 0 {
            return 0;
        }
        ((base_size as u128 * available as u128) / max as u128) as u64
    }

    /// Shrink an actionable decision to the remaining capacity
    ///
    /// Size becomes `safe_quote_size(size)`, never below 1, so a decision at
    /// a full limit still reaches the gate and is rejected there.
    #[inline]
    pub fn fit_to_capacity(&self, mut decision: Decision) -> Decision {
        if decision.is_actionable() {
            decision.size = decision.size.min(self.safe_quote_size(decision.size).max(1));
        }
        decision
    }

    /// Quantity to unwind once the position passes 80% of the limit
    ///
    /// Returns the excess over 50% of the limit, signed like the position,
    /// or 0 while under the 80% mark.
    pub fn unwind_recommendation(&self) -> i64 {
        let max = self.effective_limit() as i128;
        let position = self.position() as i128;
        let abs = position.abs();

        if abs * 10 > max * 8 {
            let excess = abs - max / 2;
            let signed = if position > 0 { excess } else { -excess };
            signed.clamp(i64::MIN as i128, i64::MAX as i128) as i64
        } else {
            0
        }
    }

    /// Overwrite the position (replay reset, reconciliation)
    pub fn reset_position(&self, position: i64) {
        self.position.store(position, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state(limit: i64) -> RiskState {
        RiskState::new(limit, RegimeTable::default())
    }

    #[test]
    fn test_pack_unpack() {
        let word = pack_regime(Regime::Elevated, 700_000);
        assert_eq!(unpack_regime(word), (Regime::Elevated, 700_000));
    }

    #[test]
    fn test_effective_limit_floors() {
        let s = state(10);
        s.set_regime(Regime::Elevated, 0.75);
        assert_eq!(s.effective_limit(), 7);
        assert_eq!(effective_limit(i64::MAX, MULTIPLIER_SCALE), i64::MAX);
    }

    #[test]
    fn test_regime_table() {
        let s = state(1_000);
        assert_eq!(s.apply_volatility(0.1), Regime::Normal);
        assert_eq!(s.effective_limit(), 1_000);

        assert_eq!(s.apply_volatility(0.7), Regime::Elevated);
        assert_eq!(s.effective_limit(), 700);

        assert_eq!(s.apply_volatility(1.5), Regime::Elevated);
        assert_eq!(s.effective_limit(), 400);

        assert_eq!(s.apply_volatility(2.5), Regime::Halted);
        assert_eq!(s.effective_limit(), 0);

        assert_eq!(s.apply_volatility(f64::NAN), Regime::Halted);
    }

    #[test]
    fn test_multiplier_clamped() {
        let s = state(100);
        s.set_regime(Regime::Normal, 3.0);
        assert_eq!(s.multiplier(), 1.0);
        s.set_regime(Regime::Normal, -1.0);
        assert_eq!(s.multiplier(), 0.0);
    }

    #[test]
    fn test_safe_quote_size() {
        let s = state(100);
        assert_eq!(s.safe_quote_size(10), 10);
        s.reset_position(-75);
        assert_eq!(s.safe_quote_size(10), 2);
        s.reset_position(100);
        assert_eq!(s.safe_quote_size(10), 0);
        s.halt();
        s.reset_position(0);
        assert_eq!(s.safe_quote_size(10), 0);
    }

    #[test]
    fn test_fit_to_capacity() {
        use crate::core::Side;
        let s = state(100);
        let buy = Decision {
            timestamp_ns: 1,
            side: Side::Buy,
            price: 100.0,
            size: 10,
            signal_strength: 0.8,
        };

        assert_eq!(s.fit_to_capacity(buy).size, 10);
        s.reset_position(80);
        assert_eq!(s.fit_to_capacity(buy).size, 2);
        s.reset_position(100);
        assert_eq!(s.fit_to_capacity(buy).size, 1);

        let hold = Decision::hold(1, 0.0);
        assert_eq!(s.fit_to_capacity(hold).size, 0);
    }

    #[test]
    fn test_unwind_recommendation() {
        let s = state(100);
        s.reset_position(80);
        assert_eq!(s.unwind_recommendation(), 0);
        s.reset_position(90);
        assert_eq!(s.unwind_recommendation(), 40);
        s.reset_position(-95);
        assert_eq!(s.unwind_recommendation(), -45);
    }

    #[test]
    fn test_snapshot() {
        let s = state(50);
        s.set_limit(-3);
        let snap = s.snapshot();
        assert_eq!(snap.limit, 0);
        assert_eq!(snap.regime, Regime::Normal);
        assert_eq!(snap.effective_limit, 0);
    }
}
