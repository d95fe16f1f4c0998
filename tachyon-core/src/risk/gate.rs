//! Atomic risk gate
//!
//! One bounded CAS loop per decision:
//!
//! ```text
//! load position
//! loop (≤ max_cas_retries):
//!     load regime word + limit        → Halted? reject
//!     prospective = position + delta   → overflow? reject
//!     |prospective| > floor(limit·m)?  → Breach
//!     compare_exchange_weak(position, prospective)
//!         ok   → Accepted(order)
//!         fail → retry with the observed position
//! Contention
//! ```
//!
//! The check and the position update are one atomic step, so concurrent
//! gates sharing a `RiskState` can never jointly push the position past the
//! effective limit.

use super::state::{effective_limit, unpack_regime, RiskState};
use super::types::{GateOutcome, Regime, RejectReason};
use crate::config::RiskGateConfig;
use crate::core::{Decision, Order};
use crate::perf::CacheAligned;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Per-gate outcome counters, one cache line each
#[derive(Default)]
pub struct GateCounters {
    accepted: CacheAligned<AtomicU64>,
    halted: CacheAligned<AtomicU64>,
    breach: CacheAligned<AtomicU64>,
    contention: CacheAligned<AtomicU64>,
    empty: CacheAligned<AtomicU64>,
    overflow: CacheAligned<AtomicU64>,
    reverted: CacheAligned<AtomicU64>,
}

impl GateCounters {
    #[inline(always)]
    fn record(&self, outcome: &GateOutcome) {
        let counter = match outcome {
            GateOutcome::Accepted(_) => &self.accepted,
            GateOutcome::Rejected(RejectReason::Halted) => &self.halted,
            GateOutcome::Rejected(RejectReason::Breach { .. }) => &self.breach,
            GateOutcome::Rejected(RejectReason::Contention) => &self.contention,
            GateOutcome::Rejected(RejectReason::EmptyDecision) => &self.empty,
            GateOutcome::Rejected(RejectReason::Overflow) => &self.overflow,
        };
        counter.get().fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> GateStats {
        GateStats {
            accepted: self.accepted.get().load(Ordering::Relaxed),
            halted: self.halted.get().load(Ordering::Relaxed),
            breach: self.breach.get().load(Ordering::Relaxed),
            contention: self.contention.get().load(Ordering::Relaxed),
            empty: self.empty.get().load(Ordering::Relaxed),
            overflow: self.overflow.get().load(Ordering::Relaxed),
            reverted: self.reverted.get().load(Ordering::Relaxed),
        }
    }
}

/// Counter values at a point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateStats {
    pub accepted: u64,
    pub halted: u64,
    pub breach: u64,
    pub contention: u64,
    pub empty: u64,
    pub overflow: u64,
    /// Accepted orders later backed out with `revert`
    pub reverted: u64,
}

impl GateStats {
    /// Rejections excluding plain holds
    pub fn rejected(&self) -> u64 {
        self.halted + self.breach + self.contention + self.overflow
    }
}

pub struct RiskGate {
    state: Arc<RiskState>,
    max_cas_retries: u32,
    next_order_id: u64,
    counters: Arc<GateCounters>,
}

impl RiskGate {
    pub fn new(state: Arc<RiskState>, config: RiskGateConfig) -> Self {
        Self {
            state,
            max_cas_retries: config.max_cas_retries.max(1),
            next_order_id: 1,
            counters: Arc::new(GateCounters::default()),
        }
    }

    /// Check a decision against the limit and apply it atomically
    #[inline]
    pub fn check_and_apply(&mut self, decision: &Decision, sequence_id: u64) -> GateOutcome {
        let outcome = match self.try_apply(decision) {
            Ok(()) => {
                let order_id = self.next_order_id;
                self.next_order_id += 1;
                GateOutcome::Accepted(Order {
                    order_id,
                    sequence_id,
                    timestamp_ns: decision.timestamp_ns,
                    side: decision.side,
                    price: decision.price,
                    size: decision.size,
                })
            }
            Err(reason) => GateOutcome::Rejected(reason),
        };

        self.counters.record(&outcome);
        outcome
    }

    #[inline(always)]
    fn try_apply(&self, decision: &Decision) -> Result<(), RejectReason> {
        if !decision.is_actionable() {
            return Err(RejectReason::EmptyDecision);
        }
        let delta = decision.position_delta().ok_or(RejectReason::Overflow)?;

        let mut current = self.state.position.load(Ordering::Acquire);
        for _ in 0..self.max_cas_retries {
            let (regime, micros) = unpack_regime(self.state.regime_word.load(Ordering::Acquire));
            if regime == Regime::Halted {
                return Err(RejectReason::Halted);
            }
            let max = effective_limit(self.state.limit.load(Ordering::Acquire), micros);

            let prospective = current.checked_add(delta).ok_or(RejectReason::Overflow)?;
            let magnitude = prospective.checked_abs().ok_or(RejectReason::Overflow)?;
            if magnitude > max {
                return Err(RejectReason::Breach { prospective, max });
            }

            match self.state.position.compare_exchange_weak(
                current,
                prospective,
                Ordering::AcqRel,
                Ordering::Acquire,
            ) {
                Ok(_) => return Ok(()),
                Err(observed) => {
                    current = observed;
                    std::hint::spin_loop();
                }
            }
        }

        Err(RejectReason::Contention)
    }

    /// Back out an accepted order that could not be carried downstream
    ///
    /// Subtracts the order's delta from the shared position in one atomic
    /// step. Returns false, leaving the position untouched, when the delta
    /// does not fit.
    pub fn revert(&mut self, order: &Order) -> bool {
        let Some(delta) = order.position_delta() else {
            return false;
        };
        let reverted = self
            .state
            .position
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |position| position.checked_sub(delta))
            .is_ok();
        if reverted {
            self.counters.reverted.get().fetch_add(1, Ordering::Relaxed);
        }
        reverted
    }

    pub fn state(&self) -> &Arc<RiskState> {
        &self.state
    }

    /// Shared handle to the counters for metrics readers
    pub fn counters(&self) -> Arc<GateCounters> {
        Arc::clone(&self.counters)
    }

    pub fn stats(&self) -> GateStats {
        self.counters.snapshot()
    }
}
