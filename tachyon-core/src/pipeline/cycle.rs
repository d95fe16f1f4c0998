//! Single-threaded trading cycle
//!
//! intensity → features → decision → gate, in that fixed order, for one
//! event. Replay drives this directly; the live pipeline runs the same
//! stages split across threads.
//!
//! With `risk.volatility_halflife > 0` each trade also feeds a volatility
//! index that sets the regime before the decision is gated, and with
//! `risk.scale_to_capacity` the decision is shrunk to the room left under
//! the limit.

use crate::config::PipelineConfig;
use crate::core::{Clock, ConfigError, Decision, EventKind, MarketEvent};
use crate::decision::{DecisionStage, FeatureVector};
use crate::hawkes::{IntensityEngine, IntensityState};
use crate::risk::{GateOutcome, RiskGate, RiskState, VolatilityIndex};
use std::sync::Arc;

/// Everything one event produced, for logging and audit
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleOutput {
    pub state: IntensityState,
    pub features: FeatureVector,
    pub decision: Decision,
    pub outcome: GateOutcome,
    pub decision_latency_ns: u64,
    /// `RiskState::unwind_recommendation` after the gate
    pub unwind: i64,
}

pub struct TradingCycle<C: Clock> {
    intensity: IntensityEngine,
    decision: DecisionStage<C>,
    gate: RiskGate,
    volatility: Option<VolatilityIndex>,
    scale_to_capacity: bool,
}

impl<C: Clock> TradingCycle<C> {
    pub fn new(config: &PipelineConfig, clock: C, risk: Arc<RiskState>) -> Result<Self, ConfigError> {
        Ok(Self {
            intensity: IntensityEngine::new(config.intensity)?,
            decision: DecisionStage::new(config.decision, clock)?,
            gate: RiskGate::new(risk, config.risk.gate),
            volatility: (config.risk.volatility_halflife > 0)
                .then(|| VolatilityIndex::new(config.risk.volatility_halflife)),
            scale_to_capacity: config.risk.scale_to_capacity,
        })
    }

    /// Run one event through every stage
    #[inline]
    pub fn process(&mut self, event: &MarketEvent) -> CycleOutput {
        if let (Some(vol), EventKind::Trade) = (&mut self.volatility, event.kind) {
            self.gate.state().apply_volatility(vol.update(event.price));
        }

        let state = self.intensity.update(event, event.timestamp_ns);
        let features = FeatureVector::from_state(&state, event);
        let mut decision = self.decision.decide(&features, event.timestamp_ns);
        if self.scale_to_capacity {
            decision = self.gate.state().fit_to_capacity(decision);
        }
        let outcome = self.gate.check_and_apply(&decision, event.sequence_id);

        CycleOutput {
            state,
            features,
            decision,
            outcome,
            decision_latency_ns: self.decision.last_latency_ns(),
            unwind: self.gate.state().unwind_recommendation(),
        }
    }

    pub fn intensity(&self) -> &IntensityEngine {
        &self.intensity
    }

    pub fn decision_stage(&self) -> &DecisionStage<C> {
        &self.decision
    }

    pub fn gate(&self) -> &RiskGate {
        &self.gate
    }

    pub fn gate_mut(&mut self) -> &mut RiskGate {
        &mut self.gate
    }

    pub fn volatility(&self) -> Option<f64> {
        self.volatility.map(|v| v.value())
    }
}
