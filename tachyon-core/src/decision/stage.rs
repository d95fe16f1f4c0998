//! Fixed-latency decision stage
//!
//! Every call to `decide` takes at least `latency_floor_ns` as measured by the
//! stage's clock: inference runs first, then the stage spins on
//! `std::hint::spin_loop` until the floor is reached. The floor models a
//! fixed-latency inference device, so downstream timing never depends on how
//! fast the host happened to score the features.

use super::features::FeatureVector;
use super::model::{Scores, StaticModel};
use crate::config::DecisionConfig;
use crate::core::{Clock, ConfigError, Decision, Side};

pub struct DecisionStage<C: Clock> {
    clock: C,
    model: StaticModel,
    latency_floor_ns: u64,
    threshold: f64,
    edge_bps: f64,
    base_size: u64,
    last_latency_ns: u64,
    decisions: u64,
}

impl<C: Clock> DecisionStage<C> {
    pub fn new(config: DecisionConfig, clock: C) -> Result<Self, ConfigError> {
        if !(0.0..0.5).contains(&config.threshold) {
            return Err(ConfigError::OutOfRange {
                field: "decision.threshold",
                reason: format!("must be in [0, 0.5) (got {})", config.threshold),
            });
        }
        if config.base_size == 0 {
            return Err(ConfigError::OutOfRange {
                field: "decision.base_size",
                reason: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            clock,
            model: StaticModel::default(),
            latency_floor_ns: config.latency_floor_ns,
            threshold: config.threshold,
            edge_bps: config.edge_bps,
            base_size: config.base_size,
            last_latency_ns: 0,
            decisions: 0,
        })
    }

    /// Replace the scoring model
    pub fn with_model(mut self, model: StaticModel) -> Self {
        self.model = model;
        self
    }

    /// Score the features and produce a decision, never faster than the floor
    #[inline]
    pub fn decide(&mut self, features: &FeatureVector, timestamp_ns: u64) -> Decision {
        let entry = self.clock.now_ns();

        let scores = self.model.infer(features);
        let decision = self.apply_rule(features, &scores, timestamp_ns);

        let mut now = self.clock.now_ns();
        while now.saturating_sub(entry) < self.latency_floor_ns {
            std::hint::spin_loop();
            now = self.clock.now_ns();
        }

        self.last_latency_ns = now.saturating_sub(entry);
        self.decisions += 1;
        decision
    }

    #[inline(always)]
    fn apply_rule(&self, features: &FeatureVector, scores: &Scores, timestamp_ns: u64) -> Decision {
        let strength = scores.strength();

        let side = if features.obi >= 0.5 + self.threshold {
            Side::Buy
        } else if features.obi <= 0.5 - self.threshold {
            Side::Sell
        } else {
            return Decision::hold(timestamp_ns, strength);
        };

        let edge = features.reference_price * self.edge_bps / 10_000.0;
        let price = match side {
            Side::Buy => features.reference_price - edge,
            Side::Sell => features.reference_price + edge,
        };

        let scaled = (self.base_size as f64 * strength.abs()).round() as u64;
        let size = scaled.clamp(1, self.base_size);

        Decision {
            timestamp_ns,
            side,
            price,
            size,
            signal_strength: strength,
        }
    }

    /// Wall time spent in the most recent `decide`, per the stage clock
    pub fn last_latency_ns(&self) -> u64 {
        self.last_latency_ns
    }

    pub fn decisions(&self) -> u64 {
        self.decisions
    }

    pub fn latency_floor_ns(&self) -> u64 {
        self.latency_floor_ns
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
