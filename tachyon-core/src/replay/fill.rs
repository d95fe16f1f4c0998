//! Seeded fill simulation
//!
//! Every accepted order fills in full. The RNG only decides when (ack
//! latency) and at what price (adverse slippage).

use crate::config::FillModelConfig;
use crate::core::{Order, Side};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::fmt;

/// Stream id separating fill draws from the synthetic source's draws
const FILL_STREAM: u64 = 1;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulatedFill {
    pub order_id: u64,
    pub sequence_id: u64,
    pub fill_time_ns: u64,
    pub side: Side,
    pub price: f64,
    pub size: u64,
    pub latency_ns: u64,
    pub slippage_bps: f64,
}

impl SimulatedFill {
    /// Cash change: buys pay, sells receive
    pub fn notional(&self) -> f64 {
        -(self.side.sign() as f64) * self.price * self.size as f64
    }
}

impl fmt::Display for SimulatedFill {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} {} px={} sz={} lat={} slip_bps={}",
            self.order_id, self.side, self.price, self.size, self.latency_ns, self.slippage_bps
        )
    }
}

pub struct FillSimulator {
    rng: ChaCha8Rng,
    config: FillModelConfig,
    fills: u64,
}

impl FillSimulator {
    pub fn new(seed: u64, config: FillModelConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        rng.set_stream(FILL_STREAM);
        Self { rng, config, fills: 0 }
    }

    /// Draw latency and slippage for an order acknowledged at `now_ns`
    pub fn simulate(&mut self, order: &Order, now_ns: u64) -> SimulatedFill {
        let jitter = if self.config.latency_jitter_ns > 0 {
            self.rng.gen_range(0..=self.config.latency_jitter_ns)
        } else {
            0
        };
        let latency_ns = self.config.base_latency_ns.saturating_add(jitter);

        let slippage_bps = if self.config.max_slippage_bps > 0.0 {
            self.rng.gen_range(0.0..=self.config.max_slippage_bps)
        } else {
            0.0
        };
        // slippage always moves against us
        let price = order.price * (1.0 + order.side.sign() as f64 * slippage_bps / 10_000.0);

        self.fills += 1;
        SimulatedFill {
            order_id: order.order_id,
            sequence_id: order.sequence_id,
            fill_time_ns: now_ns.saturating_add(latency_ns),
            side: order.side,
            price,
            size: order.size,
            latency_ns,
            slippage_bps,
        }
    }

    pub fn fills(&self) -> u64 {
        self.fills
    }
}
