//! Replay cash/position ledger with mark-to-market equity

use super::SimulatedFill;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ReplayLedger {
    cash: f64,
    position: i64,
    mark_price: f64,
    fills: u64,
    volume: u64,
}

impl ReplayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply_fill(&mut self, fill: &SimulatedFill) {
        self.cash += fill.notional();
        self.position += fill.side.sign() * fill.size as i64;
        self.fills += 1;
        self.volume += fill.size;
    }

    /// Update the mark; non-positive prices are ignored
    pub fn mark(&mut self, price: f64) {
        if price > 0.0 && price.is_finite() {
            self.mark_price = price;
        }
    }

    pub fn cash(&self) -> f64 {
        self.cash
    }

    pub fn position(&self) -> i64 {
        self.position
    }

    pub fn mark_price(&self) -> f64 {
        self.mark_price
    }

    /// cash + position marked at the last price
    pub fn equity(&self) -> f64 {
        self.cash + self.position as f64 * self.mark_price
    }

    pub fn fills(&self) -> u64 {
        self.fills
    }

    pub fn volume(&self) -> u64 {
        self.volume
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use approx::assert_relative_eq;

    fn fill(side: Side, price: f64, size: u64) -> SimulatedFill {
        SimulatedFill {
            order_id: 1,
            sequence_id: 1,
            fill_time_ns: 0,
            side,
            price,
            size,
            latency_ns: 0,
            slippage_bps: 0.0,
        }
    }

    #[test]
    fn test_round_trip_pnl() {
        let mut ledger = ReplayLedger::new();
        ledger.apply_fill(&fill(Side::Buy, 100.0, 10));
        ledger.mark(101.0);
        assert_eq!(ledger.position(), 10);
        assert_relative_eq!(ledger.cash(), -1_000.0);
        assert_relative_eq!(ledger.equity(), 10.0);

        ledger.apply_fill(&fill(Side::Sell, 102.0, 10));
        assert_eq!(ledger.position(), 0);
        assert_relative_eq!(ledger.equity(), 20.0);
        assert_eq!(ledger.fills(), 2);
        assert_eq!(ledger.volume(), 20);
    }

    #[test]
    fn test_short_marks_against() {
        let mut ledger = ReplayLedger::new();
        ledger.apply_fill(&fill(Side::Sell, 50.0, 4));
        ledger.mark(55.0);
        assert_relative_eq!(ledger.equity(), -20.0);

        ledger.mark(0.0);
        assert_eq!(ledger.mark_price(), 55.0);
    }
}
