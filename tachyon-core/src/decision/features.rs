//! Feature extraction for the decision stage
//!
//! Turns one `IntensityState` plus the triggering event into the fixed
//! set of inputs the static model reads. Pure and allocation-free.

use crate::core::MarketEvent;
use crate::hawkes::IntensityState;

/// Inputs to the static model, derived from one intensity snapshot
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct FeatureVector {
    /// Order-flow imbalance `buy / (buy + sell)`, 0.5 when flat
    pub obi: f64,
    /// Signed imbalance `(buy - sell) / (buy + sell)`, 0 when flat
    pub imbalance: f64,
    /// `buy + sell`
    pub total_intensity: f64,
    /// Price of the triggering event
    pub reference_price: f64,
}

impl FeatureVector {
    #[inline(always)]
    pub fn from_state(state: &IntensityState, event: &MarketEvent) -> Self {
        let total = state.total();
        let obi = if total > 0.0 {
            state.buy_intensity / total
        } else {
            0.5
        };

        Self {
            obi,
            imbalance: state.imbalance(),
            total_intensity: total,
            reference_price: event.price,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Side;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_book_is_neutral() {
        let f = FeatureVector::from_state(
            &IntensityState::default(),
            &MarketEvent::trade(1, 0, Side::Buy, 100.0, 1),
        );
        assert_eq!(f.obi, 0.5);
        assert_eq!(f.imbalance, 0.0);
        assert_eq!(f.reference_price, 100.0);
    }

    #[test]
    fn test_skewed_book() {
        let state = IntensityState {
            buy_intensity: 3.0,
            sell_intensity: 1.0,
            last_update_ns: 0,
        };
        let f = FeatureVector::from_state(&state, &MarketEvent::trade(1, 0, Side::Sell, 99.5, 1));
        assert_relative_eq!(f.obi, 0.75);
        assert_relative_eq!(f.imbalance, 0.5);
        assert_relative_eq!(f.total_intensity, 4.0);
    }
}
