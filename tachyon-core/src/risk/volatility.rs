//! Realised volatility index
//!
//! EWMA of absolute trade-to-trade log returns, in percent. Its value is
//! what `RiskState::apply_volatility` classifies against the regime table.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolatilityIndex {
    alpha: f64,
    last_price: Option<f64>,
    value: f64,
}

impl VolatilityIndex {
    /// `halflife` in trades; 0 is treated as 1
    pub fn new(halflife: u32) -> Self {
        let halflife = halflife.max(1) as f64;
        Self {
            alpha: 1.0 - 0.5f64.powf(1.0 / halflife),
            last_price: None,
            value: 0.0,
        }
    }

    /// Fold in a trade price and return the updated index
    ///
    /// Non-positive or non-finite prices are ignored.
    #[inline]
    pub fn update(&mut self, price: f64) -> f64 {
        if !(price.is_finite() && price > 0.0) {
            return self.value;
        }
        if let Some(last) = self.last_price {
            let ret = (price / last).ln().abs() * 100.0;
            self.value += self.alpha * (ret - self.value);
        }
        self.last_price = Some(price);
        self.value
    }

    pub fn value(&self) -> f64 {
        self.value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_flat_prices_stay_calm() {
        let mut v = VolatilityIndex::new(10);
        for _ in 0..100 {
            v.update(100.0);
        }
        assert_eq!(v.value(), 0.0);
    }

    #[test]
    fn test_halflife_one_tracks_last_return() {
        let mut v = VolatilityIndex::new(1);
        v.update(100.0);
        // alpha = 0.5
        assert_relative_eq!(v.update(110.0), 0.5 * (1.1f64).ln() * 100.0, epsilon = 1e-12);
    }

    #[test]
    fn test_ignores_bad_prices() {
        let mut v = VolatilityIndex::new(1);
        v.update(100.0);
        assert_eq!(v.update(f64::NAN), 0.0);
        assert_eq!(v.update(0.0), 0.0);
        assert_eq!(v.update(100.0), 0.0);
    }
}
