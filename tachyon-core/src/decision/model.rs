//! Fixed linear scorer
//!
//! Two inputs (signed imbalance, log activity), three outputs
//! (`[buy, hold, sell]`) normalised with a softmax. Weights are constants,
//! so the same features always score identically.

use super::features::FeatureVector;

/// Rows: buy, hold, sell. Columns: imbalance, ln(1 + total intensity)
pub const DEFAULT_WEIGHTS: [[f64; 2]; 3] = [[3.0, 0.25], [0.0, 0.0], [-3.0, 0.25]];

pub const DEFAULT_BIAS: [f64; 3] = [0.0, 0.5, 0.0];

/// Softmax output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scores {
    pub buy: f64,
    pub hold: f64,
    pub sell: f64,
}

impl Scores {
    /// Signed conviction in `[-1, 1]`: positive leans buy
    #[inline(always)]
    pub fn strength(&self) -> f64 {
        self.buy - self.sell
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StaticModel {
    weights: [[f64; 2]; 3],
    bias: [f64; 3],
}

impl StaticModel {
    pub const fn new(weights: [[f64; 2]; 3], bias: [f64; 3]) -> Self {
        Self { weights, bias }
    }

    #[inline]
    pub fn infer(&self, features: &FeatureVector) -> Scores {
        let x = [features.imbalance, features.total_intensity.max(0.0).ln_1p()];

        let mut logits = [0.0f64; 3];
        for (row, logit) in logits.iter_mut().enumerate() {
            *logit = self.bias[row] + self.weights[row][0] * x[0] + self.weights[row][1] * x[1];
        }

        // shift by the max logit so exp never overflows
        let max = logits.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let exps = logits.map(|l| (l - max).exp());
        let sum: f64 = exps.iter().sum();

        Scores {
            buy: exps[0] / sum,
            hold: exps[1] / sum,
            sell: exps[2] / sum,
        }
    }
}

impl Default for StaticModel {
    fn default() -> Self {
        Self::new(DEFAULT_WEIGHTS, DEFAULT_BIAS)
    }
}
