use serde::{Deserialize, Serialize};

/// Fair decimal odds: the bare reciprocal, no margin. Infinite for `p == 0`;
/// use [`fair_odds`] when the result is shown to anyone.
pub fn as_odds(probability: f64) -> f64 {
    1.0 / probability
}

/// Reciprocal odds, or `None` when the probability leaves nothing to price.
pub fn fair_odds(probability: f64) -> Option<f64> {
    if probability > 0.0 && probability.is_finite() {
        Some(as_odds(probability))
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceQuote {
    pub probability: f64,
    // `null` on the wire when there is no fair price.
    pub odds: Option<f64>,
}

impl PriceQuote {
    pub fn from_probability(probability: f64) -> Self {
        Self {
            probability,
            odds: fair_odds(probability),
        }
    }
}
