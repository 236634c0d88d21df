/// Multiplier applied to a single cell of the independent-Poisson grid.
///
/// Football scorelines are not independent at the low end (0-0 and 1-1 show up
/// more often than the product of the marginals predicts), so the grid lets a
/// policy reshape those cells. Implementations must be pure.
pub trait LowScoreAdjustment: Copy + Send + Sync {
    fn factor(&self, home_goals: usize, away_goals: usize, lambda_home: f64, lambda_away: f64)
    -> f64;
}

// Empirical tuning, no derivation. Kept as-is so prices match the historic tool.
const LOW_SCORE_WEIGHT: f64 = 0.1;
const ONE_ONE_FACTOR: f64 = 1.1;

/// The default hand-tuned correction on 0-0, 1-0, 0-1 and 1-1.
///
/// While both lambdas are at most 10 the four shifts cancel exactly in total
/// mass, so the grid still sums to the truncated Poisson mass. Above that the
/// 1-0 / 0-1 factors would go negative; they are floored at zero, which adds
/// a little mass back.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct LowScoreCorrection;

impl LowScoreAdjustment for LowScoreCorrection {
    fn factor(
        &self,
        home_goals: usize,
        away_goals: usize,
        lambda_home: f64,
        lambda_away: f64,
    ) -> f64 {
        match (home_goals, away_goals) {
            (0, 0) => 1.0 + lambda_home * lambda_away * LOW_SCORE_WEIGHT,
            (1, 0) => (1.0 - lambda_away * LOW_SCORE_WEIGHT).max(0.0),
            (0, 1) => (1.0 - lambda_home * LOW_SCORE_WEIGHT).max(0.0),
            (1, 1) => ONE_ONE_FACTOR,
            _ => 1.0,
        }
    }
}

/// Plain independent Poisson, no reshaping.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Independent;

impl LowScoreAdjustment for Independent {
    fn factor(&self, _: usize, _: usize, _: f64, _: f64) -> f64 {
        1.0
    }
}
