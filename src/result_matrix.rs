use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::low_score::{LowScoreAdjustment, LowScoreCorrection};

/// Highest goal count modelled per side. Anything above is truncated, not
/// folded back in, so grid totals land slightly under 1.
pub const MAX_GOALS: usize = 10;
pub const GRID_SIZE: usize = MAX_GOALS + 1;

/// Over/under lines exposed as markets, as N for the N.5 line.
pub const GOAL_LINES: [u8; 8] = [0, 1, 2, 3, 4, 5, 6, 7];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Home,
    Away,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Home => f.write_str("home"),
            Side::Away => f.write_str("away"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MatrixError {
    #[error("no recent {0} matches to average over")]
    NoMatches(Side),
    #[error("scoreline {home}-{away} is outside the 0-10 grid")]
    ScoreOutOfRange { home: u32, away: u32 },
}

/// Recent form for both sides: match counts plus cumulative goals over those
/// matches (home side at home, away side away).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormInput {
    pub match_count_home: u32,
    pub match_count_away: u32,
    pub home_scored: u32,
    pub home_conceded: u32,
    pub away_scored: u32,
    pub away_conceded: u32,
}

impl FormInput {
    /// Expected goals for (home, away): each side's attacking rate averaged
    /// with the opponent's conceding rate.
    pub fn lambdas(&self) -> Result<(f64, f64), MatrixError> {
        if self.match_count_home == 0 {
            return Err(MatrixError::NoMatches(Side::Home));
        }
        if self.match_count_away == 0 {
            return Err(MatrixError::NoMatches(Side::Away));
        }
        let n_home = self.match_count_home as f64;
        let n_away = self.match_count_away as f64;

        let home_scored_avg = self.home_scored as f64 / n_home;
        let home_conceded_avg = self.home_conceded as f64 / n_home;
        let away_scored_avg = self.away_scored as f64 / n_away;
        let away_conceded_avg = self.away_conceded as f64 / n_away;

        Ok((
            (home_scored_avg + away_conceded_avg) / 2.0,
            (away_scored_avg + home_conceded_avg) / 2.0,
        ))
    }
}

/// A (home, away) goal pair guaranteed to sit inside the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Scoreline {
    home: u8,
    away: u8,
}

impl Scoreline {
    pub fn new(home: u32, away: u32) -> Result<Self, MatrixError> {
        if home as usize > MAX_GOALS || away as usize > MAX_GOALS {
            return Err(MatrixError::ScoreOutOfRange { home, away });
        }
        Ok(Self {
            home: home as u8,
            away: away as u8,
        })
    }

    pub fn home(&self) -> u8 {
        self.home
    }

    pub fn away(&self) -> u8 {
        self.away
    }

    /// Every grid cell, home-major: 0-0, 0-1, ..., 10-10.
    pub fn all() -> impl Iterator<Item = Scoreline> {
        (0..GRID_SIZE as u8)
            .flat_map(|home| (0..GRID_SIZE as u8).map(move |away| Scoreline { home, away }))
    }
}

impl fmt::Display for Scoreline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.home, self.away)
    }
}

/// Joint scoreline distribution for one fixture. Built once, read-only after.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResultMatrix {
    home_coefficients: [f64; GRID_SIZE],
    away_coefficients: [f64; GRID_SIZE],
    lambda_home: f64,
    lambda_away: f64,
    grid: [[f64; GRID_SIZE]; GRID_SIZE],
}

impl ResultMatrix {
    pub fn new(input: &FormInput) -> Result<Self, MatrixError> {
        Self::with_adjustment(input, &LowScoreCorrection)
    }

    pub fn with_adjustment<A: LowScoreAdjustment>(
        input: &FormInput,
        adjustment: &A,
    ) -> Result<Self, MatrixError> {
        let (lambda_home, lambda_away) = input.lambdas()?;
        let home_coefficients = coefficients(lambda_home);
        let away_coefficients = coefficients(lambda_away);

        let mut grid = [[0.0; GRID_SIZE]; GRID_SIZE];
        for (i, row) in grid.iter_mut().enumerate() {
            for (j, cell) in row.iter_mut().enumerate() {
                *cell = home_coefficients[i]
                    * away_coefficients[j]
                    * adjustment.factor(i, j, lambda_home, lambda_away);
            }
        }

        Ok(Self {
            home_coefficients,
            away_coefficients,
            lambda_home,
            lambda_away,
            grid,
        })
    }

    pub fn lambda_home(&self) -> f64 {
        self.lambda_home
    }

    pub fn lambda_away(&self) -> f64 {
        self.lambda_away
    }

    pub fn home_coefficients(&self) -> &[f64; GRID_SIZE] {
        &self.home_coefficients
    }

    pub fn away_coefficients(&self) -> &[f64; GRID_SIZE] {
        &self.away_coefficients
    }

    pub fn result_probability(&self, score: Scoreline) -> f64 {
        self.grid[score.home as usize][score.away as usize]
    }

    pub fn exact_score(&self, home: u32, away: u32) -> Result<f64, MatrixError> {
        Scoreline::new(home, away).map(|score| self.result_probability(score))
    }

    pub fn cells(&self) -> impl Iterator<Item = (Scoreline, f64)> + '_ {
        Scoreline::all().map(|score| (score, self.result_probability(score)))
    }

    pub fn total_probability(&self) -> f64 {
        self.sum_where(|_, _| true)
    }

    pub fn home_win_probability(&self) -> f64 {
        self.sum_where(|i, j| i > j)
    }

    pub fn draw_probability(&self) -> f64 {
        (0..GRID_SIZE).map(|i| self.grid[i][i]).sum()
    }

    pub fn away_win_probability(&self) -> f64 {
        self.sum_where(|i, j| j > i)
    }

    pub fn home_win_or_draw_probability(&self) -> f64 {
        self.home_win_probability() + self.draw_probability()
    }

    pub fn home_or_away_win_probability(&self) -> f64 {
        self.home_win_probability() + self.away_win_probability()
    }

    pub fn away_win_or_draw_probability(&self) -> f64 {
        self.away_win_probability() + self.draw_probability()
    }

    /// P(total goals <= line), i.e. Under `line`.5.
    pub fn under_goals_probability(&self, line: u8) -> f64 {
        let line = line as usize;
        let mut sum = 0.0;
        for i in 0..=line.min(MAX_GOALS) {
            for j in 0..=(line - i).min(MAX_GOALS) {
                sum += self.grid[i][j];
            }
        }
        sum
    }

    /// P(total goals > line), i.e. Over `line`.5.
    pub fn over_goals_probability(&self, line: u8) -> f64 {
        self.total_probability() - self.under_goals_probability(line)
    }

    /// At least one goal in the match.
    pub fn goal_probability(&self) -> f64 {
        self.total_probability() - self.grid[0][0]
    }

    pub fn no_goal_probability(&self) -> f64 {
        self.grid[0][0]
    }

    pub fn home_goal_probability(&self) -> f64 {
        self.sum_where(|i, _| i >= 1)
    }

    pub fn no_home_goal_probability(&self) -> f64 {
        self.total_probability() - self.home_goal_probability()
    }

    pub fn away_goal_probability(&self) -> f64 {
        self.sum_where(|_, j| j >= 1)
    }

    pub fn no_away_goal_probability(&self) -> f64 {
        self.total_probability() - self.away_goal_probability()
    }

    fn sum_where(&self, keep: impl Fn(usize, usize) -> bool) -> f64 {
        let mut sum = 0.0;
        for (i, row) in self.grid.iter().enumerate() {
            for (j, p) in row.iter().enumerate() {
                if keep(i, j) {
                    sum += p;
                }
            }
        }
        sum
    }
}

fn coefficients(lambda: f64) -> [f64; GRID_SIZE] {
    let mut out = [0.0; GRID_SIZE];
    let base = (-lambda).exp();
    for (k, c) in out.iter_mut().enumerate() {
        *c = lambda.powi(k as i32) * base / factorial(k) as f64;
    }
    out
}

fn factorial(n: usize) -> u64 {
    (2..=n as u64).product()
}
