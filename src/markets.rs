use std::collections::BTreeMap;
use std::fmt;

use rayon::prelude::*;
use serde::ser::{SerializeMap, Serializer};
use serde::Serialize;

use crate::odds::PriceQuote;
use crate::result_matrix::{FormInput, GOAL_LINES, MatrixError, ResultMatrix, Scoreline};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Market {
    HomeWin,
    Draw,
    AwayWin,
    HomeWinOrDraw,
    HomeOrAwayWin,
    AwayWinOrDraw,
    Over(u8),
    Under(u8),
    Goal,
    NoGoal,
    HomeGoal,
    NoHomeGoal,
    AwayGoal,
    NoAwayGoal,
}

impl Market {
    /// Every priced market, in response order.
    pub fn catalogue() -> Vec<Market> {
        let mut out = vec![
            Market::HomeWin,
            Market::Draw,
            Market::AwayWin,
            Market::HomeWinOrDraw,
            Market::HomeOrAwayWin,
            Market::AwayWinOrDraw,
        ];
        for line in GOAL_LINES {
            out.push(Market::Over(line));
            out.push(Market::Under(line));
        }
        out.extend([
            Market::Goal,
            Market::NoGoal,
            Market::HomeGoal,
            Market::NoHomeGoal,
            Market::AwayGoal,
            Market::NoAwayGoal,
        ]);
        out
    }

    pub fn label(&self) -> String {
        match self {
            Market::HomeWin => "1".to_string(),
            Market::Draw => "X".to_string(),
            Market::AwayWin => "2".to_string(),
            Market::HomeWinOrDraw => "1X".to_string(),
            Market::HomeOrAwayWin => "12".to_string(),
            Market::AwayWinOrDraw => "X2".to_string(),
            Market::Over(line) => format!("over_{line}.5"),
            Market::Under(line) => format!("under_{line}.5"),
            Market::Goal => "goal".to_string(),
            Market::NoGoal => "no_goal".to_string(),
            Market::HomeGoal => "home_goal".to_string(),
            Market::NoHomeGoal => "no_home_goal".to_string(),
            Market::AwayGoal => "away_goal".to_string(),
            Market::NoAwayGoal => "no_away_goal".to_string(),
        }
    }

    pub fn probability(&self, rm: &ResultMatrix) -> f64 {
        match *self {
            Market::HomeWin => rm.home_win_probability(),
            Market::Draw => rm.draw_probability(),
            Market::AwayWin => rm.away_win_probability(),
            Market::HomeWinOrDraw => rm.home_win_or_draw_probability(),
            Market::HomeOrAwayWin => rm.home_or_away_win_probability(),
            Market::AwayWinOrDraw => rm.away_win_or_draw_probability(),
            Market::Over(line) => rm.over_goals_probability(line),
            Market::Under(line) => rm.under_goals_probability(line),
            Market::Goal => rm.goal_probability(),
            Market::NoGoal => rm.no_goal_probability(),
            Market::HomeGoal => rm.home_goal_probability(),
            Market::NoHomeGoal => rm.no_home_goal_probability(),
            Market::AwayGoal => rm.away_goal_probability(),
            Market::NoAwayGoal => rm.no_away_goal_probability(),
        }
    }
}

impl fmt::Display for Market {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label())
    }
}

/// Every market and exact score for one fixture, with fair odds.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketBook {
    pub markets: Vec<(Market, PriceQuote)>,
    pub exact_scores: BTreeMap<Scoreline, PriceQuote>,
}

impl MarketBook {
    pub fn from_matrix(rm: &ResultMatrix) -> Self {
        let markets = Market::catalogue()
            .into_iter()
            .map(|m| (m, PriceQuote::from_probability(m.probability(rm))))
            .collect();
        let exact_scores = rm
            .cells()
            .map(|(score, p)| (score, PriceQuote::from_probability(p)))
            .collect();
        Self {
            markets,
            exact_scores,
        }
    }

    pub fn from_form(input: &FormInput) -> Result<Self, MatrixError> {
        ResultMatrix::new(input).map(|rm| Self::from_matrix(&rm))
    }

    pub fn quote(&self, market: Market) -> Option<PriceQuote> {
        self.markets
            .iter()
            .find(|(m, _)| *m == market)
            .map(|(_, q)| *q)
    }

    pub fn exact(&self, score: Scoreline) -> Option<PriceQuote> {
        self.exact_scores.get(&score).copied()
    }

    /// `{"result_matrix": {...}}`, the shape the web front end reads.
    pub fn into_response(self) -> MarketBookResponse {
        MarketBookResponse {
            result_matrix: self,
        }
    }
}

// Flat map: market labels first, then "k-m" keys for every scoreline.
impl Serialize for MarketBook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.markets.len() + self.exact_scores.len()))?;
        for (market, quote) in &self.markets {
            map.serialize_entry(&market.label(), quote)?;
        }
        for (score, quote) in &self.exact_scores {
            map.serialize_entry(&score.to_string(), quote)?;
        }
        map.end()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarketBookResponse {
    pub result_matrix: MarketBook,
}

/// Prices many fixtures on the rayon pool. Output order follows input order.
pub fn price_batch(inputs: &[FormInput]) -> Vec<Result<MarketBook, MatrixError>> {
    inputs.par_iter().map(MarketBook::from_form).collect()
}
