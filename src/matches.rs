use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub league: String,
    pub home_team: String,
    pub away_team: String,
    pub home_goals: u32,
    pub away_goals: u32,
    pub match_date: NaiveDateTime,
}

impl Match {
    /// Stable identity for a fixture regardless of how the feed spells names.
    pub fn idempotent_key(&self) -> String {
        format!(
            "{}-{}-{}",
            normalize_name(&self.home_team),
            normalize_name(&self.away_team),
            self.match_date.and_utc().to_rfc3339_opts(chrono::SecondsFormat::Secs, true)
        )
    }
}

/// Lowercase with every space removed; used as the team's short name / key.
pub fn normalize_name(name: &str) -> String {
    name.trim().to_lowercase().replace(' ', "")
}
