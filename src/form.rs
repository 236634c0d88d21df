use std::collections::HashSet;
use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

use crate::matches::{Match, normalize_name};
use crate::result_matrix::FormInput;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Venue {
    Home,
    Away,
}

impl FromStr for Venue {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" => Ok(Venue::Home),
            "away" => Ok(Venue::Away),
            other => Err(anyhow!("unknown venue {other:?}, expected home or away")),
        }
    }
}

/// Goals for/against a team over its recent matches at one venue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LastGoals {
    pub team: String,
    pub scored: u32,
    pub conceded: u32,
    pub matches: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TeamName {
    pub name: String,
    pub short_name: String,
}

/// Most recent first, at most `count`. `team` is matched on its short name.
pub fn last_matches<'a>(
    matches: &'a [Match],
    team: &str,
    venue: Venue,
    count: usize,
) -> Vec<&'a Match> {
    let key = normalize_name(team);
    let mut picked: Vec<&Match> = matches
        .iter()
        .filter(|m| match venue {
            Venue::Home => normalize_name(&m.home_team) == key,
            Venue::Away => normalize_name(&m.away_team) == key,
        })
        .collect();
    picked.sort_by(|a, b| b.match_date.cmp(&a.match_date));
    picked.truncate(count);
    picked
}

pub fn last_goals(matches: &[Match], team: &str, venue: Venue, count: usize) -> LastGoals {
    let recent = last_matches(matches, team, venue, count);
    let (scored, conceded) = recent.iter().fold((0, 0), |(s, c), m| match venue {
        Venue::Home => (s + m.home_goals, c + m.away_goals),
        Venue::Away => (s + m.away_goals, c + m.home_goals),
    });
    LastGoals {
        team: team.to_string(),
        scored,
        conceded,
        matches: recent.len() as u32,
    }
}

/// Home side's last `count` home games against the away side's last `count`
/// away games. A team with no history yields a zero count, which the matrix
/// rejects.
pub fn form_input(matches: &[Match], home_team: &str, away_team: &str, count: usize) -> FormInput {
    let home = last_goals(matches, home_team, Venue::Home, count);
    let away = last_goals(matches, away_team, Venue::Away, count);
    FormInput {
        match_count_home: home.matches,
        match_count_away: away.matches,
        home_scored: home.scored,
        home_conceded: home.conceded,
        away_scored: away.scored,
        away_conceded: away.conceded,
    }
}

/// Unique teams ordered by short name.
pub fn all_teams(matches: &[Match]) -> Vec<TeamName> {
    let mut seen = HashSet::new();
    let mut out: Vec<TeamName> = matches
        .iter()
        .flat_map(|m| [m.home_team.as_str(), m.away_team.as_str()])
        .filter_map(|name| {
            let short_name = normalize_name(name);
            seen.insert(short_name.clone()).then(|| TeamName {
                name: name.to_string(),
                short_name,
            })
        })
        .collect();
    out.sort_by(|a, b| a.short_name.cmp(&b.short_name));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn m(day: u32, home: &str, away: &str, hg: u32, ag: u32) -> Match {
        Match {
            league: "Serie A".to_string(),
            home_team: home.to_string(),
            away_team: away.to_string(),
            home_goals: hg,
            away_goals: ag,
            match_date: NaiveDate::from_ymd_opt(2024, 9, day)
                .unwrap()
                .and_hms_opt(18, 0, 0)
                .unwrap(),
        }
    }

    fn sample() -> Vec<Match> {
        vec![
            m(1, "Inter", "Milan", 2, 1),
            m(8, "Milan", "Inter", 0, 0),
            m(15, "Inter", "Roma", 3, 0),
            m(22, "Roma", "Inter", 1, 2),
            m(29, "Inter", "AC Pisa", 1, 1),
        ]
    }

    #[test]
    fn venue_parses_case_insensitively() {
        assert_eq!("HOME".parse::<Venue>().unwrap(), Venue::Home);
        assert_eq!(" away".parse::<Venue>().unwrap(), Venue::Away);
        assert!("neutral".parse::<Venue>().is_err());
    }

    #[test]
    fn last_matches_are_newest_first_and_capped() {
        let all = sample();
        let recent = last_matches(&all, "inter", Venue::Home, 2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[0].away_team, "AC Pisa");
        assert_eq!(recent[1].away_team, "Roma");
    }

    #[test]
    fn last_goals_are_from_team_perspective() {
        let all = sample();
        let home = last_goals(&all, "Inter", Venue::Home, 10);
        assert_eq!((home.scored, home.conceded, home.matches), (6, 2, 3));
        let away = last_goals(&all, "Inter", Venue::Away, 10);
        assert_eq!((away.scored, away.conceded, away.matches), (2, 1, 2));
    }

    #[test]
    fn form_input_pairs_home_and_away_records() {
        let all = sample();
        let input = form_input(&all, "inter", "roma", 5);
        assert_eq!(input.match_count_home, 3);
        assert_eq!(input.match_count_away, 1);
        assert_eq!(input.away_scored, 0);
        assert_eq!(input.away_conceded, 3);

        let unknown = form_input(&all, "inter", "lazio", 5);
        assert_eq!(unknown.match_count_away, 0);
        assert!(unknown.lambdas().is_err());
    }

    #[test]
    fn all_teams_are_unique_and_sorted() {
        let teams = all_teams(&sample());
        let shorts: Vec<&str> = teams.iter().map(|t| t.short_name.as_str()).collect();
        assert_eq!(shorts, vec!["acpisa", "inter", "milan", "roma"]);
        assert_eq!(teams[0].name, "AC Pisa");
    }
}
