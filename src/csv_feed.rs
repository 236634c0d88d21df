use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};
use chrono::NaiveDateTime;
use reqwest::header::USER_AGENT;
use tracing::{debug, info};

use crate::config::{Config, League};
use crate::http_client::{http_client, random_user_agent};
use crate::matches::Match;

// football-data.co.uk layout: Div,Date,Time,HomeTeam,AwayTeam,FTHG,FTAG,...
const COL_DATE: usize = 1;
const COL_TIME: usize = 2;
const COL_HOME: usize = 3;
const COL_AWAY: usize = 4;
const COL_HOME_GOALS: usize = 5;
const COL_AWAY_GOALS: usize = 6;
const DATE_FORMAT: &str = "%d/%m/%Y %H:%M";

/// Downloads and parses every configured league.
pub fn load_matches(config: &Config) -> Result<Vec<Match>> {
    let mut out = Vec::new();
    for league in &config.leagues {
        let body = download_league_csv(league)?;
        let matches = parse_league_csv(&body, &league.name)?;
        info!(league = %league.name, matches = matches.len(), "loaded league results");
        out.extend(matches);
    }
    Ok(dedup_matches(out))
}

/// Drops repeats of the same fixture (e.g. a league listed twice), keeping
/// the first occurrence.
pub fn dedup_matches(mut matches: Vec<Match>) -> Vec<Match> {
    let mut seen = HashSet::new();
    matches.retain(|m| seen.insert(m.idempotent_key()));
    matches
}

pub fn download_league_csv(league: &League) -> Result<String> {
    let client = http_client()?;
    debug!(league = %league.name, url = %league.url, "downloading csv");
    let resp = client
        .get(&league.url)
        .header(USER_AGENT, random_user_agent())
        .send()
        .with_context(|| format!("error downloading csv for {}", league.name))?;
    let status = resp.status();
    if !status.is_success() {
        return Err(anyhow!("unexpected status {} for {}", status, league.name));
    }
    resp.text()
        .with_context(|| format!("error reading response body for {}", league.name))
}

/// Header row skipped; blank lines ignored; any malformed row fails the league.
pub fn parse_league_csv(data: &str, league: &str) -> Result<Vec<Match>> {
    let mut lines = data.lines().enumerate();
    if lines.next().is_none() {
        return Err(anyhow!("csv for {league} has no header"));
    }

    let mut out = Vec::new();
    for (idx, line) in lines {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let record = line.split(',').collect::<Vec<_>>();
        let m = parse_match(&record, league)
            .with_context(|| format!("error parsing {league} csv line {}", idx + 1))?;
        out.push(m);
    }
    Ok(out)
}

fn parse_match(record: &[&str], league: &str) -> Result<Match> {
    if record.len() <= COL_AWAY_GOALS {
        return Err(anyhow!(
            "expected at least {} columns, got {}",
            COL_AWAY_GOALS + 1,
            record.len()
        ));
    }
    let home_goals = record[COL_HOME_GOALS]
        .trim()
        .parse::<u32>()
        .context("error parsing home goals")?;
    let away_goals = record[COL_AWAY_GOALS]
        .trim()
        .parse::<u32>()
        .context("error parsing away goals")?;

    let raw_date = format!("{} {}", record[COL_DATE].trim(), record[COL_TIME].trim());
    let match_date = NaiveDateTime::parse_from_str(&raw_date, DATE_FORMAT)
        .with_context(|| format!("error parsing match date {raw_date:?}"))?;

    Ok(Match {
        league: league.to_string(),
        home_team: record[COL_HOME].trim().to_string(),
        away_team: record[COL_AWAY].trim().to_string(),
        home_goals,
        away_goals,
        match_date,
    })
}
