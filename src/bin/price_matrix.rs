use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result, anyhow};
use tracing::warn;

use tks_odds::logging;
use tks_odds::markets::{MarketBook, price_batch};
use tks_odds::result_matrix::FormInput;

const USAGE: &str = "usage: price_matrix --home-count=N --away-count=N --home-scored=N \
--home-conceded=N --away-scored=N --away-conceded=N\n       price_matrix --file=batch.json";

fn main() -> Result<()> {
    logging::init();
    let args = std::env::args().skip(1).collect::<Vec<_>>();

    if let Some(path) = arg_value(&args, "file") {
        return price_file(PathBuf::from(path));
    }

    let input = FormInput {
        match_count_home: required(&args, "home-count")?,
        match_count_away: required(&args, "away-count")?,
        home_scored: required(&args, "home-scored")?,
        home_conceded: required(&args, "home-conceded")?,
        away_scored: required(&args, "away-scored")?,
        away_conceded: required(&args, "away-conceded")?,
    };
    let book = MarketBook::from_form(&input)?;
    println!("{}", serde_json::to_string_pretty(&book.into_response())?);
    Ok(())
}

// A JSON array of form inputs; one output line per input, errors included.
fn price_file(path: PathBuf) -> Result<()> {
    let raw = fs::read_to_string(&path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let inputs: Vec<FormInput> =
        serde_json::from_str(&raw).with_context(|| format!("invalid batch {}", path.display()))?;

    for (idx, priced) in price_batch(&inputs).into_iter().enumerate() {
        match priced {
            Ok(book) => println!("{}", serde_json::to_string(&book.into_response())?),
            Err(err) => {
                warn!(row = idx, error = %err, "skipping row");
                println!("{}", serde_json::json!({ "row": idx, "error": err.to_string() }));
            }
        }
    }
    Ok(())
}

fn required(args: &[String], key: &str) -> Result<u32> {
    let raw = arg_value(args, key).ok_or_else(|| anyhow!("missing --{key}\n{USAGE}"))?;
    raw.trim()
        .parse::<u32>()
        .with_context(|| format!("--{key} must be a non-negative integer, got {raw:?}"))
}

fn arg_value(args: &[String], key: &str) -> Option<String> {
    let flag = format!("--{key}");
    for (idx, arg) in args.iter().enumerate() {
        if let Some(value) = arg.strip_prefix(&flag).and_then(|rest| rest.strip_prefix('=')) {
            if !value.trim().is_empty() {
                return Some(value.to_string());
            }
        }
        if *arg == flag {
            let Some(next) = args.get(idx + 1) else {
                continue;
            };
            if !next.trim().is_empty() {
                return Some(next.clone());
            }
        }
    }
    None
}
