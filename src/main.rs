use anyhow::{Context, Result};
use tracing::{info, warn};

use tks_odds::config::Config;
use tks_odds::server::{self, AppState};
use tks_odds::{csv_feed, logging};

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::init();

    let config = Config::load()?;
    info!(leagues = config.leagues.len(), "config loaded");

    // Downloads use the blocking client, so they run before the runtime exists.
    let matches = csv_feed::load_matches(&config).context("failed to load league results")?;
    if matches.is_empty() {
        warn!("no matches loaded; every price request will be rejected");
    }
    info!(matches = matches.len(), "results loaded");

    let state = AppState::new(matches, config.server.default_form_matches);
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start tokio runtime")?;
    runtime.block_on(server::serve(&config.server.bind, state))
}
