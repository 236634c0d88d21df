use std::sync::Arc;

use anyhow::{Context, Result};
use axum::async_trait;
use axum::extract::{FromRequestParts, Query, State};
use axum::http::StatusCode;
use axum::http::request::Parts;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::form::{self, TeamName, Venue};
use crate::markets::{MarketBook, MarketBookResponse};
use crate::matches::Match;
use crate::result_matrix::{FormInput, MatrixError};

const INDEX_HTML: &str = include_str!("../assets/index.html");

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = match &self {
            AppError::BadRequest(_) => "BAD_REQUEST",
            AppError::Matrix(MatrixError::NoMatches(_)) => "NO_MATCHES",
            AppError::Matrix(MatrixError::ScoreOutOfRange { .. }) => "SCORE_OUT_OF_RANGE",
        };
        let body = Json(json!({
            "error": code,
            "message": self.to_string(),
        }));
        (StatusCode::BAD_REQUEST, body).into_response()
    }
}

/// `Query` whose rejection goes through `AppError`, so a malformed query
/// string gets the same JSON body as every other bad request.
struct ApiQuery<T>(T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(value) = Query::<T>::from_request_parts(parts, state)
            .await
            .map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;
        Ok(Self(value))
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    matches: Arc<Vec<Match>>,
    default_count: usize,
}

impl AppState {
    pub fn new(matches: Vec<Match>, default_count: usize) -> Self {
        Self {
            matches: Arc::new(matches),
            default_count: default_count.max(1),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TeamQuery {
    team: String,
    #[serde(rename = "where")]
    venue: String,
    count: Option<usize>,
    #[serde(rename = "type")]
    kind: Option<String>,
}

impl TeamQuery {
    fn venue(&self) -> Result<Venue, AppError> {
        self.venue
            .parse()
            .map_err(|e: anyhow::Error| AppError::BadRequest(e.to_string()))
    }
}

#[derive(Debug, Deserialize)]
struct ResultMatrixQuery {
    #[serde(default)]
    match_count_home: u32,
    #[serde(default)]
    match_count_away: u32,
    #[serde(default)]
    home_scored: u32,
    #[serde(default)]
    home_conceded: u32,
    #[serde(default)]
    away_scored: u32,
    #[serde(default)]
    away_conceded: u32,
}

impl ResultMatrixQuery {
    fn form_input(&self) -> FormInput {
        FormInput {
            match_count_home: self.match_count_home,
            match_count_away: self.match_count_away,
            home_scored: self.home_scored,
            home_conceded: self.home_conceded,
            away_scored: self.away_scored,
            away_conceded: self.away_conceded,
        }
    }
}

// Field names are what the page's scripts read: home_goals is goals scored by
// `team`, away_goals is goals it conceded.
#[derive(Debug, Serialize)]
struct LastGoalsResponse {
    team: String,
    home_goals: u32,
    away_goals: u32,
    matches: u32,
}

#[derive(Debug, Deserialize)]
struct FixtureQuery {
    home: String,
    away: String,
    count: Option<usize>,
}

#[derive(Debug, Serialize)]
struct TeamsResponse {
    all_teams: Vec<TeamName>,
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health))
        .route("/all_teams_json", get(teams_json))
        .route("/all_teams", get(teams_html))
        .route("/last_goals_json", get(last_goals_json))
        .route("/last_goals", get(last_goals_html))
        .route("/last_matches_json", get(last_matches_json))
        .route("/result_matrix", get(result_matrix))
        .route("/fixture_matrix", get(fixture_matrix))
        .with_state(state)
}

pub async fn serve(bind: &str, state: AppState) -> Result<()> {
    let listener = TcpListener::bind(bind)
        .await
        .with_context(|| format!("failed to bind {bind}"))?;
    info!(addr = %bind, "listening");
    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")
}

async fn shutdown_signal() {
    wait_for_shutdown(tokio::signal::ctrl_c()).await
}

async fn wait_for_shutdown<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        // Without a handler the server runs until killed.
        error!(%err, "failed to install ctrl-c handler");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn health() -> &'static str {
    "ok"
}

async fn teams_json(State(state): State<AppState>) -> Json<TeamsResponse> {
    Json(TeamsResponse {
        all_teams: form::all_teams(&state.matches),
    })
}

async fn teams_html(State(state): State<AppState>) -> Html<String> {
    let mut out = String::from("<option value=\"\">Select Home Team</option>");
    for team in form::all_teams(&state.matches) {
        out.push_str(&format!(
            "<option value=\"{}\">{}</option>",
            escape_html(&team.short_name),
            escape_html(&team.name)
        ));
    }
    Html(out)
}

async fn last_goals_json(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<TeamQuery>,
) -> Result<Json<LastGoalsResponse>, AppError> {
    let venue = q.venue()?;
    let count = q.count.unwrap_or(state.default_count);
    let goals = form::last_goals(&state.matches, &q.team, venue, count);
    Ok(Json(LastGoalsResponse {
        team: goals.team,
        home_goals: goals.scored,
        away_goals: goals.conceded,
        matches: goals.matches,
    }))
}

async fn last_goals_html(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<TeamQuery>,
) -> Result<Html<String>, AppError> {
    let venue = q.venue()?;
    let count = q.count.unwrap_or(state.default_count);
    let goals = form::last_goals(&state.matches, &q.team, venue, count);
    let n = if q.kind.as_deref() == Some("scored") {
        goals.scored
    } else {
        goals.conceded
    };
    Ok(Html(n.to_string()))
}

async fn last_matches_json(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<TeamQuery>,
) -> Result<Json<Vec<Match>>, AppError> {
    let venue = q.venue()?;
    let count = q.count.unwrap_or(state.default_count);
    let picked = form::last_matches(&state.matches, &q.team, venue, count)
        .into_iter()
        .cloned()
        .collect();
    Ok(Json(picked))
}

async fn result_matrix(
    ApiQuery(q): ApiQuery<ResultMatrixQuery>,
) -> Result<Json<MarketBookResponse>, AppError> {
    let input = q.form_input();
    let book = MarketBook::from_form(&input)?;
    debug!(?input, "priced result matrix");
    Ok(Json(book.into_response()))
}

async fn fixture_matrix(
    State(state): State<AppState>,
    ApiQuery(q): ApiQuery<FixtureQuery>,
) -> Result<Json<MarketBookResponse>, AppError> {
    let count = q.count.unwrap_or(state.default_count);
    let input = form::form_input(&state.matches, &q.home, &q.away, count);
    let book = MarketBook::from_form(&input)?;
    debug!(home = %q.home, away = %q.away, ?input, "priced fixture");
    Ok(Json(book.into_response()))
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn shutdown_waits_when_signal_handler_fails() {
        let failed = async { Err(std::io::Error::other("no signal support")) };
        let waited =
            tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(failed)).await;
        assert!(waited.is_err(), "server must keep running without a handler");
    }

    #[tokio::test]
    async fn shutdown_completes_on_signal() {
        let fired = async { Ok(()) };
        let waited =
            tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(fired)).await;
        assert!(waited.is_ok());
    }
}
