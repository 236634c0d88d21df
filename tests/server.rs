use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode};
use serde_json::Value;
use tower::ServiceExt;

use tks_odds::csv_feed::parse_league_csv;
use tks_odds::server::{AppState, create_router};

fn app() -> Router {
    let raw = include_str!("fixtures/serie_a.csv");
    let matches = parse_league_csv(raw, "Serie A").expect("fixture should parse");
    create_router(AppState::new(matches, 5))
}

async fn get(uri: &str) -> (StatusCode, String) {
    let request = Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("failed to build request");
    let response = app().oneshot(request).await.expect("router request failed");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    (status, String::from_utf8_lossy(&bytes).to_string())
}

fn json(body: &str) -> Value {
    serde_json::from_str(body).expect("response should be json")
}

#[tokio::test]
async fn health_is_ok() {
    let (status, body) = get("/health").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "ok");
}

#[tokio::test]
async fn index_page_is_served() {
    let (status, body) = get("/").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.contains("/fixture_matrix"));
}

#[tokio::test]
async fn teams_json_lists_unique_short_names() {
    let (status, body) = get("/all_teams_json").await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    let teams = v["all_teams"].as_array().expect("all_teams array");
    assert_eq!(teams.len(), 20);
    assert_eq!(teams[0]["short_name"], "atalanta");
    assert_eq!(teams[0]["name"], "Atalanta");
}

#[tokio::test]
async fn teams_html_is_option_list() {
    let (status, body) = get("/all_teams").await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.starts_with("<option value=\"\">Select Home Team</option>"));
    assert!(body.contains("<option value=\"inter\">Inter</option>"));
}

#[tokio::test]
async fn last_goals_json_sums_recent_home_games() {
    let (status, body) = get("/last_goals_json?team=inter&where=home&count=5").await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    assert_eq!(v["team"], "inter");
    assert_eq!(v["home_goals"], 6);
    assert_eq!(v["away_goals"], 0);
    assert_eq!(v["matches"], 2);
}

#[tokio::test]
async fn last_goals_html_picks_scored_or_conceded() {
    let (_, scored) = get("/last_goals?team=milan&where=home&count=5&type=scored").await;
    let (_, conceded) = get("/last_goals?team=milan&where=home&count=5&type=conceded").await;
    assert_eq!(scored, "6");
    assert_eq!(conceded, "2");
}

#[tokio::test]
async fn bad_venue_is_rejected() {
    let (status, body) = get("/last_goals_json?team=inter&where=neutral").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "BAD_REQUEST");
}

#[tokio::test]
async fn last_matches_are_newest_first() {
    let (status, body) = get("/last_matches_json?team=napoli&where=home&count=1").await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    let rows = v.as_array().expect("array");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["away_team"], "Parma");
}

#[tokio::test]
async fn result_matrix_prices_every_market() {
    let uri = "/result_matrix?match_count_home=5&match_count_away=5&home_scored=6\
&home_conceded=5&away_scored=7&away_conceded=5";
    let (status, body) = get(uri).await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    let rm = v["result_matrix"].as_object().expect("result_matrix object");
    assert_eq!(rm.len(), 28 + 121);
    let draw = rm["X"]["probability"].as_f64().expect("probability");
    assert!((draw - 0.30970).abs() < 1e-4);
    let odds = rm["X"]["odds"].as_f64().expect("odds");
    assert!((odds * draw - 1.0).abs() < 1e-9);
}

#[tokio::test]
async fn zero_match_count_is_a_bad_request() {
    let (status, body) = get("/result_matrix?match_count_home=0&match_count_away=5").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "NO_MATCHES");
}

#[tokio::test]
async fn fixture_matrix_uses_recent_form() {
    let (status, body) = get("/fixture_matrix?home=Inter&away=Fiorentina&count=5").await;
    assert_eq!(status, StatusCode::OK);
    let v = json(&body);
    let home = v["result_matrix"]["1"]["probability"].as_f64().expect("probability");
    let away = v["result_matrix"]["2"]["probability"].as_f64().expect("probability");
    assert!(home > away);
}

#[tokio::test]
async fn fixture_matrix_rejects_team_without_history() {
    let (status, body) = get("/fixture_matrix?home=Inter&away=Sassuolo").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json(&body)["error"], "NO_MATCHES");
}

#[tokio::test]
async fn malformed_query_gets_json_error() {
    for uri in [
        "/result_matrix?match_count_home=-1&match_count_away=5",
        "/last_goals_json?where=home",
        "/fixture_matrix?home=Inter&away=Fiorentina&count=x",
    ] {
        let (status, body) = get(uri).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{uri}");
        let v = json(&body);
        assert_eq!(v["error"], "BAD_REQUEST", "{uri}");
        assert!(v["message"].as_str().is_some_and(|m| !m.is_empty()), "{uri}");
    }
}
