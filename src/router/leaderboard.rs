//! Leaderboard HTTP API.

use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::Result;
use crate::leaderboard::{Entry, Leaderboard, Period, RankedEntry};
use crate::{AppState, ServerError};

#[derive(Debug, Deserialize)]
pub struct PeriodQuery {
    pub period: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // `GET /leaderboard/world?period=` goes to `world`.
        .route("/world", get(world))
        // `GET /leaderboard/me/:ID?period=` goes to `me`.
        .route("/me/{user_id}", get(me))
}

/// Handler for the worldwide top 10.
async fn world(
    State(state): State<AppState>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Vec<Entry>>> {
    let period = Period::parse(params.period.as_deref());
    let board = Leaderboard::new(state.db.sqlite.clone());

    Ok(Json(board.world_top(period).await?))
}

/// Handler for the window of ranks around one user.
async fn me(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<PeriodQuery>,
) -> Result<Json<Vec<RankedEntry>>> {
    let period = Period::parse(params.period.as_deref());
    let board = Leaderboard::new(state.db.sqlite.clone());

    match board.relative_to(user_id, period).await? {
        Some(window) => Ok(Json(window)),
        None => Err(ServerError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::SqlitePool;

    use crate::*;

    async fn fetch(pool: SqlitePool, path: &str) -> serde_json::Value {
        let app = app(router::state(pool));
        let response =
            make_request(app, Method::GET, path, String::default()).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[sqlx::test(fixtures("../../fixtures/leaderboard.sql"))]
    async fn test_world_top_ten(pool: SqlitePool) {
        let board = fetch(pool, "/api/leaderboard/world").await;
        let board = board.as_array().unwrap();

        // 15 ranked users, only 10 served.
        assert_eq!(board.len(), 10);
        assert_eq!(board[0]["username"], "demo01");
        assert_eq!(board[0]["xp"], 1500);
        assert_eq!(board[9]["xp"], 600);
    }

    #[sqlx::test(fixtures("../../fixtures/leaderboard.sql"))]
    async fn test_world_weekly_reorders(pool: SqlitePool) {
        // Weekly XP is inverted in the fixture: the all-time last is the
        // weekly first.
        let board = fetch(pool, "/api/leaderboard/world?period=week").await;
        assert_eq!(board[0]["username"], "demo15");
        assert_eq!(board[0]["xp"], 150);
    }

    #[sqlx::test(fixtures("../../fixtures/leaderboard.sql"))]
    async fn test_world_monthly_uses_month_counters(pool: SqlitePool) {
        // Monthly XP is half of all-time in the fixture: same order, but
        // the served values prove which column got ranked.
        let board = fetch(pool, "/api/leaderboard/world?period=month").await;
        let board = board.as_array().unwrap();

        assert_eq!(board.len(), 10);
        assert_eq!(board[0]["username"], "demo01");
        assert_eq!(board[0]["xp"], 750);
        assert_eq!(board[9]["xp"], 300);
    }

    #[sqlx::test(fixtures("../../fixtures/leaderboard.sql"))]
    async fn test_relative_window_monthly(pool: SqlitePool) {
        let window = fetch(pool, "/api/leaderboard/me/8?period=month").await;
        let window = window.as_array().unwrap();

        assert_eq!(window.len(), 11);
        let me = window.iter().find(|entry| entry["userId"] == 8).unwrap();
        assert_eq!(me["rank"], 8);
        assert_eq!(me["xp"], 400);
    }

    #[sqlx::test(fixtures("../../fixtures/leaderboard.sql"))]
    async fn test_relative_window_mid_board(pool: SqlitePool) {
        // demo08 sits at rank 8 of 15: full 11-entry window, ranks 3-13.
        let window = fetch(pool, "/api/leaderboard/me/8").await;
        let window = window.as_array().unwrap();

        assert_eq!(window.len(), 11);
        assert_eq!(window[0]["rank"], 3);
        assert_eq!(window[10]["rank"], 13);
        assert!(window.iter().any(|entry| entry["userId"] == 8));
    }

    #[sqlx::test(fixtures("../../fixtures/leaderboard.sql"))]
    async fn test_relative_window_at_bottom(pool: SqlitePool) {
        // demo15 is last at rank 15: window runs from rank 10 to 15.
        let window = fetch(pool, "/api/leaderboard/me/15").await;
        let window = window.as_array().unwrap();

        assert_eq!(window.len(), 6);
        assert_eq!(window[0]["rank"], 10);
        assert_eq!(window[5]["rank"], 15);
        assert_eq!(window[5]["userId"], 15);
    }

    #[sqlx::test(fixtures("../../fixtures/leaderboard.sql"))]
    async fn test_relative_window_unknown_user(pool: SqlitePool) {
        let app = app(router::state(pool));
        let response = make_request(
            app,
            Method::GET,
            "/api/leaderboard/me/99",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    async fn test_world_empty_population(pool: SqlitePool) {
        let board = fetch(pool, "/api/leaderboard/world").await;
        assert_eq!(board.as_array().unwrap().len(), 0);
    }
}
