use axum::Json;
use axum::extract::{Path, Query, State};
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::mail::Template;
use crate::router::Message;
use crate::user::UserRepository;
use crate::{AppState, ServerError, crypto};

/// Deletion codes are short-lived, unlike the emailed link tokens.
const CODE_TTL_MINUTES: i64 = 15;

// The deletion flow predates the localized messages and still answers in
// English. The client matches on these strings, so they stay.
const INVALID_CODE: &str = "Invalid or expired verification code.";

#[derive(Debug, Deserialize)]
pub struct Params {
    pub code: Option<String>,
}

/// Handler to start account deletion by emailing a 6-digit code.
pub async fn request_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Message>> {
    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(mut user) = repo.find_by_id(user_id).await? else {
        return Err(ServerError::NotFound);
    };

    let code = crypto::deletion_code();
    user.deletion_code = Some(code.clone());
    user.code_expiration =
        Some(Utc::now() + Duration::minutes(CODE_TTL_MINUTES));
    repo.update(&user).await?;

    state.mail.send(
        &state.crypto.decrypt(&user.email),
        &user.username,
        Template::DeletionCode { code: &code },
    );

    Ok(Message::new("Verification code generated and sent."))
}

/// Handler to permanently delete an account. Requires the emailed code;
/// progress and lesson scores go with the user row through the cascade.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    Query(params): Query<Params>,
) -> Result<Json<Message>> {
    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(user) = repo.find_by_id(user_id).await? else {
        return Err(ServerError::NotFound);
    };

    let valid = match (&user.deletion_code, params.code) {
        (Some(stored), Some(given)) if *stored == given => user
            .code_expiration
            .is_some_and(|expiration| expiration >= Utc::now()),
        _ => false,
    };
    if !valid {
        return Err(ServerError::BadRequest(INVALID_CODE.to_owned()));
    }

    repo.delete(user.id).await?;

    tracing::info!(user_id, "account deleted");

    Ok(Message::new("Account deleted successfully."))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use sqlx::SqlitePool;

    use crate::*;

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_request_deletion_handler(pool: SqlitePool) {
        let app = app(router::state(pool.clone()));
        let response = make_request(
            app,
            Method::POST,
            "/api/users/2/request-deletion",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let repo = user::UserRepository::new(pool);
        let user = repo.find_by_id(2).await.unwrap().unwrap();
        let code = user.deletion_code.unwrap();
        assert_eq!(code.len(), 6);
        assert!(user.code_expiration.unwrap() > chrono::Utc::now());
    }

    #[sqlx::test(fixtures(
        "../../../fixtures/users.sql",
        "../../../fixtures/progress.sql"
    ))]
    async fn test_delete_account_handler(pool: SqlitePool) {
        let app = app(router::state(pool.clone()));
        let response = make_request(
            app,
            Method::DELETE,
            "/api/users/1?code=654321",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let repo = user::UserRepository::new(pool.clone());
        assert!(repo.find_by_id(1).await.unwrap().is_none());

        // The progress row cascades with the user.
        let progress = progress::ProgressRepository::new(pool)
            .find_by_user(1)
            .await
            .unwrap();
        assert!(progress.is_none());
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_delete_account_rejects_wrong_code(pool: SqlitePool) {
        let app = app(router::state(pool.clone()));
        let response = make_request(
            app,
            Method::DELETE,
            "/api/users/1?code=000000",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let repo = user::UserRepository::new(pool);
        assert!(repo.find_by_id(1).await.unwrap().is_some());
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_delete_account_rejects_expired_code(pool: SqlitePool) {
        let app = app(router::state(pool.clone()));
        let response = make_request(
            app,
            Method::DELETE,
            "/api/users/4?code=111111",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let repo = user::UserRepository::new(pool);
        assert!(repo.find_by_id(4).await.unwrap().is_some());
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_delete_account_rejects_missing_code(pool: SqlitePool) {
        let app = app(router::state(pool));
        let response = make_request(
            app,
            Method::DELETE,
            "/api/users/1",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_delete_account_not_found(pool: SqlitePool) {
        let app = app(router::state(pool));
        let response = make_request(
            app,
            Method::DELETE,
            "/api/users/9?code=123456",
            String::default(),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
