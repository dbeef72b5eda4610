use axum::Json;
use axum::extract::{Path, State};

use crate::error::Result;
use crate::user::{User, UserRepository};
use crate::{AppState, ServerError};

/// Handler to get a user by id, with encrypted fields decrypted for the
/// client.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<User>> {
    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(user) = repo.find_by_id(user_id).await? else {
        return Err(ServerError::NotFound);
    };

    Ok(Json(user.decrypted(&state.crypto)))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use http_body_util::BodyExt;
    use sqlx::SqlitePool;

    use crate::*;

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_get_user_handler(pool: SqlitePool) {
        let app = app(router::state(pool));
        let response =
            make_request(app, Method::GET, "/api/users/1", String::default())
                .await;

        assert_eq!(response.status(), StatusCode::OK);

        let body = response.into_body().collect().await.unwrap().to_bytes();
        let user: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(user["username"], "igoraresti");
        assert_eq!(user["nickname"], "Igor Aresti");
        assert_eq!(user["email"], "igor@euskalia.eus");
        assert!(user.get("password").is_none());
        assert!(user.get("verificationToken").is_none());
    }

    #[sqlx::test]
    async fn test_get_user_not_found(pool: SqlitePool) {
        let app = app(router::state(pool));
        let response =
            make_request(app, Method::GET, "/api/users/42", String::default())
                .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
