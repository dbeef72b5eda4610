use axum::Json;
use axum::extract::State;
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::mail::Template;
use crate::router::{AppJson, Message};
use crate::user::{
    DEFAULT_LANGUAGE, User, UserRepository, is_supported_language,
};
use crate::{AppState, ServerError, crypto};

/// Verification links are valid for 24 hours.
const TOKEN_TTL_HOURS: i64 = 24;

const MIN_PASSWORD_CHARS: usize = 6;

#[derive(Debug, Serialize, Deserialize)]
pub struct Body {
    pub username: String,
    pub email: String,
    pub password: String,
    pub language: Option<String>,
}

/// Handler to register a new user. The account is created unverified;
/// verification gates login, not record creation.
pub async fn handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<Body>,
) -> Result<Json<Message>> {
    if body.username.trim().is_empty()
        || body.email.trim().is_empty()
        || body.password.trim().is_empty()
    {
        return Err(ServerError::BadRequest(
            "Todos los campos son obligatorios.".to_owned(),
        ));
    }

    if !body.email.contains('@') || !body.email.contains('.') {
        return Err(ServerError::BadRequest(
            "El correo electrónico no es válido.".to_owned(),
        ));
    }

    if body.password.chars().count() < MIN_PASSWORD_CHARS {
        return Err(ServerError::BadRequest(
            "La contraseña debe tener al menos 6 caracteres.".to_owned(),
        ));
    }

    let language = match body.language {
        None => DEFAULT_LANGUAGE.to_owned(),
        Some(language) if is_supported_language(&language) => language,
        Some(_) => {
            return Err(ServerError::BadRequest(
                "Idioma no soportado.".to_owned(),
            ));
        },
    };

    let repo = UserRepository::new(state.db.sqlite.clone());

    if repo.find_by_username(&body.username).await?.is_some() {
        return Err(ServerError::BadRequest(
            "El nombre de usuario ya está en uso.".to_owned(),
        ));
    }

    // Emails are stored encrypted, so uniqueness means decrypting every
    // stored email. O(n) per registration; kept for behavioral parity.
    for user in repo.all().await? {
        if state.crypto.decrypt(&user.email) == body.email {
            return Err(ServerError::BadRequest(
                "El correo electrónico ya está registrado.".to_owned(),
            ));
        }
    }

    let token = crypto::random_token();
    let user = User {
        username: body.username.clone(),
        nickname: state.crypto.encrypt(&body.username),
        email: state.crypto.encrypt(&body.email),
        password: state.crypto.encrypt(&body.password),
        joined_at: Utc::now(),
        language: language.clone(),
        is_verified: false,
        verification_token: Some(token.clone()),
        token_expiration: Some(Utc::now() + Duration::hours(TOKEN_TTL_HOURS)),
        is_active: true,
        ..Default::default()
    };
    let user_id = repo.insert(&user).await?;

    tracing::info!(user_id, username = %user.username, "user registered");

    state.mail.send(
        &body.email,
        &body.username,
        Template::Verification {
            token: &token,
            language: &language,
        },
    );

    Ok(Message::new(
        "Registro completado. Revisa tu correo para verificar tu cuenta.",
    ))
}

#[cfg(test)]
mod tests {
    use axum::http::{Method, StatusCode};
    use serde_json::json;
    use sqlx::SqlitePool;

    use crate::*;

    async fn register(
        pool: SqlitePool,
        body: serde_json::Value,
    ) -> axum::http::Response<axum::body::Body> {
        let app = app(router::state(pool));
        make_request(app, Method::POST, "/api/users/register", body.to_string())
            .await
    }

    #[sqlx::test]
    async fn test_register_handler(pool: SqlitePool) {
        let response = register(
            pool.clone(),
            json!({
                "username": "amaia",
                "email": "amaia@euskalia.eus",
                "password": "sekretua",
                "language": "eu",
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);

        let state = router::state(pool);
        let repo = user::UserRepository::new(state.db.sqlite.clone());
        let user = repo.find_by_username("amaia").await.unwrap().unwrap();
        assert!(!user.is_verified);
        assert!(user.verification_token.is_some());
        assert_eq!(user.language, "eu");
        // Stored fields are ciphertexts.
        assert_ne!(user.email, "amaia@euskalia.eus");
        assert_eq!(state.crypto.decrypt(&user.email), "amaia@euskalia.eus");

        // No progress row yet: it is created lazily on first read.
        let progress = progress::ProgressRepository::new(state.db.sqlite)
            .find_by_user(user.id)
            .await
            .unwrap();
        assert!(progress.is_none());
    }

    #[sqlx::test]
    async fn test_register_rejects_blank_fields(pool: SqlitePool) {
        let response = register(
            pool,
            json!({ "username": "", "email": "a@b.c", "password": "sekretua" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_register_rejects_malformed_email(pool: SqlitePool) {
        for email in ["no-arroba.eus", "no-punto@eus"] {
            let response = register(
                pool.clone(),
                json!({
                    "username": "amaia",
                    "email": email,
                    "password": "sekretua",
                }),
            )
            .await;
            assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        }
    }

    #[sqlx::test]
    async fn test_register_rejects_short_password(pool: SqlitePool) {
        let response = register(
            pool,
            json!({
                "username": "amaia",
                "email": "amaia@euskalia.eus",
                "password": "12345",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test(fixtures("../../../fixtures/users.sql"))]
    async fn test_register_rejects_duplicate_username(pool: SqlitePool) {
        let response = register(
            pool,
            json!({
                "username": "igoraresti",
                "email": "otro@euskalia.eus",
                "password": "sekretua",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_register_rejects_duplicate_email(pool: SqlitePool) {
        let first = register(
            pool.clone(),
            json!({
                "username": "amaia",
                "email": "amaia@euskalia.eus",
                "password": "sekretua",
            }),
        )
        .await;
        assert_eq!(first.status(), StatusCode::OK);

        // Same email under a different username; the duplicate check has
        // to see through the stored ciphertext.
        let second = register(
            pool,
            json!({
                "username": "beste_bat",
                "email": "amaia@euskalia.eus",
                "password": "sekretua",
            }),
        )
        .await;
        assert_eq!(second.status(), StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    async fn test_register_rejects_unknown_language(pool: SqlitePool) {
        let response = register(
            pool,
            json!({
                "username": "amaia",
                "email": "amaia@euskalia.eus",
                "password": "sekretua",
                "language": "de",
            }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
