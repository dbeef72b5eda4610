use axum::extract::{Query, State};
use axum::response::Redirect;
use chrono::Utc;
use serde::Deserialize;

use crate::error::Result;
use crate::user::UserRepository;
use crate::{AppState, ServerError};

const INVALID_TOKEN: &str = "Token de verificación inválido o expirado.";

#[derive(Debug, Deserialize)]
pub struct Params {
    pub token: Option<String>,
}

/// Handler for the verification link emailed at registration.
///
/// On success the browser is redirected to the client application, since
/// the link is opened outside the mobile app.
pub async fn handler(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Redirect> {
    let Some(token) = params.token else {
        return Err(ServerError::BadRequest(INVALID_TOKEN.to_owned()));
    };

    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(mut user) = repo.find_by_verification_token(&token).await? else {
        return Err(ServerError::BadRequest(INVALID_TOKEN.to_owned()));
    };

    if user
        .token_expiration
        .is_none_or(|expiration| expiration < Utc::now())
    {
        return Err(ServerError::BadRequest(INVALID_TOKEN.to_owned()));
    }

    user.is_verified = true;
    user.verification_token = None;
    user.token_expiration = None;
    repo.update(&user).await?;

    tracing::info!(user_id = user.id, "email verified");

    let client_url = state.config.client_url.trim_end_matches('/');
    Ok(Redirect::to(&format!(
        "{client_url}/verification-success?lang={}",
        user.language
    )))
}
