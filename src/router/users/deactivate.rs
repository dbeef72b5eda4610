use axum::Json;
use axum::extract::{Path, Query, State};
use axum::response::Redirect;
use chrono::{Duration, Utc};
use serde::Deserialize;

use crate::error::Result;
use crate::mail::Template;
use crate::router::Message;
use crate::user::UserRepository;
use crate::{AppState, ServerError, crypto};

const INVALID_TOKEN: &str = "Token de desactivación inválido o expirado.";

/// Deactivation links are valid for 24 hours.
const TOKEN_TTL_HOURS: i64 = 24;

#[derive(Debug, Deserialize)]
pub struct Params {
    pub token: Option<String>,
}

/// Handler to start account deactivation. A confirmation link goes to the
/// account email; nothing changes until it is clicked.
pub async fn request_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
) -> Result<Json<Message>> {
    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(mut user) = repo.find_by_id(user_id).await? else {
        return Err(ServerError::NotFound);
    };

    let token = crypto::random_token();
    user.deactivation_token = Some(token.clone());
    user.deactivation_expiration =
        Some(Utc::now() + Duration::hours(TOKEN_TTL_HOURS));
    repo.update(&user).await?;

    state.mail.send(
        &state.crypto.decrypt(&user.email),
        &user.username,
        Template::Deactivation { token: &token },
    );

    Ok(Message::new(
        "Se ha enviado un correo de confirmación para desactivar tu cuenta.",
    ))
}

/// Handler for the deactivation link. Deactivation is reversible in the
/// data model but no reactivation endpoint is exposed yet.
pub async fn confirm_handler(
    State(state): State<AppState>,
    Query(params): Query<Params>,
) -> Result<Redirect> {
    let Some(token) = params.token else {
        return Err(ServerError::BadRequest(INVALID_TOKEN.to_owned()));
    };

    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(mut user) = repo.find_by_deactivation_token(&token).await? else {
        return Err(ServerError::BadRequest(INVALID_TOKEN.to_owned()));
    };

    if user
        .deactivation_expiration
        .is_none_or(|expiration| expiration < Utc::now())
    {
        return Err(ServerError::BadRequest(INVALID_TOKEN.to_owned()));
    }

    user.is_active = false;
    user.deactivation_token = None;
    user.deactivation_expiration = None;
    repo.update(&user).await?;

    tracing::info!(user_id = user.id, "account deactivated");

    let client_url = state.config.client_url.trim_end_matches('/');
    Ok(Redirect::to(&format!("{client_url}/login?deactivated=true")))
}
