use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::router::{AppJson, Message};
use crate::user::{UserRepository, is_supported_language};
use crate::{AppState, ServerError};

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileBody {
    pub username: Option<String>,
    pub nickname: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageBody {
    pub language: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LanguageResponse {
    pub message: String,
    pub language: String,
}

/// Handler to update profile fields. Absent or empty fields keep their
/// current value; the email is immutable, it anchors the account.
pub async fn handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    AppJson(body): AppJson<ProfileBody>,
) -> Result<Json<Message>> {
    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(mut user) = repo.find_by_id(user_id).await? else {
        return Err(ServerError::NotFound);
    };

    if let Some(username) = body.username.filter(|value| !value.is_empty()) {
        user.username = username;
    }
    if let Some(nickname) = body.nickname.filter(|value| !value.is_empty()) {
        user.nickname = state.crypto.encrypt(&nickname);
    }
    if let Some(password) = body.password.filter(|value| !value.is_empty()) {
        user.password = state.crypto.encrypt(&password);
    }

    repo.update(&user).await?;

    Ok(Message::new("Perfil actualizado con éxito"))
}

/// Handler to switch the account language, which also selects the mail
/// template language.
pub async fn language_handler(
    State(state): State<AppState>,
    Path(user_id): Path<i64>,
    AppJson(body): AppJson<LanguageBody>,
) -> Result<Json<LanguageResponse>> {
    if !is_supported_language(&body.language) {
        return Err(ServerError::BadRequest(
            "Idioma no soportado.".to_owned(),
        ));
    }

    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(mut user) = repo.find_by_id(user_id).await? else {
        return Err(ServerError::NotFound);
    };

    user.language = body.language.clone();
    repo.update(&user).await?;

    Ok(Json(LanguageResponse {
        message: "Idioma actualizado con éxito".to_owned(),
        language: body.language,
    }))
}
