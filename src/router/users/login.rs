use axum::Json;
use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::router::AppJson;
use crate::user::{User, UserRepository};
use crate::{AppState, ServerError};

const BAD_CREDENTIALS: &str = "Usuario o contraseña incorrectos.";

#[derive(Debug, Serialize, Deserialize)]
pub struct Body {
    pub username: String,
    pub password: String,
}

/// Handler to log a user in by username and password.
///
/// Passwords are compared through decryption rather than hashing; the
/// storage format is reversible by design of the legacy data. Unknown
/// usernames and wrong passwords share one error message so the endpoint
/// does not leak which usernames exist.
pub async fn handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<Body>,
) -> Result<Json<User>> {
    let repo = UserRepository::new(state.db.sqlite.clone());

    let Some(user) = repo.find_by_username(&body.username).await? else {
        return Err(ServerError::Unauthorized(BAD_CREDENTIALS.to_owned()));
    };

    if state.crypto.decrypt(&user.password) != body.password {
        return Err(ServerError::Unauthorized(BAD_CREDENTIALS.to_owned()));
    }

    if !user.is_verified {
        return Err(ServerError::Unauthorized(
            "Debes verificar tu correo electrónico antes de iniciar sesión."
                .to_owned(),
        ));
    }

    if !user.is_active {
        return Err(ServerError::Unauthorized(
            "Esta cuenta está desactivada.".to_owned(),
        ));
    }

    tracing::debug!(user_id = user.id, "user logged in");

    Ok(Json(user.decrypted(&state.crypto)))
}
