//! HTTP API routes.

pub mod leaderboard;
pub mod lessons;
pub mod users;

use axum::Json;
use axum::extract::{FromRequest, Request, State};
use serde::{Deserialize, Serialize};

use crate::{AppState, ServerError};

/// Plain `{"message": ...}` acknowledgement body.
#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

impl Message {
    pub fn new(message: impl Into<String>) -> Json<Self> {
        Json(Self {
            message: message.into(),
        })
    }
}

/// JSON extractor routing rejections through [`ServerError`] so malformed
/// bodies produce the same `{"message"}` error shape as everything else.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    Json<T>: FromRequest<S, Rejection = axum::extract::rejection::JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ServerError;

    async fn from_request(
        req: Request,
        state: &S,
    ) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(AppJson(value))
    }
}

/// Instance metadata, consumed by deployment checks.
pub async fn status(
    State(state): State<AppState>,
) -> Json<crate::config::Configuration> {
    Json(state.config.as_ref().clone())
}

#[cfg(test)]
pub fn state(pool: sqlx::SqlitePool) -> AppState {
    use std::sync::Arc;

    const TEST_KEY: &str = "EuskalIA_Secret_Key_2024_Security";

    AppState {
        config: Arc::new(crate::config::Configuration::default()),
        db: crate::database::Database { sqlite: pool },
        crypto: Arc::new(crate::crypto::Cipher::new(TEST_KEY).unwrap()),
        mail: crate::mail::Mailer::default(),
    }
}
