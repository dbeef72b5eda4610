//! Error handler for the EuskalIA server.

use axum::extract::rejection::JsonRejection;
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use sqlx::Error as SQLxError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ServerError>;

/// Enum representing server-side errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Validation failures and expired tokens/codes. The mobile client
    /// displays `message` as-is, so these stay user-facing Spanish.
    #[error("{0}")]
    BadRequest(String),

    /// Credential, verification and deactivation state errors.
    #[error("{0}")]
    Unauthorized(String),

    #[error("resource not found")]
    NotFound,

    #[error(transparent)]
    Axum(#[from] JsonRejection),

    #[error("SQL request failed: {0}")]
    Sql(#[from] SQLxError),

    #[error(transparent)]
    Crypto(#[from] crate::crypto::CryptoError),

    #[error("internal server error, {details}")]
    Internal { details: String },
}

/// Error body as expected by the mobile client: `{"message": "..."}`.
#[derive(Debug, Serialize)]
struct ResponseError {
    message: String,
}

impl ResponseError {
    fn into_response(self, status: StatusCode) -> Response {
        match serde_json::to_string(&self) {
            Ok(body) => Response::builder()
                .status(status)
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.into())
                .unwrap_or_else(|_| internal_server_error()),
            Err(_) => internal_server_error(),
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ServerError::BadRequest(message) => {
                (StatusCode::BAD_REQUEST, message)
            },
            ServerError::Unauthorized(message) => {
                (StatusCode::UNAUTHORIZED, message)
            },
            ServerError::NotFound
            | ServerError::Sql(SQLxError::RowNotFound) => {
                (StatusCode::NOT_FOUND, "No encontrado.".to_owned())
            },
            ServerError::Axum(err) => {
                (StatusCode::BAD_REQUEST, err.body_text())
            },
            ServerError::Sql(err) => {
                tracing::error!(error = %err, "sql request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error en el servidor.".to_owned(),
                )
            },
            ServerError::Crypto(err) => {
                tracing::error!(error = %err, "field encryption failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error en el servidor.".to_owned(),
                )
            },
            ServerError::Internal { details } => {
                tracing::error!(%details, "server returned 500 status");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Error en el servidor.".to_owned(),
                )
            },
        };

        ResponseError { message }.into_response(status)
    }
}

fn internal_server_error() -> Response {
    Response::builder()
        .status(StatusCode::INTERNAL_SERVER_ERROR)
        .header(header::CONTENT_TYPE, "application/json")
        .body(
            serde_json::json!({ "message": "Error en el servidor." })
                .to_string()
                .into(),
        )
        .unwrap_or_else(|_| Response::new("Error en el servidor.".into()))
}
