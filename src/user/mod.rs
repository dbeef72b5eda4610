mod repository;

pub use repository::*;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::crypto::Cipher;

/// Languages supported by the client and the mail templates.
pub const SUPPORTED_LANGUAGES: [&str; 5] = ["es", "en", "pl", "eu", "fr"];

pub const DEFAULT_LANGUAGE: &str = "es";

pub fn is_supported_language(language: &str) -> bool {
    SUPPORTED_LANGUAGES.contains(&language)
}

/// User as saved on database.
///
/// `nickname`, `email` and `password` hold ciphertexts; see
/// [`crate::crypto::Cipher`].
#[derive(
    Clone, Debug, Default, PartialEq, Serialize, Deserialize, sqlx::FromRow,
)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    pub username: String,
    pub nickname: String,
    pub email: String,
    #[serde(skip)]
    pub password: String,
    pub joined_at: DateTime<Utc>,
    pub language: String,
    pub is_verified: bool,
    #[serde(skip)]
    pub verification_token: Option<String>,
    #[serde(skip)]
    pub token_expiration: Option<DateTime<Utc>>,
    pub is_active: bool,
    #[serde(skip)]
    pub deactivation_token: Option<String>,
    #[serde(skip)]
    pub deactivation_expiration: Option<DateTime<Utc>>,
    #[serde(skip)]
    pub deletion_code: Option<String>,
    #[serde(skip)]
    pub code_expiration: Option<DateTime<Utc>>,
}

impl User {
    /// Copy of the user with nickname and email decrypted, for responses.
    pub fn decrypted(&self, cipher: &Cipher) -> Self {
        Self {
            nickname: cipher.decrypt(&self.nickname),
            email: cipher.decrypt(&self.email),
            password: String::default(),
            ..self.clone()
        }
    }
}
