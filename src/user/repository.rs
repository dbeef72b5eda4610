//! Handle database requests.

use sqlx::SqlitePool;

use crate::error::Result;
use crate::user::User;

const USER_COLUMNS: &str = r#"id, username, nickname, email, password,
    joined_at, language, is_verified, verification_token, token_expiration,
    is_active, deactivation_token, deactivation_expiration, deletion_code,
    code_expiration"#;

#[derive(Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    /// Create a new [`UserRepository`].
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Insert [`User`] into database, returning its generated id.
    pub async fn insert(&self, user: &User) -> Result<i64> {
        let record = sqlx::query_scalar::<_, i64>(
            r#"INSERT INTO users (username, nickname, email, password,
                joined_at, language, is_verified, verification_token,
                token_expiration, is_active)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                RETURNING id"#,
        )
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password)
        .bind(user.joined_at)
        .bind(&user.language)
        .bind(user.is_verified)
        .bind(&user.verification_token)
        .bind(user.token_expiration)
        .bind(user.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(record)
    }

    /// Find current user using `id` field.
    pub async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let query = get_by_field_query(Field::Id);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find current user using the plaintext `username` field.
    pub async fn find_by_username(
        &self,
        username: &str,
    ) -> Result<Option<User>> {
        let query = get_by_field_query(Field::Username);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find current user using `verification_token` field.
    pub async fn find_by_verification_token(
        &self,
        token: &str,
    ) -> Result<Option<User>> {
        let query = get_by_field_query(Field::VerificationToken);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Find current user using `deactivation_token` field.
    pub async fn find_by_deactivation_token(
        &self,
        token: &str,
    ) -> Result<Option<User>> {
        let query = get_by_field_query(Field::DeactivationToken);

        let user = sqlx::query_as::<_, User>(&query)
            .bind(token)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// All users. Required by the duplicate-email check at registration,
    /// which has to decrypt every stored email. O(n) per registration; a
    /// known scalability liability kept for behavioral parity.
    pub async fn all(&self) -> Result<Vec<User>> {
        let query = format!("SELECT {USER_COLUMNS} FROM users");

        let users = sqlx::query_as::<_, User>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }

    /// Number of user rows.
    pub async fn count(&self) -> Result<i64> {
        let count =
            sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
                .fetch_one(&self.pool)
                .await?;

        Ok(count)
    }

    /// Update current user.
    pub async fn update(&self, user: &User) -> Result<()> {
        sqlx::query(
            r#"UPDATE users
                SET username = $1, nickname = $2, email = $3, password = $4,
                    language = $5, is_verified = $6, verification_token = $7,
                    token_expiration = $8, is_active = $9,
                    deactivation_token = $10, deactivation_expiration = $11,
                    deletion_code = $12, code_expiration = $13
                WHERE id = $14"#,
        )
        .bind(&user.username)
        .bind(&user.nickname)
        .bind(&user.email)
        .bind(&user.password)
        .bind(&user.language)
        .bind(user.is_verified)
        .bind(&user.verification_token)
        .bind(user.token_expiration)
        .bind(user.is_active)
        .bind(&user.deactivation_token)
        .bind(user.deactivation_expiration)
        .bind(&user.deletion_code)
        .bind(user.code_expiration)
        .bind(user.id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Delete current user. Progress and lesson scores cascade.
    pub async fn delete(&self, user_id: i64) -> Result<()> {
        sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}

#[derive(Debug, Clone)]
enum Field {
    Id,
    Username,
    VerificationToken,
    DeactivationToken,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            Field::Id => write!(f, "id"),
            Field::Username => write!(f, "username"),
            Field::VerificationToken => write!(f, "verification_token"),
            Field::DeactivationToken => write!(f, "deactivation_token"),
        }
    }
}

fn get_by_field_query(field: Field) -> String {
    format!("SELECT {USER_COLUMNS} FROM users WHERE {field} = $1")
}
