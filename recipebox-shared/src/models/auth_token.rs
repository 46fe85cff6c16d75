/// Authentication token model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE auth_tokens (
///     id BIGSERIAL PRIMARY KEY,
///     user_id BIGINT NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     token_hash CHAR(64) NOT NULL UNIQUE,
///     token_prefix VARCHAR(8) NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     last_used_at TIMESTAMPTZ
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;

use super::user::{User, USER_COLUMNS};
use crate::auth::token::{generate_token, hash_token, token_prefix};

/// Issued authentication token (digest only)
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct AuthToken {
    pub id: i64,

    /// Owner of the token
    pub user_id: i64,

    /// SHA-256 hex digest of the plaintext token
    #[serde(skip_serializing)]
    pub token_hash: String,

    /// First characters of the plaintext, for identification in logs
    pub token_prefix: String,

    pub created_at: DateTime<Utc>,

    pub last_used_at: Option<DateTime<Utc>>,
}

impl AuthToken {
    /// Issues a new token for a user
    ///
    /// # Returns
    ///
    /// Tuple of (stored_token, plaintext). The plaintext is not recoverable
    /// afterwards.
    pub async fn create(pool: &PgPool, user_id: i64) -> Result<(Self, String), sqlx::Error> {
        let (plaintext, digest) = generate_token();

        let token = sqlx::query_as::<_, AuthToken>(
            r#"
            INSERT INTO auth_tokens (user_id, token_hash, token_prefix)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, token_hash, token_prefix, created_at, last_used_at
            "#,
        )
        .bind(user_id)
        .bind(digest)
        .bind(token_prefix(&plaintext))
        .fetch_one(pool)
        .await?;

        Ok((token, plaintext))
    }

    /// Resolves a plaintext token to its owner and stamps `last_used_at`
    pub async fn find_user(pool: &PgPool, plaintext: &str) -> Result<Option<User>, sqlx::Error> {
        let columns = USER_COLUMNS
            .split(", ")
            .map(|c| format!("u.{}", c))
            .collect::<Vec<_>>()
            .join(", ");

        let query = format!(
            r#"
            WITH used AS (
                UPDATE auth_tokens
                SET last_used_at = NOW()
                WHERE token_hash = $1
                RETURNING user_id
            )
            SELECT {}
            FROM used
            JOIN users u ON u.id = used.user_id
            "#,
            columns
        );

        sqlx::query_as::<_, User>(&query)
            .bind(hash_token(plaintext))
            .fetch_optional(pool)
            .await
    }
}
