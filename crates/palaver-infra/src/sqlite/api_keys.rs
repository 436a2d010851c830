//! Local users and their bearer tokens.
//!
//! Tokens are `plv_` followed by 64 hex chars. Only the SHA-256 digest is
//! stored; the plaintext is returned once from [`SqliteApiKeyStore::create_user`].

use chrono::Utc;
use rand::RngCore;
use sha2::{Digest, Sha256};
use sqlx::Row;
use uuid::Uuid;

use palaver_types::error::RepositoryError;
use palaver_types::identity::UserProfile;

use super::chat::format_datetime;
use super::pool::DatabasePool;

const TOKEN_PREFIX: &str = "plv_";

/// Compute SHA-256 hash of an API key (lowercase hex).
pub fn hash_api_key(key: &str) -> String {
    let digest = Sha256::digest(key.as_bytes());
    format!("{:x}", digest)
}

/// Generate a fresh plaintext token.
pub fn generate_api_key() -> String {
    let mut key_bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut key_bytes);
    format!(
        "{TOKEN_PREFIX}{}",
        key_bytes.iter().map(|b| format!("{b:02x}")).collect::<String>()
    )
}

#[derive(Clone)]
pub struct SqliteApiKeyStore {
    pool: DatabasePool,
}

impl SqliteApiKeyStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }

    /// Create a user with one API key. Returns the user and the plaintext key.
    pub async fn create_user(
        &self,
        email: &str,
        display_name: Option<&str>,
    ) -> Result<(UserProfile, String), RepositoryError> {
        let user = UserProfile {
            id: Uuid::now_v7().to_string(),
            email: email.trim().to_string(),
            display_name: display_name.map(str::to_string),
            avatar_url: None,
        };
        let now = format_datetime(&Utc::now());

        sqlx::query("INSERT INTO users (id, email, display_name, created_at) VALUES (?, ?, ?, ?)")
            .bind(&user.id)
            .bind(&user.email)
            .bind(&user.display_name)
            .bind(&now)
            .execute(&self.pool.writer)
            .await
            .map_err(|e| match e {
                sqlx::Error::Database(db) if db.is_unique_violation() => {
                    RepositoryError::Conflict(format!("user {} already exists", user.email))
                }
                other => RepositoryError::Query(other.to_string()),
            })?;

        let key = self.issue_key(&user.id, "default").await?;
        Ok((user, key))
    }

    /// Issue another key for an existing user.
    pub async fn issue_key(&self, user_id: &str, name: &str) -> Result<String, RepositoryError> {
        let key = generate_api_key();
        sqlx::query(
            "INSERT INTO api_keys (id, user_id, key_hash, name, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(Uuid::now_v7().to_string())
        .bind(user_id)
        .bind(hash_api_key(&key))
        .bind(name)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool.writer)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        Ok(key)
    }

    /// Look up the user owning `key`. Bumps `last_used_at` best effort.
    pub async fn find_user_by_key(&self, key: &str) -> Result<Option<UserProfile>, RepositoryError> {
        let row = sqlx::query(
            r#"SELECT k.id AS key_id, u.id, u.email, u.display_name
               FROM api_keys k JOIN users u ON u.id = k.user_id
               WHERE k.key_hash = ?"#,
        )
        .bind(hash_api_key(key))
        .fetch_optional(&self.pool.reader)
        .await
        .map_err(|e| RepositoryError::Query(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };

        let key_id: String = row.get("key_id");
        if let Err(e) = sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(format_datetime(&Utc::now()))
            .bind(&key_id)
            .execute(&self.pool.writer)
            .await
        {
            tracing::debug!(error = %e, "Failed to update api key last_used_at");
        }

        Ok(Some(UserProfile {
            id: row.try_get("id").map_err(|e| RepositoryError::Query(e.to_string()))?,
            email: row
                .try_get("email")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            display_name: row
                .try_get("display_name")
                .map_err(|e| RepositoryError::Query(e.to_string()))?,
            avatar_url: None,
        }))
    }

    pub async fn list_users(&self) -> Result<Vec<UserProfile>, RepositoryError> {
        let rows = sqlx::query("SELECT id, email, display_name FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool.reader)
            .await
            .map_err(|e| RepositoryError::Query(e.to_string()))?;

        rows.iter()
            .map(|row| {
                Ok(UserProfile {
                    id: row.try_get("id")?,
                    email: row.try_get("email")?,
                    display_name: row.try_get("display_name")?,
                    avatar_url: None,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| RepositoryError::Query(e.to_string()))
    }
}
