//! SQLite database operations
//!
//! All database access goes through this module.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite, SqlitePool};
use std::path::Path;

use super::directory::UserDirectory;
use super::models::*;
use crate::error::{AppError, Result};

/// Database connection pool wrapper.
pub struct Database {
    pool: Pool<Sqlite>,
}

impl Database {
    // =========================================================================
    // Connection
    // =========================================================================

    /// Connect to SQLite database
    ///
    /// Creates the database file if it doesn't exist.
    /// Runs pending migrations automatically.
    ///
    /// # Arguments
    /// * `path` - Path to SQLite database file
    ///
    /// # Errors
    /// Returns error if connection or migration fails
    pub async fn connect(path: &Path) -> Result<Self> {
        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| AppError::Database(sqlx::Error::Io(e)))?;
        }

        let connection_string = format!("sqlite:{}?mode=rwc", path.display());
        let pool = SqlitePool::connect(&connection_string).await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| {
                tracing::error!("Migration failed: {}", e);
                AppError::Internal(anyhow::anyhow!("Migration failed: {}", e))
            })?;

        tracing::info!(path = %path.display(), "Database connected and migrated successfully");

        Ok(Self { pool })
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Get a user row by exact username
    pub async fn get_user(&self, username: &str) -> Result<Option<UserRecord>> {
        let user = sqlx::query_as::<_, UserRecord>("SELECT * FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    /// Insert a user unless the username is already taken.
    ///
    /// # Returns
    /// `true` if inserted, `false` if a row with that username existed.
    pub async fn insert_user(&self, user: &UserRecord) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (
                id, username, public_key_pem, private_key_pem, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(username) DO NOTHING
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.public_key_pem)
        .bind(&user.private_key_pem)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Store key material for a user that has none yet.
    ///
    /// Existing keys are never overwritten.
    ///
    /// # Returns
    /// `true` if the keys were stored.
    pub async fn set_key_pair(
        &self,
        username: &str,
        public_key_pem: &str,
        private_key_pem: &str,
    ) -> Result<bool> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET public_key_pem = ?, private_key_pem = ?, updated_at = ?
            WHERE username = ? AND public_key_pem = ''
            "#,
        )
        .bind(public_key_pem)
        .bind(private_key_pem)
        .bind(Utc::now())
        .bind(username)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// All usernames, sorted
    pub async fn list_usernames(&self) -> Result<Vec<String>> {
        let usernames =
            sqlx::query_scalar::<_, String>("SELECT username FROM users ORDER BY username")
                .fetch_all(&self.pool)
                .await?;

        Ok(usernames)
    }

    /// Number of user rows
    pub async fn count_users(&self) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}

#[async_trait]
impl UserDirectory for Database {
    async fn find_by_username(&self, username: &str) -> Result<Option<ActorIdentity>> {
        Ok(self.get_user(username).await?.map(ActorIdentity::from))
    }

    async fn count(&self) -> Result<u64> {
        let count = self.count_users().await?;
        Ok(u64::try_from(count).unwrap_or(0))
    }
}
