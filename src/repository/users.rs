//! Users repository for database operations

use sqlx::{Pool, Postgres};

use super::map_write_error;
use crate::{
    error::AppResult,
    models::{Capability, User},
};

#[derive(Clone)]
pub struct UsersRepository {
    pool: Pool<Postgres>,
}

impl UsersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }

    /// Get user by username (case-insensitive)
    pub async fn find_by_username(&self, username: &str) -> AppResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password_hash FROM users WHERE LOWER(username) = LOWER($1)",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Capabilities granted to a user; unknown codenames are skipped
    pub async fn capabilities(&self, user_id: i32) -> AppResult<Vec<Capability>> {
        let codenames: Vec<String> = sqlx::query_scalar(
            "SELECT capability FROM user_capabilities WHERE user_id = $1 ORDER BY capability",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(codenames
            .iter()
            .filter_map(|c| match c.parse::<Capability>() {
                Ok(capability) => Some(capability),
                Err(e) => {
                    tracing::warn!("Ignoring capability of user {}: {}", user_id, e);
                    None
                }
            })
            .collect())
    }

    /// Create a user with the given capabilities
    pub async fn create(
        &self,
        username: &str,
        password_hash: &str,
        capabilities: &[Capability],
    ) -> AppResult<User> {
        let mut tx = self.pool.begin().await?;

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING id, username, password_hash
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_write_error)?;

        let codenames: Vec<&str> = capabilities.iter().map(Capability::as_str).collect();
        sqlx::query(
            r#"
            INSERT INTO user_capabilities (user_id, capability)
            SELECT $1, UNNEST($2::varchar[])
            "#,
        )
        .bind(user.id)
        .bind(&codenames)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;
        Ok(user)
    }
}
