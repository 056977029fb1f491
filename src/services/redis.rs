//! Redis-backed session store

use async_trait::async_trait;
use redis::{AsyncCommands, Client};

use super::sessions::{SessionId, SessionStore};
use crate::error::{AppError, AppResult};

#[derive(Clone)]
pub struct RedisSessionStore {
    client: Client,
    ttl_seconds: i64,
}

/// Redis takes expiries as a signed count of seconds
fn expiry_seconds(ttl_seconds: u64) -> AppResult<i64> {
    i64::try_from(ttl_seconds).map_err(|_| {
        AppError::Internal(format!("Session TTL of {} seconds is out of range", ttl_seconds))
    })
}

impl RedisSessionStore {
    /// Create a new Redis session store; fails if the server does not answer PING
    pub async fn new(url: &str, ttl_seconds: u64) -> AppResult<Self> {
        let ttl_seconds = expiry_seconds(ttl_seconds)?;
        let client = Client::open(url)
            .map_err(|e| AppError::Internal(format!("Failed to create Redis client: {}", e)))?;

        // Test connection
        let mut conn = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to connect to Redis: {}", e)))?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Redis connection test failed: {}", e)))?;

        Ok(Self { client, ttl_seconds })
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to get Redis connection: {}", e)))
    }

    fn key(session: &SessionId) -> String {
        format!("session:{}", session)
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn get(&self, session: &SessionId, key: &str) -> AppResult<Option<i64>> {
        let mut conn = self.connection().await?;
        conn.hget::<_, _, Option<i64>>(Self::key(session), key)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to read session from Redis: {}", e)))
    }

    /// HINCRBY the value and push the session's expiry forward
    async fn increment(&self, session: &SessionId, key: &str) -> AppResult<i64> {
        let mut conn = self.connection().await?;
        let redis_key = Self::key(session);

        let (value,) = redis::pipe()
            .atomic()
            .hincr(&redis_key, key, 1)
            .expire(&redis_key, self.ttl_seconds)
            .ignore()
            .query_async::<_, (i64,)>(&mut conn)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to write session to Redis: {}", e)))?;
        Ok(value)
    }
}
