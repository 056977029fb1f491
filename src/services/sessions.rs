//! Per-session key/value storage and the home-page visit counter

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::AppResult;

/// Session key holding the home-page visit count
pub const NUM_VISITS: &str = "num_visits";

/// Opaque session handle, carried in the `sessionid` cookie
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    /// Start a fresh session
    pub fn generate() -> Self {
        Self(Uuid::new_v4().simple().to_string())
    }

    /// Accept a client-supplied handle; anything but 1-64 ASCII alphanumerics is refused
    pub fn parse(raw: &str) -> Option<Self> {
        let valid = !raw.is_empty()
            && raw.len() <= 64
            && raw.chars().all(|c| c.is_ascii_alphanumeric());
        valid.then(|| Self(raw.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Integer values scoped to a session
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn get(&self, session: &SessionId, key: &str) -> AppResult<Option<i64>>;
    /// Add one to `key` (missing counts as 0) in a single step and return the new value
    async fn increment(&self, session: &SessionId, key: &str) -> AppResult<i64>;
}

/// In-process session store; data is lost on restart
#[derive(Default)]
pub struct MemorySessionStore {
    entries: Mutex<HashMap<(SessionId, String), i64>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get(&self, session: &SessionId, key: &str) -> AppResult<Option<i64>> {
        let entries = self.entries.lock().await;
        Ok(entries.get(&(session.clone(), key.to_string())).copied())
    }

    async fn increment(&self, session: &SessionId, key: &str) -> AppResult<i64> {
        let mut entries = self.entries.lock().await;
        let value = entries.entry((session.clone(), key.to_string())).or_insert(0);
        *value += 1;
        Ok(*value)
    }
}

/// Counts home-page visits per session
#[derive(Clone)]
pub struct VisitCounter {
    store: Arc<dyn SessionStore>,
}

impl VisitCounter {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self { store }
    }

    /// Record one visit and return the count as it was before this visit
    pub async fn record_visit(&self, session: &SessionId) -> AppResult<i64> {
        let visits = self.store.increment(session, NUM_VISITS).await? - 1;
        tracing::debug!(session = %session, visits, "Recorded visit");
        Ok(visits)
    }
}
