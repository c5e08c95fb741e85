use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use redis::AsyncCommands;
use redis::aio::ConnectionManager;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::{error::Result, models::session::SessionRecord};

/// Server-side session records keyed by the id in the session cookie.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads a session; expired records are never returned.
    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>>;

    /// Creates or overwrites a session until its `expires_at`.
    async fn save(&self, id: Uuid, record: &SessionRecord) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Number of stored sessions that triggers the first sweep of expired ones.
const SWEEP_THRESHOLD: usize = 1024;

struct SessionTable {
    records: HashMap<Uuid, SessionRecord>,
    /// Size at which `save` next drops expired records.
    sweep_at: usize,
}

impl Default for SessionTable {
    fn default() -> Self {
        Self {
            records: HashMap::new(),
            sweep_at: SWEEP_THRESHOLD,
        }
    }
}

impl SessionTable {
    /// Drops expired records once the table has grown to `sweep_at`.
    ///
    /// The next sweep waits until the table doubles past what survived, so
    /// sweeping stays amortized constant per save.
    fn sweep_if_due(&mut self) {
        if self.records.len() < self.sweep_at {
            return;
        }

        let before = self.records.len();
        let now = Utc::now();
        self.records.retain(|_, record| !record.is_expired(now));
        self.sweep_at = (self.records.len() * 2).max(SWEEP_THRESHOLD);

        tracing::debug!(
            "🧹 Swept {} expired sessions, {} remain",
            before - self.records.len(),
            self.records.len()
        );
    }
}

/// Sessions held in process memory.
#[derive(Default)]
pub struct MemorySessionStore {
    sessions: RwLock<SessionTable>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        let mut sessions = self.sessions.write().await;
        match sessions.records.get(&id) {
            Some(record) if record.is_expired(Utc::now()) => {
                sessions.records.remove(&id);
                Ok(None)
            }
            Some(record) => Ok(Some(record.clone())),
            None => Ok(None),
        }
    }

    async fn save(&self, id: Uuid, record: &SessionRecord) -> Result<()> {
        let mut sessions = self.sessions.write().await;
        sessions.sweep_if_due();
        sessions.records.insert(id, record.clone());
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.sessions.write().await.records.remove(&id);
        Ok(())
    }
}

/// Sessions stored as JSON under `session:{id}` with a Redis TTL.
#[derive(Clone)]
pub struct RedisSessionStore {
    redis: ConnectionManager,
}

impl RedisSessionStore {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }
}

fn session_key(id: Uuid) -> String {
    format!("session:{}", id)
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, id: Uuid) -> Result<Option<SessionRecord>> {
        let session_json: Option<String> = self.redis.clone().get(session_key(id)).await?;

        let Some(session_json) = session_json else {
            return Ok(None);
        };

        let record: SessionRecord = sonic_rs::from_str(&session_json)?;
        if record.is_expired(Utc::now()) {
            return Ok(None);
        }
        Ok(Some(record))
    }

    async fn save(&self, id: Uuid, record: &SessionRecord) -> Result<()> {
        let session_json = sonic_rs::to_string(record)?;
        let expiration_seconds = (record.expires_at - Utc::now()).num_seconds().max(1) as u64;

        let _: () = self
            .redis
            .clone()
            .set_ex(session_key(id), &session_json, expiration_seconds)
            .await
            .map_err(|e| {
                tracing::error!("❌ Redis set_ex failed: {}", e);
                e
            })?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let _: () = self.redis.clone().del(session_key(id)).await?;
        Ok(())
    }
}
