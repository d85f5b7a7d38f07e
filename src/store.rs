//! Per-entity metadata store.
//!
//! The correlator keeps three kinds of state here: thread bindings,
//! one-shot idempotency markers, and short-lived suppression markers.
//! [`RedisMetaStore`] backs production deployments; [`MemoryMetaStore`]
//! serves tests and single-process setups without Redis. Both guarantee
//! the atomicity the correlator relies on: `put_if_absent` is a single
//! compare-free SET NX, so the first writer wins and ties need no further
//! adjudication.

use crate::error::{NotifierError, NotifierResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::time::{Duration, Instant};

/// Key-value store for correlation state
#[async_trait]
pub trait MetaStore: Send + Sync {
    /// Fetch a value, or `None` when absent or expired
    async fn get(&self, key: &str) -> NotifierResult<Option<String>>;

    /// Store a value only when the key is absent; returns whether this
    /// call performed the write
    async fn put_if_absent(&self, key: &str, value: &str) -> NotifierResult<bool>;

    /// Store a value that expires after `ttl`
    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> NotifierResult<()>;

    /// True when the key exists and has not expired
    async fn exists(&self, key: &str) -> NotifierResult<bool>;
}

/// In-process store with TTL support
#[derive(Default)]
pub struct MemoryMetaStore {
    entries: RwLock<HashMap<String, Entry>>,
}

struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

impl MemoryMetaStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MetaStore for MemoryMetaStore {
    async fn get(&self, key: &str) -> NotifierResult<Option<String>> {
        let entries = self.entries.read();
        Ok(entries
            .get(key)
            .filter(|entry| !entry.expired())
            .map(|entry| entry.value.clone()))
    }

    async fn put_if_absent(&self, key: &str, value: &str) -> NotifierResult<bool> {
        let mut entries = self.entries.write();
        match entries.get(key) {
            Some(entry) if !entry.expired() => Ok(false),
            _ => {
                entries.insert(
                    key.to_string(),
                    Entry {
                        value: value.to_string(),
                        expires_at: None,
                    },
                );
                Ok(true)
            }
        }
    }

    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> NotifierResult<()> {
        let mut entries = self.entries.write();
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn exists(&self, key: &str) -> NotifierResult<bool> {
        let entries = self.entries.read();
        Ok(entries.get(key).is_some_and(|entry| !entry.expired()))
    }
}

/// Redis-backed store
pub struct RedisMetaStore {
    pool: deadpool_redis::Pool,
}

impl RedisMetaStore {
    /// Create the pool and verify connectivity with a PING
    pub async fn connect(url: &str) -> NotifierResult<Self> {
        let config = deadpool_redis::Config::from_url(url);
        let pool = config
            .create_pool(Some(deadpool_redis::Runtime::Tokio1))
            .map_err(|e| NotifierError::configuration(format!("Redis pool creation failed: {e}")))?;

        let mut conn = pool.get().await?;
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;

        Ok(Self { pool })
    }
}

#[async_trait]
impl MetaStore for RedisMetaStore {
    async fn get(&self, key: &str) -> NotifierResult<Option<String>> {
        let mut conn = self.pool.get().await?;
        let value: Option<String> = redis::cmd("GET").arg(key).query_async(&mut conn).await?;
        Ok(value)
    }

    async fn put_if_absent(&self, key: &str, value: &str) -> NotifierResult<bool> {
        let mut conn = self.pool.get().await?;
        // SET NX returns OK on write, nil when the key already exists
        let written: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .query_async(&mut conn)
            .await?;
        Ok(written.is_some())
    }

    async fn put_with_ttl(&self, key: &str, value: &str, ttl: Duration) -> NotifierResult<()> {
        let mut conn = self.pool.get().await?;
        redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("PX")
            .arg(ttl.as_millis() as u64)
            .query_async::<_, ()>(&mut conn)
            .await?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> NotifierResult<bool> {
        let mut conn = self.pool.get().await?;
        let count: i64 = redis::cmd("EXISTS").arg(key).query_async(&mut conn).await?;
        Ok(count > 0)
    }
}
