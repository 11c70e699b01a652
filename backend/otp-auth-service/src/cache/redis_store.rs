use super::{KeyTtl, KeyValueStore};
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use redis_utils::SharedConnectionManager;
use std::time::Duration;
use tracing::error;

const SCAN_BATCH: usize = 100;

/// [`KeyValueStore`] over a shared Redis connection manager
#[derive(Clone)]
pub struct RedisKeyValueStore {
    redis: SharedConnectionManager,
    timeout: Duration,
}

impl RedisKeyValueStore {
    pub fn new(redis: SharedConnectionManager) -> Self {
        Self {
            redis,
            timeout: redis_utils::DEFAULT_COMMAND_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn map_err<'a>(command: &'static str, key: &'a str) -> impl FnOnce(redis::RedisError) -> AuthError + 'a {
        move |e| {
            error!(command, key, error = %e, "Redis command failed");
            AuthError::Redis(e.to_string())
        }
    }
}

#[async_trait]
impl KeyValueStore for RedisKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.redis.lock().await.clone();
        redis_utils::with_deadline(self.timeout, async {
            redis::cmd("GET").arg(key).query_async(&mut conn).await
        })
        .await
        .map_err(Self::map_err("GET", key))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.redis.lock().await.clone();
        redis_utils::with_deadline(self.timeout, async {
            redis::cmd("SET")
                .arg(key)
                .arg(value)
                .arg("EX")
                .arg(ttl.as_secs().max(1))
                .query_async::<_, ()>(&mut conn)
                .await
        })
        .await
        .map_err(Self::map_err("SET", key))
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64> {
        let mut conn = self.redis.lock().await.clone();
        // MULTI/EXEC so the counter can never exist without an expiry
        let (count, _armed): (i64, i64) = redis_utils::with_deadline(self.timeout, async {
            redis::pipe()
                .atomic()
                .cmd("INCR")
                .arg(key)
                .cmd("EXPIRE")
                .arg(key)
                .arg(ttl.as_secs().max(1))
                .query_async(&mut conn)
                .await
        })
        .await
        .map_err(Self::map_err("INCR/EXPIRE", key))?;
        Ok(count)
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let mut conn = self.redis.lock().await.clone();
        let secs: i64 = redis_utils::with_deadline(self.timeout, async {
            redis::cmd("TTL").arg(key).query_async(&mut conn).await
        })
        .await
        .map_err(Self::map_err("TTL", key))?;
        Ok(KeyTtl::from_redis_reply(secs))
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.redis.lock().await.clone();
        let mut cursor: u64 = 0;
        let mut keys = Vec::new();

        // Cursor-based SCAN; never KEYS on a shared instance
        loop {
            let (next, batch): (u64, Vec<String>) = redis_utils::with_deadline(self.timeout, async {
                redis::cmd("SCAN")
                    .arg(cursor)
                    .arg("MATCH")
                    .arg(pattern)
                    .arg("COUNT")
                    .arg(SCAN_BATCH)
                    .query_async(&mut conn)
                    .await
            })
            .await
            .map_err(Self::map_err("SCAN", pattern))?;

            keys.extend(batch);
            if next == 0 {
                break;
            }
            cursor = next;
        }

        keys.sort();
        keys.dedup();
        Ok(keys)
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let mut conn = self.redis.lock().await.clone();
        let removed: i64 = redis_utils::with_deadline(self.timeout, async {
            redis::cmd("DEL").arg(key).query_async(&mut conn).await
        })
        .await
        .map_err(Self::map_err("DEL", key))?;
        Ok(removed > 0)
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let mut conn = self.redis.lock().await.clone();
        redis_utils::with_deadline(self.timeout, async {
            redis::cmd("EXISTS").arg(key).query_async(&mut conn).await
        })
        .await
        .map_err(Self::map_err("EXISTS", key))
    }
}
