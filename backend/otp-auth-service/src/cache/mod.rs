/// Ephemeral key-value storage
///
/// OTP codes, rate counters, device session bindings and blacklist entries all
/// live behind [`KeyValueStore`], each under its own key prefix. Every operation
/// is atomic on its key; nothing here spans keys.
///
/// - `RedisKeyValueStore`: production backend (raw Redis commands)
/// - `MemoryKeyValueStore`: in-process backend for tests and local runs
mod memory;
mod redis_store;

pub use self::memory::MemoryKeyValueStore;
pub use self::redis_store::RedisKeyValueStore;

use crate::error::Result;
use async_trait::async_trait;
use std::time::Duration;

/// Remaining lifetime of a key, mirroring Redis `TTL` semantics
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyTtl {
    /// Key does not exist (`-2`)
    Missing,
    /// Key exists without an expiry (`-1`)
    Persistent,
    /// Key expires after the given duration
    Expires(Duration),
}

impl KeyTtl {
    /// Convert a raw Redis `TTL` reply.
    pub fn from_redis_reply(secs: i64) -> Self {
        match secs {
            -2 => KeyTtl::Missing,
            s if s < 0 => KeyTtl::Persistent,
            s => KeyTtl::Expires(Duration::from_secs(s as u64)),
        }
    }

    /// True when the key has no positive residual lifetime.
    pub fn is_non_positive(&self) -> bool {
        match self {
            KeyTtl::Missing | KeyTtl::Persistent => true,
            KeyTtl::Expires(d) => d.is_zero(),
        }
    }
}

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Set `key` to `value`, replacing any previous value and expiry.
    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()>;

    /// Increment an integer counter (creating it at 1) and arm its expiry to
    /// `ttl` as a single atomic step. The counter is never left without an expiry.
    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64>;

    async fn ttl(&self, key: &str) -> Result<KeyTtl>;

    /// Keys matching a glob pattern (only trailing `*` is relied upon).
    async fn scan(&self, pattern: &str) -> Result<Vec<String>>;

    /// Delete a key. Returns whether it existed.
    async fn del(&self, key: &str) -> Result<bool>;

    async fn exists(&self, key: &str) -> Result<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ttl_reply_mapping() {
        assert_eq!(KeyTtl::from_redis_reply(-2), KeyTtl::Missing);
        assert_eq!(KeyTtl::from_redis_reply(-1), KeyTtl::Persistent);
        assert_eq!(
            KeyTtl::from_redis_reply(30),
            KeyTtl::Expires(Duration::from_secs(30))
        );
    }

    #[test]
    fn non_positive_lifetimes() {
        assert!(KeyTtl::Persistent.is_non_positive());
        assert!(KeyTtl::Expires(Duration::ZERO).is_non_positive());
        assert!(!KeyTtl::Expires(Duration::from_secs(1)).is_non_positive());
    }
}
