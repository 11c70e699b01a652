use super::{KeyTtl, KeyValueStore};
use crate::error::{AuthError, Result};
use async_trait::async_trait;
use dashmap::DashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_live(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |at| at > now)
    }
}

/// In-process [`KeyValueStore`] with lazy expiry.
///
/// Expiry is measured on the Tokio clock, so tests running with a paused
/// runtime can move time forward with `tokio::time::advance`.
#[derive(Clone, Default)]
pub struct MemoryKeyValueStore {
    entries: Arc<DashMap<String, Entry>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value with no expiry at all.
    pub fn set_persistent(&self, key: &str, value: &str) {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: None,
            },
        );
    }

    /// Number of live keys.
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries.iter().filter(|e| e.value().is_live(now)).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn live(&self, key: &str) -> Option<Entry> {
        let now = Instant::now();
        let expired = match self.entries.get(key) {
            Some(entry) if entry.is_live(now) => return Some(entry.value().clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            self.entries.remove_if(key, |_, entry| !entry.is_live(now));
        }
        None
    }
}

fn glob_matches(pattern: &str, key: &str) -> bool {
    match pattern.strip_suffix('*') {
        Some(prefix) => key.starts_with(prefix),
        None => key == pattern,
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.live(key).map(|entry| entry.value))
    }

    async fn set_ex(&self, key: &str, value: &str, ttl: Duration) -> Result<()> {
        self.entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: Some(Instant::now() + ttl),
            },
        );
        Ok(())
    }

    async fn incr_with_expiry(&self, key: &str, ttl: Duration) -> Result<i64> {
        let now = Instant::now();
        let mut entry = self.entries.entry(key.to_string()).or_insert_with(|| Entry {
            value: "0".to_string(),
            expires_at: None,
        });

        let current: i64 = if entry.is_live(now) {
            entry
                .value
                .parse()
                .map_err(|_| AuthError::Redis("value is not an integer or out of range".to_string()))?
        } else {
            0
        };

        let next = current + 1;
        *entry = Entry {
            value: next.to_string(),
            expires_at: Some(now + ttl),
        };
        Ok(next)
    }

    async fn ttl(&self, key: &str) -> Result<KeyTtl> {
        let now = Instant::now();
        Ok(match self.live(key) {
            None => KeyTtl::Missing,
            Some(Entry {
                expires_at: None, ..
            }) => KeyTtl::Persistent,
            Some(Entry {
                expires_at: Some(at),
                ..
            }) => KeyTtl::Expires(at.saturating_duration_since(now)),
        })
    }

    async fn scan(&self, pattern: &str) -> Result<Vec<String>> {
        let now = Instant::now();
        // Lapsed entries are only reclaimed when touched; a scan touches them all
        self.entries.retain(|_, entry| entry.is_live(now));

        let mut keys: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| glob_matches(pattern, entry.key()))
            .map(|entry| entry.key().clone())
            .collect();
        keys.sort();
        Ok(keys)
    }

    async fn del(&self, key: &str) -> Result<bool> {
        let now = Instant::now();
        Ok(self
            .entries
            .remove(key)
            .map(|(_, entry)| entry.is_live(now))
            .unwrap_or(false))
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        Ok(self.live(key).is_some())
    }
}
