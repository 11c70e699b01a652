/// Token Revocation Management
///
/// Logged-out tokens are blacklisted until they could no longer validate anyway.
///
/// ## Storage
///
/// - Key: `blacklist:{sha256(token)}`, so raw tokens never sit in the cache
/// - Value: `"1"`
/// - TTL: the maximum token lifetime, whatever the token's actual remaining life
///
/// ## Sweep
///
/// [`RevocationRegistry::sweep_expired`] deletes blacklist keys that carry no
/// positive lifetime. Keys written by [`RevocationRegistry::revoke`] always
/// expire on their own; the sweep catches entries created without an expiry
/// and stores that do not expire keys natively.
use crate::cache::{KeyTtl, KeyValueStore};
use crate::error::Result;
use crypto_core::sha256_hex;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const BLACKLIST_PREFIX: &str = "blacklist:";

/// Counters from one sweep pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub scanned: usize,
    pub removed: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct RevocationRegistry {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl RevocationRegistry {
    /// `ttl` should equal the maximum session token lifetime.
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    /// Blacklist a token. The token is not parsed, so malformed values are
    /// accepted too.
    pub async fn revoke(&self, token: &str) -> Result<()> {
        self.kv.set_ex(&blacklist_key(token), "1", self.ttl).await?;
        info!(
            ttl_secs = self.ttl.as_secs(),
            "Token revoked, blacklist entry will expire on its own"
        );
        Ok(())
    }

    /// Pure existence check; store failures are returned, not interpreted.
    pub async fn is_revoked(&self, token: &str) -> Result<bool> {
        self.kv.exists(&blacklist_key(token)).await
    }

    /// Delete blacklist entries with no positive residual lifetime.
    ///
    /// Per-key failures are logged and counted; the pass carries on. Only a
    /// failure to enumerate the key space aborts it.
    pub async fn sweep_expired(&self) -> Result<SweepReport> {
        let keys = self.kv.scan(&format!("{}*", BLACKLIST_PREFIX)).await?;
        let mut report = SweepReport {
            scanned: keys.len(),
            ..SweepReport::default()
        };

        for key in keys {
            match self.kv.ttl(&key).await {
                // Expired between SCAN and TTL
                Ok(KeyTtl::Missing) => continue,
                Ok(ttl) if ttl.is_non_positive() => match self.kv.del(&key).await {
                    Ok(_) => {
                        debug!(key = %key, "Removed stale blacklist entry");
                        report.removed += 1;
                    }
                    Err(e) => {
                        warn!(key = %key, error = %e, "Failed to delete blacklist entry");
                        report.failed += 1;
                    }
                },
                Ok(_) => {}
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to read blacklist entry TTL");
                    report.failed += 1;
                }
            }
        }

        Ok(report)
    }
}

fn blacklist_key(token: &str) -> String {
    format!("{}{}", BLACKLIST_PREFIX, sha256_hex(token.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryKeyValueStore;

    const DAY: Duration = Duration::from_secs(24 * 3600);

    fn registry() -> (MemoryKeyValueStore, RevocationRegistry) {
        let kv = MemoryKeyValueStore::new();
        let registry = RevocationRegistry::new(Arc::new(kv.clone()), DAY);
        (kv, registry)
    }

    #[test]
    fn test_blacklist_key_hides_token() {
        let key = blacklist_key("header.payload.signature");
        assert!(key.starts_with("blacklist:"));
        assert!(!key.contains("payload"));
        assert_eq!(key.len(), "blacklist:".len() + 64);
    }

    #[tokio::test]
    async fn test_revoke_then_is_revoked() {
        let (_, registry) = registry();
        assert!(!registry.is_revoked("tok-a").await.unwrap());

        registry.revoke("tok-a").await.unwrap();

        assert!(registry.is_revoked("tok-a").await.unwrap());
        assert!(!registry.is_revoked("tok-b").await.unwrap());
    }

    #[tokio::test]
    async fn test_revoke_accepts_malformed_tokens() {
        let (_, registry) = registry();
        registry.revoke("").await.unwrap();
        registry.revoke("not a jwt").await.unwrap();
        assert!(registry.is_revoked("not a jwt").await.unwrap());
    }

    #[tokio::test(start_paused = true)]
    async fn test_entries_lapse_after_token_lifetime() {
        let (_, registry) = registry();
        registry.revoke("tok-a").await.unwrap();

        tokio::time::advance(DAY - Duration::from_secs(1)).await;
        assert!(registry.is_revoked("tok-a").await.unwrap());

        tokio::time::advance(Duration::from_secs(1)).await;
        assert!(!registry.is_revoked("tok-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_removes_only_entries_without_lifetime() {
        let (kv, registry) = registry();
        registry.revoke("live-token").await.unwrap();
        kv.set_persistent("blacklist:stale", "1");
        kv.set_persistent("otp:+15550000001", "123456");

        let report = registry.sweep_expired().await.unwrap();

        assert_eq!(
            report,
            SweepReport {
                scanned: 2,
                removed: 1,
                failed: 0
            }
        );
        assert!(registry.is_revoked("live-token").await.unwrap());
        assert!(!kv.exists("blacklist:stale").await.unwrap());
        assert!(kv.exists("otp:+15550000001").await.unwrap());
    }

    #[tokio::test]
    async fn test_sweep_of_empty_key_space() {
        let (_, registry) = registry();
        assert_eq!(registry.sweep_expired().await.unwrap(), SweepReport::default());
    }
}
