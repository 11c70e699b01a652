/// Device session bindings
///
/// Maps `(mobile, fingerprint)` to the token most recently issued for that
/// device, under `device_token:{mobile}:{fingerprint}`. Rebinding overwrites
/// the previous token without revoking it.
use crate::cache::KeyValueStore;
use crate::error::Result;
use crate::models::DeviceFingerprint;
use std::sync::Arc;
use std::time::Duration;

const DEVICE_TOKEN_PREFIX: &str = "device_token:";

#[derive(Clone)]
pub struct SessionBinder {
    kv: Arc<dyn KeyValueStore>,
    ttl: Duration,
}

impl SessionBinder {
    pub fn new(kv: Arc<dyn KeyValueStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    pub async fn bind(&self, mobile: &str, fingerprint: &DeviceFingerprint, token: &str) -> Result<()> {
        self.kv
            .set_ex(&binding_key(mobile, fingerprint.as_str()), token, self.ttl)
            .await
    }

    pub async fn lookup_token(&self, mobile: &str, fingerprint: &str) -> Result<Option<String>> {
        self.kv.get(&binding_key(mobile, fingerprint)).await
    }

    pub async fn unbind(&self, mobile: &str, fingerprint: &str) -> Result<()> {
        self.kv.del(&binding_key(mobile, fingerprint)).await?;
        Ok(())
    }
}

fn binding_key(mobile: &str, fingerprint: &str) -> String {
    format!("{}{}:{}", DEVICE_TOKEN_PREFIX, mobile, fingerprint)
}
