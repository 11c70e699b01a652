/// Registered device bookkeeping on top of the identity store
use crate::db::{DeviceResolution, IdentityStore};
use crate::error::{AuthError, Result};
use crate::models::DeviceFingerprint;
use crate::validators::mask_phone;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub struct DeviceRegistry {
    store: Arc<dyn IdentityStore>,
}

impl DeviceRegistry {
    pub fn new(store: Arc<dyn IdentityStore>) -> Self {
        Self { store }
    }

    pub async fn lookup(&self, mobile: &str, fingerprint: &str) -> Result<bool> {
        self.store.device_exists(mobile, fingerprint).await
    }

    pub async fn register(&self, mobile: &str, fingerprint: &DeviceFingerprint) -> Result<()> {
        self.store.insert_device(mobile, fingerprint.as_str()).await
    }

    /// Reuse the fingerprint if already known, else register it.
    pub async fn resolve(&self, mobile: &str, fingerprint: &DeviceFingerprint) -> Result<DeviceResolution> {
        let resolution = self.store.ensure_device(mobile, fingerprint.as_str()).await?;
        if resolution == DeviceResolution::Registered {
            info!(phone = %mask_phone(mobile), device = %fingerprint, "New device registered");
        }
        Ok(resolution)
    }

    /// Remove one device; `DeviceNotFound` if nothing matched.
    pub async fn remove(&self, mobile: &str, fingerprint: &str) -> Result<()> {
        match self.store.delete_device(mobile, fingerprint).await? {
            0 => Err(AuthError::DeviceNotFound),
            _ => Ok(()),
        }
    }

    pub async fn remove_all_except(&self, mobile: &str, keep: &DeviceFingerprint) -> Result<u64> {
        self.store.delete_devices_except(mobile, keep.as_str()).await
    }

    pub async fn remove_all(&self, mobile: &str) -> Result<u64> {
        self.store.delete_all_devices(mobile).await
    }

    pub async fn list_fingerprints(&self, mobile: &str) -> Result<Vec<String>> {
        self.store.list_device_fingerprints(mobile).await
    }
}
