/// Durable storage for users and their registered devices
pub mod devices;
mod memory;
mod postgres;
pub mod users;

pub use memory::MemoryIdentityStore;
pub use postgres::PgIdentityStore;

use crate::error::Result;
use async_trait::async_trait;

/// Outcome of resolving a fingerprint against the registered devices
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceResolution {
    /// Fingerprint was already registered for the user
    Existing,
    /// Fingerprint was unseen and has been registered now
    Registered,
}

#[async_trait]
pub trait IdentityStore: Send + Sync {
    async fn user_exists(&self, mobile: &str) -> Result<bool>;

    /// Insert a user. Returns false if the mobile number was already taken.
    async fn insert_user(&self, mobile: &str) -> Result<bool>;

    async fn device_exists(&self, mobile: &str, fingerprint: &str) -> Result<bool>;

    async fn insert_device(&self, mobile: &str, fingerprint: &str) -> Result<()>;

    /// Rows removed
    async fn delete_device(&self, mobile: &str, fingerprint: &str) -> Result<u64>;

    /// Remove every device of `mobile` except `keep`, in one statement.
    async fn delete_devices_except(&self, mobile: &str, keep: &str) -> Result<u64>;

    async fn delete_all_devices(&self, mobile: &str) -> Result<u64>;

    async fn list_device_fingerprints(&self, mobile: &str) -> Result<Vec<String>>;

    /// Reuse a registered fingerprint or register it.
    ///
    /// The default is a plain check-then-insert with no transaction; two racing
    /// first logins from one device can leave a duplicate row. Backends with a
    /// cheaper atomic path may override this.
    async fn ensure_device(&self, mobile: &str, fingerprint: &str) -> Result<DeviceResolution> {
        if self.device_exists(mobile, fingerprint).await? {
            return Ok(DeviceResolution::Existing);
        }
        self.insert_device(mobile, fingerprint).await?;
        Ok(DeviceResolution::Registered)
    }
}
