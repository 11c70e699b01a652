use super::{devices, users, IdentityStore};
use crate::error::Result;
use async_trait::async_trait;
use sqlx::PgPool;

/// [`IdentityStore`] backed by PostgreSQL
#[derive(Clone)]
pub struct PgIdentityStore {
    pool: PgPool,
}

impl PgIdentityStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl IdentityStore for PgIdentityStore {
    async fn user_exists(&self, mobile: &str) -> Result<bool> {
        users::user_exists(&self.pool, mobile).await
    }

    async fn insert_user(&self, mobile: &str) -> Result<bool> {
        users::create_user(&self.pool, mobile).await
    }

    async fn device_exists(&self, mobile: &str, fingerprint: &str) -> Result<bool> {
        devices::device_exists(&self.pool, mobile, fingerprint).await
    }

    async fn insert_device(&self, mobile: &str, fingerprint: &str) -> Result<()> {
        devices::insert_device(&self.pool, mobile, fingerprint).await
    }

    async fn delete_device(&self, mobile: &str, fingerprint: &str) -> Result<u64> {
        devices::delete_device(&self.pool, mobile, fingerprint).await
    }

    async fn delete_devices_except(&self, mobile: &str, keep: &str) -> Result<u64> {
        devices::delete_devices_except(&self.pool, mobile, keep).await
    }

    async fn delete_all_devices(&self, mobile: &str) -> Result<u64> {
        devices::delete_all_devices(&self.pool, mobile).await
    }

    async fn list_device_fingerprints(&self, mobile: &str) -> Result<Vec<String>> {
        devices::list_fingerprints(&self.pool, mobile).await
    }
}
