use super::IdentityStore;
use crate::error::Result;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::Mutex;

#[derive(Default)]
struct Tables {
    users: HashSet<String>,
    /// (mobile, fingerprint) rows in insertion order; duplicates are allowed,
    /// as in the relational schema
    devices: Vec<(String, String)>,
}

/// In-process [`IdentityStore`] for tests and local runs
#[derive(Clone, Default)]
pub struct MemoryIdentityStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryIdentityStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of device rows held for `mobile`, duplicates included.
    pub async fn device_row_count(&self, mobile: &str) -> usize {
        let tables = self.tables.lock().await;
        tables.devices.iter().filter(|(m, _)| m == mobile).count()
    }
}

#[async_trait]
impl IdentityStore for MemoryIdentityStore {
    async fn user_exists(&self, mobile: &str) -> Result<bool> {
        Ok(self.tables.lock().await.users.contains(mobile))
    }

    async fn insert_user(&self, mobile: &str) -> Result<bool> {
        Ok(self.tables.lock().await.users.insert(mobile.to_string()))
    }

    async fn device_exists(&self, mobile: &str, fingerprint: &str) -> Result<bool> {
        let tables = self.tables.lock().await;
        Ok(tables
            .devices
            .iter()
            .any(|(m, fp)| m == mobile && fp == fingerprint))
    }

    async fn insert_device(&self, mobile: &str, fingerprint: &str) -> Result<()> {
        self.tables
            .lock()
            .await
            .devices
            .push((mobile.to_string(), fingerprint.to_string()));
        Ok(())
    }

    async fn delete_device(&self, mobile: &str, fingerprint: &str) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.devices.len();
        tables
            .devices
            .retain(|(m, fp)| !(m == mobile && fp == fingerprint));
        Ok((before - tables.devices.len()) as u64)
    }

    async fn delete_devices_except(&self, mobile: &str, keep: &str) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.devices.len();
        tables.devices.retain(|(m, fp)| m != mobile || fp == keep);
        Ok((before - tables.devices.len()) as u64)
    }

    async fn delete_all_devices(&self, mobile: &str) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let before = tables.devices.len();
        tables.devices.retain(|(m, _)| m != mobile);
        Ok((before - tables.devices.len()) as u64)
    }

    async fn list_device_fingerprints(&self, mobile: &str) -> Result<Vec<String>> {
        let tables = self.tables.lock().await;
        let mut seen = HashSet::new();
        Ok(tables
            .devices
            .iter()
            .filter(|(m, fp)| m == mobile && seen.insert(fp.as_str()))
            .map(|(_, fp)| fp.clone())
            .collect())
    }
}
