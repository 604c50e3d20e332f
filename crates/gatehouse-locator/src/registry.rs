//! Container IP resolution.
//!
//! The orchestrator keeps a live in-memory map of container ids to IPs. After
//! a restart that map is empty until containers are re-inspected, so a miss
//! falls back to the mapping persisted in Redis.

use async_trait::async_trait;
use redis::AsyncCommands;
use std::collections::HashMap;
use std::sync::RwLock;

/// Live container registry owned by the orchestrator.
pub trait ContainerRegistry: Send + Sync {
    fn container_ip(&self, container_id: &str) -> Option<String>;
}

/// Persisted container id -> IP mapping.
#[async_trait]
pub trait PersistentIpStore: Send + Sync {
    async fn container_ip(&self, container_id: &str) -> anyhow::Result<Option<String>>;
}

/// Registry backed by a map, fed by whoever watches containers.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    ips: RwLock<HashMap<String, String>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, container_id: impl Into<String>, ip: impl Into<String>) {
        if let Ok(mut ips) = self.ips.write() {
            ips.insert(container_id.into(), ip.into());
        }
    }

    pub fn remove(&self, container_id: &str) {
        if let Ok(mut ips) = self.ips.write() {
            ips.remove(container_id);
        }
    }
}

impl ContainerRegistry for InMemoryRegistry {
    fn container_ip(&self, container_id: &str) -> Option<String> {
        self.ips.read().ok()?.get(container_id).cloned()
    }
}

#[async_trait]
impl PersistentIpStore for InMemoryRegistry {
    async fn container_ip(&self, container_id: &str) -> anyhow::Result<Option<String>> {
        Ok(ContainerRegistry::container_ip(self, container_id))
    }
}

/// Reads `<prefix><container_id>` from Redis.
pub struct RedisIpStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisIpStore {
    pub fn new(url: &str, key_prefix: impl Into<String>) -> anyhow::Result<Self> {
        Ok(Self {
            client: redis::Client::open(url)?,
            key_prefix: key_prefix.into(),
        })
    }

    pub fn key(&self, container_id: &str) -> String {
        format!("{}{}", self.key_prefix, container_id)
    }
}

#[async_trait]
impl PersistentIpStore for RedisIpStore {
    async fn container_ip(&self, container_id: &str) -> anyhow::Result<Option<String>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let ip: Option<String> = conn.get(self.key(container_id)).await?;
        Ok(ip.filter(|ip| !ip.is_empty()))
    }
}
