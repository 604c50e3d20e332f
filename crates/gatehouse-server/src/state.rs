//! Shared application state and its construction from configuration.

use anyhow::Context;
use gatehouse_adapter_pg::{PgCatalog, PgHistoryStorage, PgTenantConnector, connect_catalog};
use gatehouse_audit::AuditLogger;
use gatehouse_core::{AuditBackend, GatehouseConfig};
use gatehouse_locator::{AesGcmCipher, InMemoryRegistry, RedisIpStore, TenantLocator};
use gatehouse_runtime::Gateway;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub gateway: Gateway,
}

impl AppState {
    pub fn new(gateway: Gateway) -> Self {
        Self { gateway }
    }

    /// Wire the Postgres catalog, Redis IP store and tenant connector.
    pub async fn init(config: &GatehouseConfig) -> anyhow::Result<Self> {
        let key = config
            .secrets
            .resolved_key()
            .context("no credential encryption key configured")?;
        let cipher =
            AesGcmCipher::from_base64_key(&key).context("invalid credential encryption key")?;

        let pool = connect_catalog(&config.catalog).await?;
        tracing::info!(
            max_connections = config.catalog.max_connections,
            "Connected to catalog database"
        );

        let persisted = RedisIpStore::new(&config.redis.resolved_url(), &config.redis.key_prefix)?;

        let audit = match config.audit.backend {
            AuditBackend::Postgres if config.audit.enabled => {
                AuditLogger::with_storage(Arc::new(PgHistoryStorage::new(pool.clone())))
            }
            _ => AuditLogger::new(&config.audit)?,
        };

        // Populated by the orchestrator when it runs in-process; empty here,
        // so lookups fall through to the persisted mapping.
        let registry = Arc::new(InMemoryRegistry::new());

        let locator = TenantLocator::new(
            Arc::new(PgCatalog::new(pool)),
            registry,
            Arc::new(persisted),
            Arc::new(cipher),
            config.tenant.database.clone(),
        );
        let connector = Arc::new(PgTenantConnector::new(&config.tenant));

        Ok(Self::new(Gateway::new(
            locator,
            connector,
            audit,
            &config.tenant,
        )))
    }
}
