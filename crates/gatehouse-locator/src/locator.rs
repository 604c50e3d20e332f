use crate::catalog::TenantCatalog;
use crate::cipher::SecretCipher;
use crate::error::LocateError;
use crate::registry::{ContainerRegistry, PersistentIpStore};
use gatehouse_core::TenantTarget;
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

/// Resolves an authenticated (user, project) pair to a reachable tenant.
///
/// Nothing is cached: container IPs move and credentials rotate, so every
/// call re-reads the catalog and the registries.
#[derive(Clone)]
pub struct TenantLocator {
    catalog: Arc<dyn TenantCatalog>,
    registry: Arc<dyn ContainerRegistry>,
    persisted: Arc<dyn PersistentIpStore>,
    cipher: Arc<dyn SecretCipher>,
    database: String,
}

impl TenantLocator {
    pub fn new(
        catalog: Arc<dyn TenantCatalog>,
        registry: Arc<dyn ContainerRegistry>,
        persisted: Arc<dyn PersistentIpStore>,
        cipher: Arc<dyn SecretCipher>,
        database: impl Into<String>,
    ) -> Self {
        Self {
            catalog,
            registry,
            persisted,
            cipher,
            database: database.into(),
        }
    }

    pub async fn locate(&self, user_id: Uuid, project_id: Uuid) -> Result<TenantTarget, LocateError> {
        let catalog_err = |e: anyhow::Error| LocateError::Catalog(e.to_string());

        self.catalog
            .project_for_user(project_id, user_id)
            .await
            .map_err(catalog_err)?
            .ok_or(LocateError::NotFound)?;

        let instance = self
            .catalog
            .running_instance(project_id)
            .await
            .map_err(catalog_err)?
            .ok_or(LocateError::NoRunningInstance)?;
        let instance_id = instance.id;

        let credential = self
            .catalog
            .latest_credential(instance_id)
            .await
            .map_err(catalog_err)?
            .ok_or(LocateError::NoCredentials { instance_id })?;

        let container_id = instance
            .container_id()
            .ok_or(LocateError::InstanceNotConfigured {
                instance_id,
                field: "container ID",
            })?
            .to_string();
        let port = instance.port.ok_or(LocateError::InstanceNotConfigured {
            instance_id,
            field: "port",
        })?;

        let host = self.resolve_ip(instance_id, &container_id).await?;

        let password = self.cipher.decrypt(&credential.password_encrypted).map_err(|e| {
            warn!(%instance_id, error = %e, "Credential decryption failed");
            LocateError::DecryptionFailed { instance_id }
        })?;

        debug!(%project_id, %instance_id, host = %host, port, "Tenant located");

        Ok(TenantTarget {
            project_id,
            instance_id,
            host,
            port,
            username: credential.username,
            password,
            database: self.database.clone(),
        })
    }

    async fn resolve_ip(&self, instance_id: Uuid, container_id: &str) -> Result<String, LocateError> {
        if let Some(ip) = self.registry.container_ip(container_id) {
            return Ok(ip);
        }

        debug!(container_id, "Container IP not in registry, trying persisted mapping");
        let failed = || LocateError::IpResolutionFailed {
            instance_id,
            container_id: container_id.to_string(),
        };

        match self.persisted.container_ip(container_id).await {
            Ok(Some(ip)) => Ok(ip),
            Ok(None) => Err(failed()),
            Err(e) => {
                warn!(container_id, error = %e, "Persisted IP lookup failed");
                Err(failed())
            }
        }
    }
}
