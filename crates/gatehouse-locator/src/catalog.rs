//! Lookups against the control-plane catalog.

use async_trait::async_trait;
use gatehouse_core::{DatabaseCredential, DatabaseInstance, Project};
use uuid::Uuid;

/// Read access to projects, instances and credentials.
///
/// `None` means "no such row"; `Err` means the lookup itself failed.
#[async_trait]
pub trait TenantCatalog: Send + Sync {
    /// The project, only if `user_id` owns it.
    async fn project_for_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Project>>;

    /// Most recently created instance with status `running`.
    async fn running_instance(&self, project_id: Uuid) -> anyhow::Result<Option<DatabaseInstance>>;

    /// Most recently created credential for the instance.
    async fn latest_credential(
        &self,
        instance_id: Uuid,
    ) -> anyhow::Result<Option<DatabaseCredential>>;
}
