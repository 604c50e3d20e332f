//! In-memory catalog for tests and local development.

use crate::catalog::TenantCatalog;
use async_trait::async_trait;
use gatehouse_core::{DatabaseCredential, DatabaseInstance, InstanceStatus, Project};
use std::sync::RwLock;
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    projects: RwLock<Vec<Project>>,
    instances: RwLock<Vec<DatabaseInstance>>,
    credentials: RwLock<Vec<DatabaseCredential>>,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_project(&self, project: Project) {
        if let Ok(mut projects) = self.projects.write() {
            projects.push(project);
        }
    }

    pub fn add_instance(&self, instance: DatabaseInstance) {
        if let Ok(mut instances) = self.instances.write() {
            instances.push(instance);
        }
    }

    pub fn add_credential(&self, credential: DatabaseCredential) {
        if let Ok(mut credentials) = self.credentials.write() {
            credentials.push(credential);
        }
    }

    pub fn set_status(&self, instance_id: Uuid, status: InstanceStatus) {
        if let Ok(mut instances) = self.instances.write() {
            for instance in instances.iter_mut().filter(|i| i.id == instance_id) {
                instance.status = status;
            }
        }
    }
}

fn poisoned() -> anyhow::Error {
    anyhow::anyhow!("catalog lock poisoned")
}

#[async_trait]
impl TenantCatalog for InMemoryCatalog {
    async fn project_for_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Project>> {
        let projects = self.projects.read().map_err(|_| poisoned())?;
        Ok(projects
            .iter()
            .find(|p| p.id == project_id && p.user_id == user_id)
            .cloned())
    }

    async fn running_instance(&self, project_id: Uuid) -> anyhow::Result<Option<DatabaseInstance>> {
        let instances = self.instances.read().map_err(|_| poisoned())?;
        Ok(instances
            .iter()
            .filter(|i| i.project_id == project_id && i.status == InstanceStatus::Running)
            .max_by_key(|i| i.created_at)
            .cloned())
    }

    async fn latest_credential(
        &self,
        instance_id: Uuid,
    ) -> anyhow::Result<Option<DatabaseCredential>> {
        let credentials = self.credentials.read().map_err(|_| poisoned())?;
        Ok(credentials
            .iter()
            .filter(|c| c.db_instance_id == instance_id)
            .max_by_key(|c| c.created_at)
            .cloned())
    }
}
