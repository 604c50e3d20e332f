use async_trait::async_trait;
use chrono::{Duration, Utc};
use gatehouse_core::{
    DatabaseCredential, DatabaseInstance, DbEngine, InstanceStatus, Project,
};
use gatehouse_locator::{
    AesGcmCipher, InMemoryCatalog, InMemoryRegistry, LocateError, PersistentIpStore,
    TenantLocator,
};
use std::sync::Arc;
use uuid::Uuid;

const KEY: [u8; 32] = [42u8; 32];

struct Fixture {
    catalog: Arc<InMemoryCatalog>,
    registry: Arc<InMemoryRegistry>,
    persisted: Arc<InMemoryRegistry>,
    cipher: Arc<AesGcmCipher>,
    user_id: Uuid,
    project_id: Uuid,
}

impl Fixture {
    fn new() -> Self {
        let catalog = Arc::new(InMemoryCatalog::new());
        let user_id = Uuid::new_v4();
        let project_id = Uuid::new_v4();
        catalog.add_project(Project {
            id: project_id,
            user_id,
            name: "shop".to_string(),
            db_engine: DbEngine::Postgresql,
            created_at: Utc::now(),
        });
        Self {
            catalog,
            registry: Arc::new(InMemoryRegistry::new()),
            persisted: Arc::new(InMemoryRegistry::new()),
            cipher: Arc::new(AesGcmCipher::new(&KEY).unwrap()),
            user_id,
            project_id,
        }
    }

    fn locator(&self) -> TenantLocator {
        self.locator_with(self.persisted.clone())
    }

    fn locator_with(&self, persisted: Arc<dyn PersistentIpStore>) -> TenantLocator {
        TenantLocator::new(
            self.catalog.clone(),
            self.registry.clone(),
            persisted,
            self.cipher.clone(),
            "postgres",
        )
    }

    fn add_instance(
        &self,
        status: InstanceStatus,
        container_id: Option<&str>,
        port: Option<u16>,
        age_minutes: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let created = Utc::now() - Duration::minutes(age_minutes);
        self.catalog.add_instance(DatabaseInstance {
            id,
            project_id: self.project_id,
            status,
            container_id: container_id.map(str::to_string),
            endpoint: None,
            port,
            cpu_cores: Some(1),
            ram_mb: Some(512),
            storage_gb: Some(1),
            created_at: created,
            updated_at: created,
        });
        id
    }

    fn add_credential(&self, instance_id: Uuid, username: &str, password: &str, age_minutes: i64) {
        self.catalog.add_credential(DatabaseCredential {
            id: Uuid::new_v4(),
            db_instance_id: instance_id,
            username: username.to_string(),
            password_encrypted: self.cipher.encrypt(password).unwrap(),
            created_at: Utc::now() - Duration::minutes(age_minutes),
        });
    }
}

struct BrokenStore;

#[async_trait]
impl PersistentIpStore for BrokenStore {
    async fn container_ip(&self, _container_id: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("connection refused")
    }
}

#[tokio::test]
async fn test_locate_happy_path() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    fx.add_credential(instance, "tenant", "pw", 0);
    fx.registry.register("c-1", "172.18.0.5");

    let target = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap();
    assert_eq!(target.instance_id, instance);
    assert_eq!(target.host, "172.18.0.5");
    assert_eq!(target.port, 5432);
    assert_eq!(target.username, "tenant");
    assert_eq!(target.password.expose(), "pw");
    assert_eq!(target.database, "postgres");
}

#[tokio::test]
async fn test_locate_is_idempotent() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    fx.add_credential(instance, "tenant", "pw", 0);
    fx.registry.register("c-1", "172.18.0.5");

    let locator = fx.locator();
    let first = locator.locate(fx.user_id, fx.project_id).await.unwrap();
    let second = locator.locate(fx.user_id, fx.project_id).await.unwrap();
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_other_users_project_is_not_found() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    fx.add_credential(instance, "tenant", "pw", 0);

    let err = fx
        .locator()
        .locate(Uuid::new_v4(), fx.project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::NotFound));
    assert_eq!(err.instance_id(), None);
}

#[tokio::test]
async fn test_newest_running_instance_and_credential_win() {
    let fx = Fixture::new();
    let old = fx.add_instance(InstanceStatus::Running, Some("c-old"), Some(5432), 60);
    let new = fx.add_instance(InstanceStatus::Running, Some("c-new"), Some(5433), 5);
    fx.add_instance(InstanceStatus::Paused, Some("c-paused"), Some(5434), 0);
    fx.add_credential(old, "old", "old-pw", 0);
    fx.add_credential(new, "rotated-out", "stale", 30);
    fx.add_credential(new, "current", "fresh", 1);
    fx.registry.register("c-new", "10.0.0.9");

    let target = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap();
    assert_eq!(target.instance_id, new);
    assert_eq!(target.port, 5433);
    assert_eq!(target.username, "current");
    assert_eq!(target.password.expose(), "fresh");
}

#[tokio::test]
async fn test_no_running_instance() {
    let fx = Fixture::new();
    fx.add_instance(InstanceStatus::Creating, Some("c-1"), Some(5432), 0);
    let err = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap_err();
    assert!(matches!(err, LocateError::NoRunningInstance));
    assert_eq!(err.instance_id(), None);
}

#[tokio::test]
async fn test_no_credentials() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    let err = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap_err();
    assert!(matches!(err, LocateError::NoCredentials { .. }));
    assert_eq!(err.instance_id(), Some(instance));
}

#[tokio::test]
async fn test_instance_not_configured() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some(""), Some(5432), 0);
    fx.add_credential(instance, "tenant", "pw", 0);
    let err = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap_err();
    assert_eq!(err.to_string(), "database instance container ID not configured");

    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), None, 0);
    fx.add_credential(instance, "tenant", "pw", 0);
    let err = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap_err();
    assert_eq!(err.to_string(), "database instance port not configured");
}

#[tokio::test]
async fn test_registry_miss_uses_persisted_mapping() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    fx.add_credential(instance, "tenant", "pw", 0);
    fx.persisted.register("c-1", "192.168.1.20");

    let target = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap();
    assert_eq!(target.host, "192.168.1.20");
}

#[tokio::test]
async fn test_registry_wins_over_persisted_mapping() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    fx.add_credential(instance, "tenant", "pw", 0);
    fx.registry.register("c-1", "10.0.0.1");
    fx.persisted.register("c-1", "10.9.9.9");

    let target = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap();
    assert_eq!(target.host, "10.0.0.1");
}

#[tokio::test]
async fn test_ip_resolution_failed() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    fx.add_credential(instance, "tenant", "pw", 0);

    let err = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap_err();
    assert!(matches!(err, LocateError::IpResolutionFailed { .. }));

    let err = fx
        .locator_with(Arc::new(BrokenStore))
        .locate(fx.user_id, fx.project_id)
        .await
        .unwrap_err();
    assert!(matches!(err, LocateError::IpResolutionFailed { .. }));
    assert_eq!(err.instance_id(), Some(instance));
}

#[tokio::test]
async fn test_decryption_failure() {
    let fx = Fixture::new();
    let instance = fx.add_instance(InstanceStatus::Running, Some("c-1"), Some(5432), 0);
    fx.catalog.add_credential(DatabaseCredential {
        id: Uuid::new_v4(),
        db_instance_id: instance,
        username: "tenant".to_string(),
        password_encrypted: AesGcmCipher::new(&[1u8; 32]).unwrap().encrypt("pw").unwrap(),
        created_at: Utc::now(),
    });
    fx.registry.register("c-1", "10.0.0.1");

    let err = fx.locator().locate(fx.user_id, fx.project_id).await.unwrap_err();
    assert!(matches!(err, LocateError::DecryptionFailed { .. }));
}
