//! Control-plane catalog backed by the `projects`, `database_instances` and
//! `database_credentials` tables.

use anyhow::Context;
use async_trait::async_trait;
use gatehouse_core::{CatalogConfig, DatabaseCredential, DatabaseInstance, Project};
use gatehouse_locator::TenantCatalog;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

/// Connect the control-plane pool.
pub async fn connect_catalog(config: &CatalogConfig) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.connection_string())
        .await
        .context("failed to connect to catalog database")?;
    Ok(pool)
}

#[derive(Debug, Clone)]
pub struct PgCatalog {
    pool: PgPool,
}

impl PgCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn optional_u16(row: &PgRow, column: &str) -> anyhow::Result<Option<u16>> {
    row.try_get::<Option<i32>, _>(column)?
        .map(u16::try_from)
        .transpose()
        .with_context(|| format!("{} out of range", column))
}

fn instance_from_row(row: &PgRow) -> anyhow::Result<DatabaseInstance> {
    let status: String = row.try_get("status")?;
    Ok(DatabaseInstance {
        id: row.try_get("id")?,
        project_id: row.try_get("project_id")?,
        status: status.parse().map_err(anyhow::Error::msg)?,
        container_id: row.try_get("container_id")?,
        endpoint: row.try_get("endpoint")?,
        port: optional_u16(row, "port")?,
        cpu_cores: row.try_get("cpu_cores")?,
        ram_mb: row.try_get("ram_mb")?,
        storage_gb: row.try_get("storage_gb")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

#[async_trait]
impl TenantCatalog for PgCatalog {
    async fn project_for_user(
        &self,
        project_id: Uuid,
        user_id: Uuid,
    ) -> anyhow::Result<Option<Project>> {
        let row = sqlx::query(
            r#"
            select id, user_id, name, db_type::text as db_type, created_at
            from projects
            where id = $1 and user_id = $2
            "#,
        )
        .bind(project_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        let db_type: String = row.try_get("db_type")?;
        Ok(Some(Project {
            id: row.try_get("id")?,
            user_id: row.try_get("user_id")?,
            name: row.try_get("name")?,
            db_engine: db_type.parse().map_err(anyhow::Error::msg)?,
            created_at: row.try_get("created_at")?,
        }))
    }

    async fn running_instance(&self, project_id: Uuid) -> anyhow::Result<Option<DatabaseInstance>> {
        let row = sqlx::query(
            r#"
            select id, project_id, status::text as status, container_id, endpoint, port,
                   cpu_cores, ram_mb, storage_gb, created_at, updated_at
            from database_instances
            where project_id = $1 and status = 'running'
            order by created_at desc
            limit 1
            "#,
        )
        .bind(project_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(instance_from_row).transpose()
    }

    async fn latest_credential(
        &self,
        instance_id: Uuid,
    ) -> anyhow::Result<Option<DatabaseCredential>> {
        let row = sqlx::query(
            r#"
            select id, db_instance_id, username, password_encrypted, created_at
            from database_credentials
            where db_instance_id = $1
            order by created_at desc
            limit 1
            "#,
        )
        .bind(instance_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };
        Ok(Some(DatabaseCredential {
            id: row.try_get("id")?,
            db_instance_id: row.try_get("db_instance_id")?,
            username: row.try_get("username")?,
            password_encrypted: row.try_get("password_encrypted")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}
