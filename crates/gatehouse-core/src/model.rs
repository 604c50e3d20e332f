//! Domain model for projects, tenant instances and their execution history.

use crate::secret::Secret;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Database engine a project was provisioned with, as stored in the
/// catalog's `db_type_t` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbEngine {
    #[serde(rename = "postgres", alias = "postgresql")]
    Postgresql,
    #[serde(rename = "mongodb")]
    Mongodb,
}

impl DbEngine {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Postgresql => "postgres",
            Self::Mongodb => "mongodb",
        }
    }
}

impl FromStr for DbEngine {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" | "postgresql" => Ok(Self::Postgresql),
            "mongodb" => Ok(Self::Mongodb),
            other => Err(format!("unknown database engine '{}'", other)),
        }
    }
}

/// The tenant unit. Owned by exactly one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Project {
    pub id: Uuid,
    pub user_id: Uuid,
    pub name: String,
    pub db_engine: DbEngine,
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a provisioned instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InstanceStatus {
    Creating,
    Running,
    Failed,
    Paused,
    Deleted,
}

impl InstanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Creating => "creating",
            Self::Running => "running",
            Self::Failed => "failed",
            Self::Paused => "paused",
            Self::Deleted => "deleted",
        }
    }
}

impl fmt::Display for InstanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InstanceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "creating" => Ok(Self::Creating),
            "running" => Ok(Self::Running),
            "failed" => Ok(Self::Failed),
            "paused" => Ok(Self::Paused),
            "deleted" => Ok(Self::Deleted),
            other => Err(format!("unknown instance status '{}'", other)),
        }
    }
}

/// One provisioned database backend for a project.
///
/// Only the most recently created instance with status `running` is used for
/// routing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseInstance {
    pub id: Uuid,
    pub project_id: Uuid,
    pub status: InstanceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu_cores: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ram_mb: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_gb: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DatabaseInstance {
    /// Container id, treating an empty string the same as a missing one.
    pub fn container_id(&self) -> Option<&str> {
        self.container_id.as_deref().filter(|id| !id.is_empty())
    }
}

/// Username plus encrypted secret for an instance.
///
/// Several rows may exist per instance (rotation history); the newest wins.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseCredential {
    pub id: Uuid,
    pub db_instance_id: Uuid,
    pub username: String,
    #[serde(skip_serializing, default)]
    pub password_encrypted: String,
    pub created_at: DateTime<Utc>,
}

/// One execution attempt against a tenant database. Append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryHistory {
    pub id: Uuid,
    pub db_instance_id: Uuid,
    pub user_id: Uuid,
    pub query_text: String,
    pub executed_at: DateTime<Utc>,
    pub success: bool,
    pub execution_time_ms: u64,
}

impl QueryHistory {
    pub fn new(
        db_instance_id: Uuid,
        user_id: Uuid,
        query_text: impl Into<String>,
        success: bool,
        execution_time_ms: u64,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            db_instance_id,
            user_id,
            query_text: query_text.into(),
            executed_at: Utc::now(),
            success,
            execution_time_ms,
        }
    }
}

/// A reachable tenant endpoint with decrypted credentials.
///
/// Produced fresh for every gateway call and dropped when the call returns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantTarget {
    pub project_id: Uuid,
    pub instance_id: Uuid,
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: Secret,
    pub database: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instance_status_round_trip() {
        for status in [
            InstanceStatus::Creating,
            InstanceStatus::Running,
            InstanceStatus::Failed,
            InstanceStatus::Paused,
            InstanceStatus::Deleted,
        ] {
            assert_eq!(status.as_str().parse::<InstanceStatus>().unwrap(), status);
        }
        assert!("stopped".parse::<InstanceStatus>().is_err());
    }

    #[test]
    fn test_db_engine_parses_catalog_values() {
        assert_eq!("postgres".parse::<DbEngine>().unwrap(), DbEngine::Postgresql);
        assert_eq!("postgresql".parse::<DbEngine>().unwrap(), DbEngine::Postgresql);
        assert_eq!("mongodb".parse::<DbEngine>().unwrap(), DbEngine::Mongodb);
        assert!("mysql".parse::<DbEngine>().is_err());
        assert_eq!(DbEngine::Postgresql.as_str(), "postgres");

        let engine: DbEngine = serde_json::from_str("\"postgres\"").unwrap();
        assert_eq!(engine, DbEngine::Postgresql);
        assert_eq!(serde_json::to_string(&engine).unwrap(), "\"postgres\"");
    }

    #[test]
    fn test_empty_container_id_is_missing() {
        let now = Utc::now();
        let instance = DatabaseInstance {
            id: Uuid::new_v4(),
            project_id: Uuid::new_v4(),
            status: InstanceStatus::Running,
            container_id: Some(String::new()),
            endpoint: None,
            port: Some(5432),
            cpu_cores: None,
            ram_mb: None,
            storage_gb: None,
            created_at: now,
            updated_at: now,
        };
        assert_eq!(instance.container_id(), None);
    }

    #[test]
    fn test_credential_never_serializes_secret() {
        let cred = DatabaseCredential {
            id: Uuid::new_v4(),
            db_instance_id: Uuid::new_v4(),
            username: "tenant".to_string(),
            password_encrypted: "c2VjcmV0".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&cred).unwrap();
        assert!(!json.contains("password_encrypted"));
        assert!(!json.contains("c2VjcmV0"));
    }

    #[test]
    fn test_target_debug_hides_password() {
        let target = TenantTarget {
            project_id: Uuid::new_v4(),
            instance_id: Uuid::new_v4(),
            host: "10.0.0.5".to_string(),
            port: 5432,
            username: "tenant".to_string(),
            password: Secret::new("pa55word"),
            database: "postgres".to_string(),
        };
        assert!(!format!("{:?}", target).contains("pa55word"));
    }
}
