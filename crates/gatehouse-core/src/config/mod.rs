//! Configuration types for the Gatehouse query gateway.
//!
//! Configuration is loaded from a single YAML file (`gatehouse.yaml` by
//! default). Every section is optional; missing sections fall back to
//! defaults suitable for a local development stack.
//!
//! # Sections
//!
//! - **server**: HTTP bind address
//! - **catalog**: control-plane Postgres holding projects, instances, credentials
//! - **redis**: persisted container IP mapping
//! - **secrets**: credential encryption key
//! - **tenant**: per-connection settings for tenant databases
//! - **audit**: where query history goes

pub mod audit;
pub mod catalog;
pub mod secrets;
pub mod tenant;

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

pub use audit::{AuditBackend, AuditConfig};
pub use catalog::CatalogConfig;
pub use secrets::{RedisConfig, SecretsConfig};
pub use tenant::{IdentifierPolicy, SslMode, TenantConfig};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "GATEHOUSE_CONFIG";

/// Default configuration file name.
pub const DEFAULT_CONFIG_PATH: &str = "gatehouse.yaml";

/// Complete Gatehouse configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GatehouseConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub redis: RedisConfig,

    #[serde(default)]
    pub secrets: SecretsConfig,

    #[serde(default)]
    pub tenant: TenantConfig,

    #[serde(default)]
    pub audit: AuditConfig,
}

/// HTTP listener settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,

    #[serde(default = "default_listen_port")]
    pub listen_port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            listen_port: default_listen_port(),
        }
    }
}

impl ServerConfig {
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.listen_addr, self.listen_port)
    }
}

fn default_listen_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_listen_port() -> u16 {
    8080
}

/// Error type for configuration loading.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl GatehouseConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML content.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from `$GATEHOUSE_CONFIG`, falling back to `gatehouse.yaml`.
    ///
    /// A missing default file is not an error; the defaults are used instead.
    /// A missing file that was named explicitly is.
    pub fn load() -> Result<Self, ConfigError> {
        match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.tenant.operation_timeout_ms == 0 {
            return Err(ConfigError::Config(
                "tenant.operation_timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.tenant.database.is_empty() {
            return Err(ConfigError::Config(
                "tenant.database must not be empty".to_string(),
            ));
        }
        if self.audit.enabled
            && self.audit.backend == AuditBackend::File
            && self.audit.file_path.is_empty()
        {
            return Err(ConfigError::Config(
                "audit.file_path is required for the file backend".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_yaml_uses_defaults() {
        let config = GatehouseConfig::from_yaml("{}").unwrap();
        assert_eq!(config.server.bind_addr(), "0.0.0.0:8080");
        assert_eq!(config.tenant.database, "postgres");
        assert_eq!(config.tenant.ssl_mode, SslMode::Disable);
        assert_eq!(config.tenant.operation_timeout_ms, 30_000);
        assert_eq!(config.tenant.identifier_policy, IdentifierPolicy::Strict);
        assert_eq!(config.redis.key_prefix, "container_ip:");
        assert_eq!(config.audit.backend, AuditBackend::Postgres);
        assert!(config.audit.enabled);
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
server:
  listen_addr: 127.0.0.1
  listen_port: 9000
catalog:
  database_url: postgresql://cp:cp@catalog:5432/platform
  max_connections: 10
redis:
  url: redis://cache:6379
  key_prefix: "ip:"
secrets:
  encryption_key_env: MY_KEY
tenant:
  ssl_mode: require
  statement_timeout_ms: 1000
  identifier_policy: allow_hyphens
audit:
  backend: file
  file_path: /var/log/gatehouse/history.jsonl
"#;
        let config = GatehouseConfig::from_yaml(yaml).unwrap();
        assert_eq!(config.server.bind_addr(), "127.0.0.1:9000");
        assert_eq!(
            config.catalog.connection_string(),
            "postgresql://cp:cp@catalog:5432/platform"
        );
        assert_eq!(config.catalog.max_connections, 10);
        assert_eq!(config.redis.resolved_url(), "redis://cache:6379");
        assert_eq!(config.redis.key_prefix, "ip:");
        assert_eq!(config.secrets.encryption_key_env.as_deref(), Some("MY_KEY"));
        assert_eq!(config.tenant.ssl_mode, SslMode::Require);
        assert_eq!(config.tenant.statement_timeout_ms, 1000);
        assert_eq!(config.tenant.operation_timeout_ms, 30_000);
        assert_eq!(
            config.tenant.identifier_policy,
            IdentifierPolicy::AllowHyphens
        );
        assert_eq!(config.audit.backend, AuditBackend::File);
    }

    #[test]
    fn test_zero_operation_timeout_rejected() {
        let err = GatehouseConfig::from_yaml("tenant:\n  operation_timeout_ms: 0\n").unwrap_err();
        assert!(matches!(err, ConfigError::Config(_)));
    }

    #[test]
    fn test_unknown_backend_rejected() {
        let err = GatehouseConfig::from_yaml("audit:\n  backend: kafka\n").unwrap_err();
        assert!(matches!(err, ConfigError::Yaml(_)));
    }

    #[test]
    fn test_secrets_debug_redacts_key() {
        let config = GatehouseConfig::from_yaml("secrets:\n  encryption_key: c2VjcmV0\n").unwrap();
        let debug = format!("{:?}", config.secrets);
        assert!(!debug.contains("c2VjcmV0"));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gatehouse.yaml");
        std::fs::write(&path, "server:\n  listen_port: 7070\n").unwrap();
        let config = GatehouseConfig::from_file(&path).unwrap();
        assert_eq!(config.server.listen_port, 7070);
    }
}
