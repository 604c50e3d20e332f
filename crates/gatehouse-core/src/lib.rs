//! # gatehouse-core
//!
//! Shared configuration types and the domain model used across all Gatehouse
//! crates: projects, tenant database instances, credentials, query history
//! records and the resolved [`TenantTarget`] a gateway operation connects to.

// Configuration types shared across all Gatehouse crates
pub mod config;
pub mod model;
pub mod secret;

// Re-export commonly used types for convenience
pub use config::{
    AuditBackend, AuditConfig, CatalogConfig, ConfigError, GatehouseConfig, IdentifierPolicy,
    RedisConfig, SecretsConfig, ServerConfig, SslMode, TenantConfig,
};
pub use model::{
    DatabaseCredential, DatabaseInstance, DbEngine, InstanceStatus, Project, QueryHistory,
    TenantTarget,
};
pub use secret::Secret;
