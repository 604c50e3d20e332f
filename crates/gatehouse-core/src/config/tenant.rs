//! Settings applied to every tenant connection.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Which identifier grammar the gateway enforces.
///
/// The policy applies uniformly to every operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IdentifierPolicy {
    /// `^[A-Za-z_][A-Za-z0-9_$]*$`, at most 63 bytes.
    #[default]
    Strict,
    /// The strict grammar plus `-`, for tables created outside the gateway
    /// with hyphenated names.
    AllowHyphens,
}

/// SSL mode for tenant connections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum SslMode {
    /// Tenant containers sit on a private network; TLS is off by default.
    #[default]
    Disable,
    Prefer,
    Require,
}

/// Tenant connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TenantConfig {
    /// Database name used on every tenant instance.
    #[serde(default = "default_database")]
    pub database: String,

    #[serde(default)]
    pub ssl_mode: SslMode,

    /// Timeout for establishing the tenant connection.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Server-side `statement_timeout` set on each tenant session.
    #[serde(default = "default_statement_timeout_ms")]
    pub statement_timeout_ms: u64,

    /// Client-side deadline for a whole operation (connect + execute).
    #[serde(default = "default_operation_timeout_ms")]
    pub operation_timeout_ms: u64,

    #[serde(default)]
    pub identifier_policy: IdentifierPolicy,
}

impl Default for TenantConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            ssl_mode: SslMode::default(),
            connect_timeout_ms: default_connect_timeout_ms(),
            statement_timeout_ms: default_statement_timeout_ms(),
            operation_timeout_ms: default_operation_timeout_ms(),
            identifier_policy: IdentifierPolicy::default(),
        }
    }
}

impl TenantConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn statement_timeout(&self) -> Duration {
        Duration::from_millis(self.statement_timeout_ms)
    }

    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_ms)
    }
}

fn default_database() -> String {
    "postgres".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    5_000
}

fn default_statement_timeout_ms() -> u64 {
    25_000
}

fn default_operation_timeout_ms() -> u64 {
    30_000
}
