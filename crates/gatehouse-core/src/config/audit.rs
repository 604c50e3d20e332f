//! Audit logging configuration.

use serde::{Deserialize, Serialize};

/// Configuration for query history recording.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Whether audit logging is enabled.
    #[serde(default = "default_enabled")]
    pub enabled: bool,

    /// Where history records go.
    #[serde(default)]
    pub backend: AuditBackend,

    /// File path (for the file backend).
    #[serde(default = "default_file_path")]
    pub file_path: String,
}

/// Storage backend type.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum AuditBackend {
    /// The `query_history` table in the catalog database.
    #[default]
    Postgres,
    /// One JSON line per record on stdout.
    Console,
    /// JSON Lines appended to `file_path`.
    File,
    /// In-process, queryable; lost on restart.
    Memory,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_enabled(),
            backend: AuditBackend::default(),
            file_path: default_file_path(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

fn default_file_path() -> String {
    "query_history.log".to_string()
}
