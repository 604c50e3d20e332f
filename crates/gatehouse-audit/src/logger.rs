//! Audit logger implementation.
//!
//! Provides the `AuditLogger` the gateway calls once per execution attempt.

use gatehouse_core::{AuditBackend, AuditConfig, QueryHistory};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::AuditError;
use crate::storage::{AuditStorage, ConsoleStorage, FileStorage, MemoryStorage, NullStorage};

/// Default number of records returned by [`AuditLogger::history_for_user`].
pub const DEFAULT_HISTORY_LIMIT: usize = 100;

/// Records one history row per execution attempt.
///
/// Recording is best-effort: a storage failure is logged and swallowed so it
/// never changes the outcome of the operation being audited.
#[derive(Clone)]
pub struct AuditLogger {
    enabled: bool,
    storage: Arc<dyn AuditStorage>,
}

impl AuditLogger {
    /// Build a logger for the file, console and memory backends.
    ///
    /// The Postgres backend needs the catalog pool, so callers build that
    /// storage themselves and use [`AuditLogger::with_storage`].
    pub fn new(config: &AuditConfig) -> Result<Self, AuditError> {
        if !config.enabled {
            return Ok(Self::disabled());
        }
        let storage: Arc<dyn AuditStorage> = match config.backend {
            AuditBackend::Console => Arc::new(ConsoleStorage::new()),
            AuditBackend::File => Arc::new(FileStorage::new(&config.file_path)?),
            AuditBackend::Memory => Arc::new(MemoryStorage::new()),
            AuditBackend::Postgres => {
                return Err(AuditError::InitializationFailed(
                    "postgres backend requires a catalog connection".to_string(),
                ));
            }
        };
        Ok(Self::with_storage(storage))
    }

    /// Create a logger with a custom storage backend.
    pub fn with_storage(storage: Arc<dyn AuditStorage>) -> Self {
        Self {
            enabled: true,
            storage,
        }
    }

    /// Create a disabled (no-op) logger.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            storage: Arc::new(NullStorage::new()),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Record one attempt and return its history id.
    ///
    /// The id is returned even when the write fails or auditing is disabled,
    /// since callers hand it out as the execution identifier.
    pub async fn record(
        &self,
        instance_id: Uuid,
        user_id: Uuid,
        query_text: &str,
        success: bool,
        latency_ms: u64,
    ) -> Uuid {
        let entry = QueryHistory::new(instance_id, user_id, query_text, success, latency_ms);
        let id = entry.id;

        if !self.enabled {
            return id;
        }

        debug!(
            history_id = %id,
            instance_id = %instance_id,
            user_id = %user_id,
            success,
            latency_ms,
            "Recording query history"
        );

        if let Err(e) = self.storage.store(entry).await {
            warn!(history_id = %id, error = %e, "Failed to record query history");
        }
        id
    }

    pub async fn query(&self, filter: AuditFilter) -> Result<Vec<QueryHistory>, AuditError> {
        self.storage.query(filter).await
    }

    /// A user's most recent records, newest first.
    pub async fn history_for_user(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<QueryHistory>, AuditError> {
        self.query(AuditFilter {
            user_id: Some(user_id),
            limit: Some(limit.unwrap_or(DEFAULT_HISTORY_LIMIT)),
            ..Default::default()
        })
        .await
    }
}

/// Filter for querying history.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub user_id: Option<Uuid>,
    pub limit: Option<usize>,
}

impl AuditFilter {
    pub fn matches(&self, record: &QueryHistory) -> bool {
        self.user_id.is_none_or(|u| record.user_id == u)
    }
}
