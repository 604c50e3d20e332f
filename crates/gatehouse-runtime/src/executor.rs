//! The seam between gateway operations and a tenant database driver.

use async_trait::async_trait;
use gatehouse_core::TenantTarget;
use gatehouse_sql::Statement;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::time::Duration;

/// SQLSTATE for "undefined column".
pub const UNDEFINED_COLUMN: &str = "42703";

/// A failure reported by the tenant driver while connecting or executing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct DriverError {
    /// SQLSTATE, when the server reported one.
    pub code: Option<String>,
    pub message: String,
}

impl DriverError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }

    pub fn with_code(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: Some(code.into()),
            message: message.into(),
        }
    }

    pub fn timeout(after: Duration) -> Self {
        Self::new(format!("operation timed out after {}ms", after.as_millis()))
    }

    pub fn is_undefined_column(&self) -> bool {
        self.code.as_deref() == Some(UNDEFINED_COLUMN)
    }
}

/// One result row, keyed by column name.
pub type Row = Map<String, Value>;

/// Rows returned by a SELECT-like statement.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowSet {
    /// Column names in result order, present even when there are no rows.
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

/// An open connection to one tenant database.
#[async_trait]
pub trait TenantSession: Send {
    /// Run a statement that returns rows.
    async fn query(&mut self, statement: &Statement) -> Result<RowSet, DriverError>;

    /// Run a statement and report rows affected.
    async fn execute(&mut self, statement: &Statement) -> Result<u64, DriverError>;

    /// Run a statement inside BEGIN/COMMIT, rolling back on failure.
    async fn execute_in_transaction(&mut self, statement: &Statement) -> Result<u64, DriverError> {
        self.execute(&Statement::new("BEGIN")).await?;
        match self.execute(statement).await {
            Ok(affected) => {
                self.execute(&Statement::new("COMMIT")).await?;
                Ok(affected)
            }
            Err(e) => {
                // The statement error is what the caller needs to see.
                let _ = self.execute(&Statement::new("ROLLBACK")).await;
                Err(e)
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError>;
}

/// Opens a fresh session per call. No pooling.
#[async_trait]
pub trait TenantConnector: Send + Sync {
    async fn connect(&self, target: &TenantTarget) -> Result<Box<dyn TenantSession>, DriverError>;
}

/// How a statement's result is consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatementKind {
    Select,
    Other,
}

impl StatementKind {
    /// Free-form text is SELECT-like iff it starts with `SELECT` or
    /// `EXPLAIN SELECT` (case-insensitive, after trimming).
    pub fn classify(query: &str) -> Self {
        let normalized = query.trim().to_uppercase();
        if normalized.starts_with("SELECT") || normalized.starts_with("EXPLAIN SELECT") {
            Self::Select
        } else {
            Self::Other
        }
    }
}

/// Outcome of a free-form query, returned to the caller as-is.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
    pub row_count: usize,
    pub rows_affected: u64,
    pub execution_time_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl QueryResult {
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Default::default()
        }
    }

    pub fn is_success(&self) -> bool {
        self.error.is_none()
    }
}

/// Dispatch a statement on its kind.
pub async fn execute(
    session: &mut dyn TenantSession,
    kind: StatementKind,
    statement: &Statement,
) -> Result<QueryResult, DriverError> {
    match kind {
        StatementKind::Select => {
            let set = session.query(statement).await?;
            let count = set.rows.len();
            Ok(QueryResult {
                columns: set.columns,
                rows: set.rows,
                row_count: count,
                rows_affected: count as u64,
                ..Default::default()
            })
        }
        StatementKind::Other => {
            let affected = session.execute(statement).await?;
            Ok(QueryResult {
                rows_affected: affected,
                ..Default::default()
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify() {
        assert_eq!(StatementKind::classify("SELECT 1"), StatementKind::Select);
        assert_eq!(StatementKind::classify("  select * from t"), StatementKind::Select);
        assert_eq!(
            StatementKind::classify("explain select 1"),
            StatementKind::Select
        );
        assert_eq!(
            StatementKind::classify("EXPLAIN ANALYZE SELECT 1"),
            StatementKind::Other
        );
        assert_eq!(
            StatementKind::classify("WITH x AS (SELECT 1) SELECT * FROM x"),
            StatementKind::Other
        );
        assert_eq!(StatementKind::classify("UPDATE t SET a = 1"), StatementKind::Other);
    }

    #[test]
    fn test_failed_result_serializes_error() {
        let json = serde_json::to_value(QueryResult::failed("boom")).unwrap();
        assert_eq!(json["error"], "boom");
        assert_eq!(json["row_count"], 0);
        let ok = serde_json::to_value(QueryResult::default()).unwrap();
        assert!(ok.get("error").is_none());
    }

    #[test]
    fn test_driver_error_codes() {
        assert!(DriverError::with_code("42703", "column \"id\" does not exist").is_undefined_column());
        assert!(!DriverError::new("io").is_undefined_column());
        assert_eq!(
            DriverError::timeout(Duration::from_millis(250)).to_string(),
            "operation timed out after 250ms"
        );
    }
}
