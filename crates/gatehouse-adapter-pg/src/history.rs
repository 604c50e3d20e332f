//! `query_history` table as an audit storage backend.

use async_trait::async_trait;
use gatehouse_audit::{AuditError, AuditFilter, AuditStorage};
use gatehouse_core::QueryHistory;
use sqlx::Row;
use sqlx::postgres::{PgPool, PgRow};

#[derive(Debug, Clone)]
pub struct PgHistoryStorage {
    pool: PgPool,
}

impl PgHistoryStorage {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// The column is `INT`; saturate rather than wrap.
fn clamp_ms(ms: u64) -> i32 {
    i32::try_from(ms).unwrap_or(i32::MAX)
}

fn history_from_row(row: &PgRow) -> Result<QueryHistory, sqlx::Error> {
    let ms: Option<i32> = row.try_get("execution_time_ms")?;
    Ok(QueryHistory {
        id: row.try_get("id")?,
        db_instance_id: row.try_get("db_instance_id")?,
        user_id: row.try_get("user_id")?,
        query_text: row.try_get("query_text")?,
        executed_at: row.try_get("executed_at")?,
        success: row.try_get::<Option<bool>, _>("success")?.unwrap_or(false),
        execution_time_ms: ms.map(|v| v.max(0) as u64).unwrap_or(0),
    })
}

#[async_trait]
impl AuditStorage for PgHistoryStorage {
    async fn store(&self, entry: QueryHistory) -> Result<(), AuditError> {
        sqlx::query(
            r#"
            insert into query_history
                (id, db_instance_id, user_id, query_text, executed_at, success, execution_time_ms)
            values ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(entry.id)
        .bind(entry.db_instance_id)
        .bind(entry.user_id)
        .bind(&entry.query_text)
        .bind(entry.executed_at)
        .bind(entry.success)
        .bind(clamp_ms(entry.execution_time_ms))
        .execute(&self.pool)
        .await
        .map_err(|e| AuditError::StorageError(e.to_string()))?;
        Ok(())
    }

    async fn query(&self, filter: AuditFilter) -> Result<Vec<QueryHistory>, AuditError> {
        let limit = filter.limit.map(|l| i64::try_from(l).unwrap_or(i64::MAX));
        let rows = sqlx::query(
            r#"
            select id, db_instance_id, user_id, query_text, executed_at, success, execution_time_ms
            from query_history
            where ($1::uuid is null or user_id = $1)
            order by executed_at desc
            limit $2
            "#,
        )
        .bind(filter.user_id)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AuditError::QueryFailed(e.to_string()))?;

        rows.iter()
            .map(history_from_row)
            .collect::<Result<_, _>>()
            .map_err(|e| AuditError::QueryFailed(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_ms() {
        assert_eq!(clamp_ms(250), 250);
        assert_eq!(clamp_ms(u64::MAX), i32::MAX);
    }
}
