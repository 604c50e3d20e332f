//! Tenant connector: one fresh `PgConnection` per gateway call.

use crate::convert::{bind_params, driver_error, param_types, row_to_json};
use async_trait::async_trait;
use gatehouse_core::{SslMode, TenantConfig, TenantTarget};
use gatehouse_runtime::{DriverError, RowSet, TenantConnector, TenantSession};
use gatehouse_sql::Statement;
use sqlx::postgres::{PgColumn, PgConnectOptions, PgConnection, PgSslMode};
use sqlx::{Column, Connection, Executor, Row as _, Statement as _};
use std::time::Duration;
use tracing::debug;

/// Opens unpooled connections to tenant instances.
#[derive(Debug, Clone)]
pub struct PgTenantConnector {
    ssl_mode: SslMode,
    connect_timeout: Duration,
    statement_timeout: Duration,
}

impl PgTenantConnector {
    pub fn new(config: &TenantConfig) -> Self {
        Self {
            ssl_mode: config.ssl_mode,
            connect_timeout: config.connect_timeout(),
            statement_timeout: config.statement_timeout(),
        }
    }

    pub(crate) fn options(&self, target: &TenantTarget) -> PgConnectOptions {
        let ssl_mode = match self.ssl_mode {
            SslMode::Disable => PgSslMode::Disable,
            SslMode::Prefer => PgSslMode::Prefer,
            SslMode::Require => PgSslMode::Require,
        };
        let options = PgConnectOptions::new()
            .host(&target.host)
            .port(target.port)
            .username(&target.username)
            .password(target.password.expose())
            .database(&target.database)
            .ssl_mode(ssl_mode);

        if self.statement_timeout.is_zero() {
            options
        } else {
            options.options([(
                "statement_timeout",
                self.statement_timeout.as_millis().to_string(),
            )])
        }
    }
}

#[async_trait]
impl TenantConnector for PgTenantConnector {
    async fn connect(&self, target: &TenantTarget) -> Result<Box<dyn TenantSession>, DriverError> {
        debug!(
            host = %target.host,
            port = target.port,
            database = %target.database,
            "Connecting to tenant database"
        );
        let conn = tokio::time::timeout(
            self.connect_timeout,
            PgConnection::connect_with(&self.options(target)),
        )
        .await
        .map_err(|_| {
            DriverError::new(format!(
                "connection timed out after {}ms",
                self.connect_timeout.as_millis()
            ))
        })?
        .map_err(driver_error)?;

        Ok(Box::new(PgTenantSession::from(conn)))
    }
}

/// A single tenant connection.
pub struct PgTenantSession {
    conn: PgConnection,
}

impl From<PgConnection> for PgTenantSession {
    fn from(conn: PgConnection) -> Self {
        Self { conn }
    }
}

fn column_names(columns: &[PgColumn]) -> Vec<String> {
    columns.iter().map(|c| c.name().to_string()).collect()
}

#[async_trait]
impl TenantSession for PgTenantSession {
    async fn query(&mut self, statement: &Statement) -> Result<RowSet, DriverError> {
        let args = bind_params(&statement.params)?;
        let rows = sqlx::query_with(statement.sql.as_str(), args)
            .fetch_all(&mut self.conn)
            .await
            .map_err(driver_error)?;

        let columns = match rows.first() {
            Some(row) => column_names(row.columns()),
            // Must run after the fetch: a statement prepared earlier would
            // be cached with the server's inferred parameter types.
            None => {
                let types = param_types(&statement.params);
                let described = (&mut self.conn)
                    .prepare_with(statement.sql.as_str(), &types)
                    .await
                    .map_err(driver_error)?;
                column_names(described.columns())
            }
        };

        Ok(RowSet {
            columns,
            rows: rows.iter().map(row_to_json).collect(),
        })
    }

    async fn execute(&mut self, statement: &Statement) -> Result<u64, DriverError> {
        let args = bind_params(&statement.params)?;
        sqlx::query_with(statement.sql.as_str(), args)
            .execute(&mut self.conn)
            .await
            .map(|r| r.rows_affected())
            .map_err(driver_error)
    }

    async fn execute_in_transaction(&mut self, statement: &Statement) -> Result<u64, DriverError> {
        let args = bind_params(&statement.params)?;
        let mut tx = self.conn.begin().await.map_err(driver_error)?;
        match sqlx::query_with(statement.sql.as_str(), args)
            .execute(&mut *tx)
            .await
        {
            Ok(done) => {
                tx.commit().await.map_err(driver_error)?;
                Ok(done.rows_affected())
            }
            Err(e) => {
                if let Err(rollback) = tx.rollback().await {
                    debug!(error = %rollback, "Rollback failed");
                }
                Err(driver_error(e))
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<(), DriverError> {
        self.conn.close().await.map_err(driver_error)
    }
}
