//! Gateway operations.
//!
//! Every operation follows the same shape:
//!
//! 1. Structural validation of names, types and defaults. Failures are hard
//!    errors and nothing is sent or recorded.
//! 2. Tenant resolution. Failures are hard errors; if an instance was already
//!    identified the attempt is recorded as failed.
//! 3. Connect, execute, close, all under one deadline.
//! 4. Exactly one history record for the attempt.

use crate::error::GatewayError;
use crate::executor::{self, DriverError, RowSet, StatementKind, TenantConnector, TenantSession};
use crate::request::{
    AddColumnRequest, AddColumnResponse, CreateTableRequest, DdlResponse, DeleteColumnRequest,
    DeleteRowRequest, DeleteTableRequest, ExecuteQueryRequest, ExecuteQueryResponse,
    InsertRowRequest, InsertRowResponse,
};
use gatehouse_audit::AuditLogger;
use gatehouse_core::{IdentifierPolicy, QueryHistory, TenantConfig, TenantTarget};
use gatehouse_locator::TenantLocator;
use gatehouse_sql::builder;
use gatehouse_sql::{
    DEFAULT_SCHEMA, IdentifierKind, SqlValue, Statement, ValidationError, validate_column_type,
    validate_identifier, validate_query,
};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Row-identifying column used when a delete request names none.
pub const DEFAULT_KEY_COLUMN: &str = "id";

const ROW_ID_UNAVAILABLE: &str =
    "row inserted but its id could not be read back; query the table to find it";

/// Composition root for tenant operations.
#[derive(Clone)]
pub struct Gateway {
    locator: TenantLocator,
    connector: Arc<dyn TenantConnector>,
    audit: AuditLogger,
    policy: IdentifierPolicy,
    operation_timeout: Duration,
}

impl Gateway {
    pub fn new(
        locator: TenantLocator,
        connector: Arc<dyn TenantConnector>,
        audit: AuditLogger,
        config: &TenantConfig,
    ) -> Self {
        Self {
            locator,
            connector,
            audit,
            policy: config.identifier_policy,
            operation_timeout: config.operation_timeout(),
        }
    }

    /// Run free-form SQL.
    ///
    /// Safety rejections and driver failures come back inside the result's
    /// `error` field; only resolution failures are returned as errors.
    pub async fn execute_query(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: &ExecuteQueryRequest,
    ) -> Result<ExecuteQueryResponse, GatewayError> {
        let started = Instant::now();
        let query = request.query.as_str();
        let target = self.route(user_id, project_id, query, started).await?;

        let mut result = match validate_query(query) {
            Err(e) => {
                debug!(%project_id, error = %e, "Query rejected by safety check");
                executor::QueryResult::failed(e.to_string())
            }
            Ok(()) => {
                let kind = StatementKind::classify(query);
                let statement = Statement::new(query);
                self.within_deadline(async {
                    let mut session = self.connector.connect(&target).await?;
                    let result = executor::execute(session.as_mut(), kind, &statement).await;
                    finish(session, result).await
                })
                .await
                .unwrap_or_else(|e| executor::QueryResult::failed(e.message))
            }
        };

        let elapsed = elapsed_ms(started);
        result.execution_time_ms = elapsed;
        let execution_id = self
            .audit
            .record(target.instance_id, user_id, query, result.is_success(), elapsed)
            .await;

        info!(
            %project_id,
            instance_id = %target.instance_id,
            %execution_id,
            success = result.is_success(),
            rows = result.row_count,
            elapsed_ms = elapsed,
            "Query executed"
        );

        Ok(ExecuteQueryResponse {
            result,
            execution_id,
            execution_time_ms: elapsed,
        })
    }

    /// Insert one row with bound values, reading back its `id` when the table
    /// has one.
    pub async fn insert_row(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: &InsertRowRequest,
    ) -> Result<InsertRowResponse, GatewayError> {
        self.ident(&request.table, IdentifierKind::Table)?;
        if request.values.is_empty() {
            return Err(ValidationError::EmptyInput("values cannot be empty").into());
        }
        for column in request.values.keys() {
            self.ident(column, IdentifierKind::Column)?;
        }

        let audit_text = builder::insert(&request.table, &request.values, &HashMap::new(), false).sql;
        let table = request.table.as_str();
        let values = &request.values;

        self.run_routed(user_id, project_id, "insert_row", &audit_text, |mut session| async move {
            let result = insert_into(session.as_mut(), table, values).await;
            (session, result)
        })
        .await
    }

    /// Delete the row whose key column equals `row_id`.
    pub async fn delete_row(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        row_id: &str,
        request: &DeleteRowRequest,
    ) -> Result<(), GatewayError> {
        let key_column = request.key_column.as_deref().unwrap_or(DEFAULT_KEY_COLUMN);
        self.ident(&request.table_name, IdentifierKind::Table)?;
        self.ident(key_column, IdentifierKind::Column)?;
        if row_id.trim().is_empty() {
            return Err(ValidationError::EmptyInput("row id cannot be empty").into());
        }

        let table = request.table_name.as_str();
        let audit_text =
            builder::delete_row(table, key_column, SqlValue::Text(row_id.to_string()), None).sql;

        let affected = self
            .run_routed(user_id, project_id, "delete_row", &audit_text, |mut session| async move {
                let types = column_types(session.as_mut(), table).await;
                let cast = types.get(key_column).map(String::as_str);
                let key = match (cast, row_id.parse::<i64>()) {
                    (None, Ok(id)) => SqlValue::Int(id),
                    _ => SqlValue::Text(row_id.to_string()),
                };
                let statement = builder::delete_row(table, key_column, key, cast);
                debug!(sql = %statement.sql, "Deleting row");
                let result = session.execute(&statement).await;
                (session, result)
            })
            .await?;

        if affected == 0 {
            return Err(GatewayError::RowNotFound);
        }
        Ok(())
    }

    pub async fn add_column(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: &AddColumnRequest,
    ) -> Result<AddColumnResponse, GatewayError> {
        self.ident(&request.table_name, IdentifierKind::Table)?;
        self.ident(&request.name, IdentifierKind::Column)?;
        validate_column_type(&request.name, &request.data_type)?;
        let statement = builder::add_column(
            &request.table_name,
            &request.name,
            &request.data_type,
            request.default.as_ref(),
        )?;

        let probe = builder::column_position_probe(&request.table_name, &request.name);
        let statement_ref = &statement;
        let probe_ref = &probe;

        self.run_routed(
            user_id,
            project_id,
            "add_column",
            &statement.sql,
            |mut session| async move {
                if let Err(e) = session.execute(statement_ref).await {
                    return (session, Err(e));
                }
                let column_id = match session.query(probe_ref).await {
                    Ok(set) => first_i64(&set, "ordinal_position").unwrap_or(0),
                    Err(e) => {
                        debug!(error = %e, "Could not read back column position");
                        0
                    }
                };
                (session, Ok(AddColumnResponse { column_id }))
            },
        )
        .await
    }

    pub async fn delete_column(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        column_name: &str,
        request: &DeleteColumnRequest,
    ) -> Result<(), GatewayError> {
        self.ident(&request.table_name, IdentifierKind::Table)?;
        self.ident(column_name, IdentifierKind::Column)?;
        let statement = builder::drop_column(&request.table_name, column_name);
        let statement_ref = &statement;

        self.run_routed(
            user_id,
            project_id,
            "delete_column",
            &statement.sql,
            |mut session| async move {
                let result = session.execute(statement_ref).await;
                (session, result)
            },
        )
        .await
        .map(|_| ())
    }

    pub async fn create_table(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: &CreateTableRequest,
    ) -> Result<DdlResponse, GatewayError> {
        request.validate(self.policy)?;
        let statement = builder::create_table(request);
        self.run_ddl(user_id, project_id, "create_table", &statement)
            .await
    }

    pub async fn delete_table(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        request: &DeleteTableRequest,
    ) -> Result<DdlResponse, GatewayError> {
        let schema = if request.schema.is_empty() {
            DEFAULT_SCHEMA
        } else {
            request.schema.as_str()
        };
        self.ident(schema, IdentifierKind::Schema)?;
        self.ident(&request.table, IdentifierKind::Table)?;
        let statement = builder::drop_table(schema, &request.table);
        self.run_ddl(user_id, project_id, "delete_table", &statement)
            .await
    }

    /// The caller's most recent history records, newest first.
    pub async fn query_history(
        &self,
        user_id: Uuid,
        limit: Option<usize>,
    ) -> Result<Vec<QueryHistory>, GatewayError> {
        self.audit
            .history_for_user(user_id, limit)
            .await
            .map_err(|e| GatewayError::Catalog(e.to_string()))
    }

    fn ident(&self, name: &str, kind: IdentifierKind) -> Result<(), ValidationError> {
        validate_identifier(name, kind, self.policy)
    }

    async fn run_ddl(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        operation: &'static str,
        statement: &Statement,
    ) -> Result<DdlResponse, GatewayError> {
        debug!(sql = %statement.sql, operation, "Running DDL");
        self.run_routed(
            user_id,
            project_id,
            operation,
            &statement.sql,
            |mut session| async move {
                let result = session.execute_in_transaction(statement).await;
                (session, result)
            },
        )
        .await
        .map(|rows_affected| DdlResponse { rows_affected })
    }

    /// Resolve the tenant, recording a failed attempt when the failure can be
    /// attributed to an instance.
    async fn route(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        audit_text: &str,
        started: Instant,
    ) -> Result<TenantTarget, GatewayError> {
        match self.locator.locate(user_id, project_id).await {
            Ok(target) => Ok(target),
            Err(e) => {
                if let Some(instance_id) = e.instance_id() {
                    self.audit
                        .record(instance_id, user_id, audit_text, false, elapsed_ms(started))
                        .await;
                }
                warn!(%project_id, error = %e, "Tenant resolution failed");
                Err(e.into())
            }
        }
    }

    /// Route, connect, run `body`, close and record one history row.
    async fn run_routed<T, F, Fut>(
        &self,
        user_id: Uuid,
        project_id: Uuid,
        operation: &'static str,
        audit_text: &str,
        body: F,
    ) -> Result<T, GatewayError>
    where
        T: Send,
        F: FnOnce(Box<dyn TenantSession>) -> Fut + Send,
        Fut: Future<Output = (Box<dyn TenantSession>, Result<T, DriverError>)> + Send,
    {
        let started = Instant::now();
        let target = self.route(user_id, project_id, audit_text, started).await?;

        let outcome = self
            .within_deadline(async {
                let session = self.connector.connect(&target).await?;
                let (session, result) = body(session).await;
                finish(session, result).await
            })
            .await;

        let elapsed = elapsed_ms(started);
        self.audit
            .record(target.instance_id, user_id, audit_text, outcome.is_ok(), elapsed)
            .await;

        match &outcome {
            Ok(_) => info!(
                operation,
                %project_id,
                instance_id = %target.instance_id,
                elapsed_ms = elapsed,
                "Operation completed"
            ),
            Err(e) => warn!(
                operation,
                %project_id,
                instance_id = %target.instance_id,
                code = e.code.as_deref().unwrap_or(""),
                error = %e,
                "Operation failed"
            ),
        }

        outcome.map_err(GatewayError::from)
    }

    async fn within_deadline<T, F>(&self, future: F) -> Result<T, DriverError>
    where
        F: Future<Output = Result<T, DriverError>>,
    {
        match tokio::time::timeout(self.operation_timeout, future).await {
            Ok(result) => result,
            Err(_) => Err(DriverError::timeout(self.operation_timeout)),
        }
    }
}

async fn finish<T>(
    session: Box<dyn TenantSession>,
    result: Result<T, DriverError>,
) -> Result<T, DriverError> {
    if let Err(e) = session.close().await {
        debug!(error = %e, "Closing tenant session failed");
    }
    result
}

fn elapsed_ms(started: Instant) -> u64 {
    u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX)
}

/// Catalog type names of a table's columns. Empty when the lookup fails.
async fn column_types(session: &mut dyn TenantSession, table: &str) -> HashMap<String, String> {
    match session.query(&builder::column_types_probe(table)).await {
        Ok(set) => set
            .rows
            .iter()
            .filter_map(|row| {
                let name = row.get("column_name")?.as_str()?;
                let udt = row.get("udt_name")?.as_str()?;
                Some((name.to_string(), udt.to_string()))
            })
            .collect(),
        Err(e) => {
            debug!(table, error = %e, "Column type probe failed");
            HashMap::new()
        }
    }
}

fn first_i64(set: &RowSet, column: &str) -> Option<i64> {
    set.rows.first()?.get(column)?.as_i64()
}

async fn insert_into(
    session: &mut dyn TenantSession,
    table: &str,
    values: &Map<String, Value>,
) -> Result<InsertRowResponse, DriverError> {
    let types = column_types(session, table).await;

    if types.contains_key("id") {
        let statement = builder::insert(table, values, &types, true);
        debug!(sql = %statement.sql, "Inserting row");
        match session.query(&statement).await {
            Ok(set) => {
                return Ok(match first_i64(&set, "id") {
                    Some(row_id) => InsertRowResponse {
                        row_id,
                        note: None,
                    },
                    None => InsertRowResponse {
                        row_id: 0,
                        note: Some(ROW_ID_UNAVAILABLE.to_string()),
                    },
                });
            }
            Err(e) if e.is_undefined_column() => {
                debug!(table, "RETURNING id failed, retrying without it");
            }
            Err(e) => return Err(e),
        }
    }

    let statement = builder::insert(table, values, &types, false);
    debug!(sql = %statement.sql, "Inserting row");
    if session.execute(&statement).await? == 0 {
        return Err(DriverError::new("no rows were inserted"));
    }
    Ok(InsertRowResponse {
        row_id: 0,
        note: Some(ROW_ID_UNAVAILABLE.to_string()),
    })
}
