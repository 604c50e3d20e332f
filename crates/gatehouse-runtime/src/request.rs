//! Request and response bodies for gateway operations.

use crate::executor::QueryResult;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub use gatehouse_sql::TableDefinition as CreateTableRequest;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteQueryRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteQueryResponse {
    pub result: QueryResult,
    /// Id of the history record written for this execution.
    pub execution_id: Uuid,
    pub execution_time_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsertRowRequest {
    pub table: String,
    pub values: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InsertRowResponse {
    /// The inserted row's integer `id`, or 0 when it could not be read back.
    pub row_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteRowRequest {
    pub table_name: String,
    /// Column identifying the row; `id` when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key_column: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddColumnRequest {
    pub table_name: String,
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddColumnResponse {
    /// Ordinal position of the new column, 0 if it could not be read back.
    pub column_id: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteColumnRequest {
    pub table_name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeleteTableRequest {
    #[serde(default)]
    pub schema: String,
    pub table: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DdlResponse {
    pub rows_affected: u64,
}
