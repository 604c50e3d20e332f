//! # gatehouse-runtime
//!
//! Gateway operations over a routed tenant database.
//!
//! - [`Gateway`]: the seven tenant operations plus history lookup
//! - [`TenantConnector`] / [`TenantSession`]: the driver seam, implemented
//!   for Postgres in `gatehouse-adapter-pg`
//! - [`GatewayError`]: hard failures, each with a stable `kind()`

pub mod error;
pub mod executor;
pub mod gateway;
pub mod request;

pub use error::GatewayError;
pub use executor::{
    DriverError, QueryResult, Row, RowSet, StatementKind, TenantConnector, TenantSession,
    UNDEFINED_COLUMN,
};
pub use gateway::{DEFAULT_KEY_COLUMN, Gateway};
pub use request::{
    AddColumnRequest, AddColumnResponse, CreateTableRequest, DdlResponse, DeleteColumnRequest,
    DeleteRowRequest, DeleteTableRequest, ExecuteQueryRequest, ExecuteQueryResponse,
    InsertRowRequest, InsertRowResponse,
};
