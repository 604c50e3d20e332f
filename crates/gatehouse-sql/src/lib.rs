//! # gatehouse-sql
//!
//! Everything that turns caller input into SQL text:
//!
//! - [`identifier`]: identifier grammar and column-type allowlist
//! - [`safety`]: heuristic guard for free-form query text
//! - [`definition`]: CREATE TABLE request shapes and their validation
//! - [`builder`]: parameterized statement builders for structured operations

pub mod builder;
pub mod definition;
pub mod error;
pub mod identifier;
pub mod safety;

pub use builder::{SqlValue, Statement, quote_ident};
pub use definition::{
    ColumnDefinition, DEFAULT_SCHEMA, ForeignKeyBlock, ForeignKeyRef, ReferentialAction,
    TableDefinition,
};
pub use error::{IdentifierKind, ValidationError};
pub use identifier::{validate_column_type, validate_identifier};
pub use safety::validate_query;
