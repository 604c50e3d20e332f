//! Validation error types.

use std::fmt;

/// What an identifier names. Carried in errors so callers can tell which part
/// of a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentifierKind {
    Schema,
    Table,
    Column,
    ForeignKeySchema,
    ForeignKeyTable,
    ForeignKeyColumn,
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Schema => "schema",
            Self::Table => "table",
            Self::Column => "column",
            Self::ForeignKeySchema => "foreign key schema",
            Self::ForeignKeyTable => "foreign key table",
            Self::ForeignKeyColumn => "foreign key column",
        })
    }
}

/// Rejection of caller input before any SQL is sent.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("invalid {kind} name '{name}': {reason}")]
    InvalidIdentifier {
        kind: IdentifierKind,
        name: String,
        reason: &'static str,
    },

    #[error("invalid column type for '{column}': {type_name}")]
    InvalidType { column: String, type_name: String },

    #[error("unsafe default for column '{column}': {reason}")]
    UnsafeDefault { column: String, reason: String },

    #[error("invalid referential action '{0}'")]
    InvalidAction(String),

    #[error("{0}")]
    EmptyInput(&'static str),

    /// Raw query text rejected by the safety guard.
    #[error("{0}")]
    UnsafeQuery(String),
}

impl ValidationError {
    pub(crate) fn identifier(kind: IdentifierKind, name: &str, reason: &'static str) -> Self {
        Self::InvalidIdentifier {
            kind,
            name: name.to_string(),
            reason,
        }
    }
}
