//! Request shapes for structured DDL and their structural validation.

use crate::error::{IdentifierKind, ValidationError};
use crate::identifier::{validate_column_type, validate_identifier};
use gatehouse_core::IdentifierPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Schema used when a request leaves it empty.
pub const DEFAULT_SCHEMA: &str = "public";

/// A table to create.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDefinition {
    #[serde(default)]
    pub schema: String,
    pub table: String,
    pub columns: Vec<ColumnDefinition>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub foreign_keys: Option<ForeignKeyBlock>,
}

/// One column of a [`TableDefinition`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnDefinition {
    pub name: String,
    #[serde(rename = "type")]
    pub data_type: String,
    /// Verbatim SQL default expression.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    #[serde(default)]
    pub primary: bool,
    #[serde(default)]
    pub is_unique: bool,
    #[serde(default)]
    pub is_identity: bool,
    #[serde(default)]
    pub nullable: bool,
}

/// Foreign keys from the new table to one referenced table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyBlock {
    pub schema: String,
    pub table: String,
    pub references: Vec<ForeignKeyRef>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForeignKeyRef {
    pub local_column: String,
    pub foreign_column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_update: Option<ReferentialAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub on_delete: Option<ReferentialAction>,
}

/// `ON UPDATE` / `ON DELETE` action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ReferentialAction {
    Cascade,
    Restrict,
    NoAction,
    SetNull,
    SetDefault,
}

impl ReferentialAction {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Cascade => "CASCADE",
            Self::Restrict => "RESTRICT",
            Self::NoAction => "NO ACTION",
            Self::SetNull => "SET NULL",
            Self::SetDefault => "SET DEFAULT",
        }
    }
}

impl fmt::Display for ReferentialAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

impl TryFrom<String> for ReferentialAction {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        let normalized = value.split_whitespace().collect::<Vec<_>>().join(" ");
        match normalized.to_uppercase().as_str() {
            "CASCADE" => Ok(Self::Cascade),
            "RESTRICT" => Ok(Self::Restrict),
            "NO ACTION" => Ok(Self::NoAction),
            "SET NULL" => Ok(Self::SetNull),
            "SET DEFAULT" => Ok(Self::SetDefault),
            _ => Err(ValidationError::InvalidAction(value)),
        }
    }
}

impl From<ReferentialAction> for String {
    fn from(action: ReferentialAction) -> Self {
        action.as_sql().to_string()
    }
}

impl TableDefinition {
    /// Schema with the `public` fallback applied.
    pub fn schema_name(&self) -> &str {
        if self.schema.is_empty() {
            DEFAULT_SCHEMA
        } else {
            &self.schema
        }
    }

    /// Structural checks on every name, type and default.
    pub fn validate(&self, policy: IdentifierPolicy) -> Result<(), ValidationError> {
        validate_identifier(self.schema_name(), IdentifierKind::Schema, policy)?;
        validate_identifier(&self.table, IdentifierKind::Table, policy)?;

        if self.columns.is_empty() {
            return Err(ValidationError::EmptyInput(
                "at least one column is required",
            ));
        }

        for column in &self.columns {
            validate_identifier(&column.name, IdentifierKind::Column, policy)?;
            validate_column_type(&column.name, &column.data_type)?;
            if let Some(default) = &column.default {
                validate_verbatim_default(&column.name, default)?;
            }
        }

        if let Some(fk) = &self.foreign_keys {
            validate_identifier(&fk.schema, IdentifierKind::ForeignKeySchema, policy)?;
            validate_identifier(&fk.table, IdentifierKind::ForeignKeyTable, policy)?;
            if fk.references.is_empty() {
                return Err(ValidationError::EmptyInput(
                    "foreign key block requires at least one reference",
                ));
            }
            for reference in &fk.references {
                validate_identifier(
                    &reference.local_column,
                    IdentifierKind::ForeignKeyColumn,
                    policy,
                )?;
                validate_identifier(
                    &reference.foreign_column,
                    IdentifierKind::ForeignKeyColumn,
                    policy,
                )?;
            }
        }

        Ok(())
    }
}

/// A CREATE TABLE default is caller SQL pasted into the statement; refuse
/// anything that could end it or hide the rest of it.
fn validate_verbatim_default(column: &str, default: &str) -> Result<(), ValidationError> {
    for token in [";", "--", "/*"] {
        if default.contains(token) {
            return Err(ValidationError::UnsafeDefault {
                column: column.to_string(),
                reason: format!("default expression may not contain '{}'", token),
            });
        }
    }
    Ok(())
}
