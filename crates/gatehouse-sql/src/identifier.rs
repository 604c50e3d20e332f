//! Identifier and column-type validation.
//!
//! Identifiers and types end up interpolated into DDL and DML text, so they
//! are checked against a closed grammar before any statement is built.

use crate::error::{IdentifierKind, ValidationError};
use gatehouse_core::IdentifierPolicy;
use regex::Regex;
use std::sync::LazyLock;

/// Postgres truncates identifiers longer than this (NAMEDATALEN - 1).
pub const MAX_IDENTIFIER_BYTES: usize = 63;

static STRICT_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$]*$").expect("Invalid regex: strict identifier pattern")
});

static HYPHEN_IDENTIFIER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z_][A-Za-z0-9_$\-]*$").expect("Invalid regex: hyphen identifier pattern")
});

/// Allowed column types: a base type, then an optional `(n)` / `(n, m)`
/// parameter list, an optional time zone suffix and an optional array suffix.
/// Matched against the upper-cased, trimmed type string.
static COLUMN_TYPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?x)
        ^(?:
            DOUBLE\s+PRECISION | CHARACTER\s+VARYING | CHARACTER
          | BIGSERIAL | BIGINT | SMALLINT | SERIAL | INTEGER | INT[248]?
          | DECIMAL | NUMERIC | REAL
          | BOOLEAN | BOOL
          | VARCHAR | CHAR | TEXT
          | DATE | TIMESTAMPTZ | TIMESTAMP | TIME | INTERVAL
          | UUID | JSONB | JSON | BYTEA
        )
        (?:\s*\(\s*\d+\s*(?:,\s*\d+\s*)?\))?
        (?:\s+WITH(?:OUT)?\s+TIME\s+ZONE)?
        (?:\s*\[\s*\])?
        $",
    )
    .expect("Invalid regex: column type pattern")
});

/// Validate a schema, table, column or foreign-key identifier.
pub fn validate_identifier(
    name: &str,
    kind: IdentifierKind,
    policy: IdentifierPolicy,
) -> Result<(), ValidationError> {
    if name.is_empty() {
        return Err(ValidationError::identifier(kind, name, "identifier cannot be empty"));
    }
    if name.len() > MAX_IDENTIFIER_BYTES {
        return Err(ValidationError::identifier(
            kind,
            name,
            "identifier exceeds 63 bytes",
        ));
    }

    let (pattern, reason) = match policy {
        IdentifierPolicy::Strict => (
            &*STRICT_IDENTIFIER,
            "must start with a letter or underscore and contain only letters, digits, underscores and dollar signs",
        ),
        IdentifierPolicy::AllowHyphens => (
            &*HYPHEN_IDENTIFIER,
            "must start with a letter or underscore and contain only letters, digits, underscores, dollar signs and hyphens",
        ),
    };

    if pattern.is_match(name) {
        Ok(())
    } else {
        Err(ValidationError::identifier(kind, name, reason))
    }
}

/// Validate a column type string against the allowlist.
pub fn validate_column_type(column: &str, type_name: &str) -> Result<(), ValidationError> {
    let normalized = type_name.trim().to_uppercase();
    if normalized.is_empty() || !COLUMN_TYPE.is_match(&normalized) {
        return Err(ValidationError::InvalidType {
            column: column.to_string(),
            type_name: type_name.to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strict(name: &str) -> Result<(), ValidationError> {
        validate_identifier(name, IdentifierKind::Table, IdentifierPolicy::Strict)
    }

    #[test]
    fn test_accepts_canonical_identifiers() {
        for name in ["users", "_private", "Orders2024", "price$usd", "a"] {
            assert!(strict(name).is_ok(), "{name} should be accepted");
        }
    }

    #[test]
    fn test_rejects_injection_characters() {
        for name in [
            "users;",
            "users--",
            "o'brien",
            "bad\"name",
            "f(x)",
            "x)",
            "drop table",
            "1bad",
            "9",
            "",
        ] {
            assert!(strict(name).is_err(), "{name:?} should be rejected");
        }
    }

    #[test]
    fn test_length_limit_is_bytes() {
        let ok = "a".repeat(63);
        let too_long = "a".repeat(64);
        assert!(strict(&ok).is_ok());
        assert!(strict(&too_long).is_err());
    }

    #[test]
    fn test_hyphen_policy() {
        assert!(strict("order-items").is_err());
        assert!(
            validate_identifier(
                "order-items",
                IdentifierKind::Column,
                IdentifierPolicy::AllowHyphens
            )
            .is_ok()
        );
        assert!(
            validate_identifier("-lead", IdentifierKind::Column, IdentifierPolicy::AllowHyphens)
                .is_err()
        );
        let too_long = format!("a-{}", "b".repeat(62));
        assert!(
            validate_identifier(&too_long, IdentifierKind::Column, IdentifierPolicy::AllowHyphens)
                .is_err()
        );
    }

    #[test]
    fn test_error_names_kind_and_value() {
        let err = validate_identifier("1bad", IdentifierKind::Column, IdentifierPolicy::Strict)
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("column"));
        assert!(message.contains("1bad"));
    }

    #[test]
    fn test_accepts_allowed_types() {
        for ty in [
            "INT",
            "integer",
            "BIGINT",
            "int8",
            "serial",
            "VARCHAR(50)",
            "varchar (255)",
            "NUMERIC(10, 2)",
            "decimal(8,3)",
            "DOUBLE PRECISION",
            "boolean",
            "TEXT",
            "text[]",
            "TIMESTAMP WITH TIME ZONE",
            "timestamp(3) without time zone",
            "TIMESTAMPTZ",
            "TIME",
            "date",
            "INTERVAL",
            "UUID",
            "jsonb",
            "BYTEA",
            "character varying(20)",
        ] {
            assert!(validate_column_type("c", ty).is_ok(), "{ty} should be accepted");
        }
    }

    #[test]
    fn test_rejects_disallowed_types() {
        for ty in [
            "",
            "MONEY",
            "geometry",
            "INT; DROP TABLE users",
            "VARCHAR(50) DEFAULT 'x'",
            "TEXT) --",
            "INTEGERX",
            "NUMERIC(a)",
            "TEXT COLLATE \"C\"",
        ] {
            assert!(validate_column_type("c", ty).is_err(), "{ty:?} should be rejected");
        }
    }
}
