//! Heuristic guard for free-form query text.
//!
//! This is not a parser. It blocks a handful of destructive statements and
//! stacked queries; the real protection for structured operations is
//! identifier validation and parameter binding.

use crate::error::ValidationError;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

static COMMENTS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"--[^\n]*|/\*[\s\S]*?\*/").expect("Invalid regex: comment strip pattern")
});

/// Statements never allowed through the gateway, checked as substrings of the
/// normalized text.
const BLOCKED_OPERATIONS: &[&str] = &[
    "DROP DATABASE",
    "DROP SCHEMA",
    "TRUNCATE",
    "ALTER DATABASE",
    "CREATE DATABASE",
    "CREATE SCHEMA",
];

/// Upper-case, strip comments and trim.
pub fn normalize(query: &str) -> String {
    let upper = query.trim().to_uppercase();
    COMMENTS.replace_all(&upper, "").trim().to_string()
}

/// Check raw query text before it is sent to a tenant.
pub fn validate_query(query: &str) -> Result<(), ValidationError> {
    let normalized = normalize(query);

    if normalized.is_empty() {
        return Err(ValidationError::UnsafeQuery(
            "query cannot be empty".to_string(),
        ));
    }

    if let Some(keyword) = BLOCKED_OPERATIONS
        .iter()
        .find(|keyword| normalized.contains(*keyword))
    {
        debug!(keyword, "Blocked operation in query");
        return Err(ValidationError::UnsafeQuery(format!(
            "operation '{}' is not allowed for security reasons",
            keyword
        )));
    }

    if normalized.contains("DELETE FROM") && !normalized.contains("WHERE") {
        return Err(ValidationError::UnsafeQuery(
            "DELETE must include a WHERE clause".to_string(),
        ));
    }

    let statements = normalized
        .split(';')
        .filter(|part| !part.trim().is_empty())
        .count();
    if statements > 1 {
        return Err(ValidationError::UnsafeQuery(
            "multiple statements are not allowed for security reasons".to_string(),
        ));
    }

    Ok(())
}
