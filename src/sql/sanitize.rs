//! SQL identifier sanitization
//!
//! Identifier validation is the gate in front of the one place where raw
//! string concatenation into SQL text is permitted: collection and column
//! names are embedded as identifiers only after passing this allow-list.

use std::sync::LazyLock;

use regex::Regex;

use crate::error::{EngineError, Result};

/// SQL reserved keywords that cannot be used as collection or column names
pub const SQL_RESERVED_WORDS: &[&str] = &[
    "ALL",
    "ANALYSE",
    "ANALYZE",
    "AND",
    "ANY",
    "ARRAY",
    "AS",
    "ASC",
    "ASYMMETRIC",
    "BOTH",
    "CASE",
    "CAST",
    "CHECK",
    "COLLATE",
    "COLUMN",
    "CONSTRAINT",
    "CREATE",
    "CURRENT_CATALOG",
    "CURRENT_DATE",
    "CURRENT_ROLE",
    "CURRENT_TIME",
    "CURRENT_TIMESTAMP",
    "CURRENT_USER",
    "DEFAULT",
    "DEFERRABLE",
    "DESC",
    "DISTINCT",
    "DO",
    "ELSE",
    "END",
    "EXCEPT",
    "FALSE",
    "FETCH",
    "FOR",
    "FOREIGN",
    "FROM",
    "GRANT",
    "GROUP",
    "HAVING",
    "IN",
    "INDEX",
    "INITIALLY",
    "INTERSECT",
    "INTO",
    "KEY",
    "LATERAL",
    "LEADING",
    "LIMIT",
    "LOCALTIME",
    "LOCALTIMESTAMP",
    "NOT",
    "NULL",
    "OFFSET",
    "ON",
    "ONLY",
    "OR",
    "ORDER",
    "PLACING",
    "PRIMARY",
    "REFERENCES",
    "RETURNING",
    "SELECT",
    "SESSION_USER",
    "SOME",
    "SYMMETRIC",
    "TABLE",
    "THEN",
    "TO",
    "TRAILING",
    "TRUE",
    "UNION",
    "UNIQUE",
    "USER",
    "USING",
    "VARIADIC",
    "WHEN",
    "WHERE",
    "WINDOW",
    "WITH",
];

/// Column names reserved for system fields synthesized by the engine
pub const RESERVED_COLUMNS: &[&str] = &["id", "ulid"];

static IDENTIFIER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_]*$").expect("identifier regex"));

/// Validate a collection or column name
///
/// Rules:
/// - Must start with a lowercase letter
/// - Can only contain lowercase letters, numbers, and underscores
/// - Cannot be a SQL reserved word
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(EngineError::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if !IDENTIFIER_RE.is_match(name) {
        return Err(EngineError::InvalidIdentifier(format!(
            "'{name}' must start with a lowercase letter and contain only lowercase letters, numbers, and underscores"
        )));
    }

    if SQL_RESERVED_WORDS.contains(&name.to_uppercase().as_str()) {
        return Err(EngineError::InvalidIdentifier(format!(
            "'{name}' is a SQL reserved keyword"
        )));
    }

    Ok(())
}

/// Validate a user-defined column name
///
/// Column names obey the identifier rules and additionally cannot shadow the
/// system fields (`id`, `ulid`).
pub fn validate_column_name(name: &str) -> Result<()> {
    validate_identifier(name)?;

    if RESERVED_COLUMNS.contains(&name) {
        return Err(EngineError::InvalidIdentifier(format!(
            "column name '{name}' is reserved for system fields"
        )));
    }

    Ok(())
}
