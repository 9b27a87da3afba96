//! SQL dialect variants
//!
//! One closed set of dialects selected once at builder construction. All
//! syntax differences (placeholders, identifier quoting, type mapping,
//! row-value comparison support) live here so query construction code never
//! branches on dialect names.

use serde::{Deserialize, Serialize};

use crate::types::ColumnType;

/// Supported SQL dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    Postgres,
    MySql,
    Sqlite,
}

impl Dialect {
    /// Placeholder for a parameterized value at a 1-based position
    pub fn placeholder(&self, position: usize) -> String {
        match self {
            Dialect::Postgres => format!("${position}"),
            Dialect::MySql | Dialect::Sqlite => "?".to_string(),
        }
    }

    /// Quote an identifier for embedding in SQL text
    ///
    /// Identifiers reach this point only after allow-list validation; SQLite
    /// identifiers that pass the naming rules are left bare.
    pub fn quote(&self, identifier: &str) -> String {
        match self {
            Dialect::Postgres => format!("\"{}\"", identifier.replace('"', "\"\"")),
            Dialect::MySql => format!("`{}`", identifier.replace('`', "``")),
            Dialect::Sqlite => identifier.to_string(),
        }
    }

    /// SQL type for a column type in this dialect
    pub fn column_sql(&self, column_type: &ColumnType) -> String {
        match self {
            Dialect::Postgres => match column_type {
                ColumnType::String => "TEXT".to_string(),
                ColumnType::Integer => "BIGINT".to_string(),
                ColumnType::Float => "DOUBLE PRECISION".to_string(),
                ColumnType::Decimal { precision, scale } => {
                    format!("NUMERIC({precision},{scale})")
                }
                ColumnType::Boolean => "BOOLEAN".to_string(),
                ColumnType::Datetime => "TIMESTAMPTZ".to_string(),
                ColumnType::Json => "JSONB".to_string(),
            },
            Dialect::MySql => match column_type {
                ColumnType::String => "TEXT".to_string(),
                ColumnType::Integer => "BIGINT".to_string(),
                ColumnType::Float => "DOUBLE".to_string(),
                ColumnType::Decimal { precision, scale } => {
                    format!("DECIMAL({precision},{scale})")
                }
                ColumnType::Boolean => "BOOLEAN".to_string(),
                ColumnType::Datetime => "DATETIME".to_string(),
                ColumnType::Json => "JSON".to_string(),
            },
            Dialect::Sqlite => match column_type {
                ColumnType::String => "TEXT".to_string(),
                ColumnType::Integer => "INTEGER".to_string(),
                ColumnType::Float => "REAL".to_string(),
                ColumnType::Decimal { .. } => "NUMERIC".to_string(),
                ColumnType::Boolean => "INTEGER".to_string(),
                ColumnType::Datetime => "TEXT".to_string(),
                ColumnType::Json => "TEXT".to_string(),
            },
        }
    }

    /// Column definition for the internal autoincrement primary key
    pub fn auto_pk_sql(&self) -> &'static str {
        match self {
            Dialect::Postgres => "id BIGSERIAL PRIMARY KEY",
            Dialect::MySql => "id BIGINT AUTO_INCREMENT PRIMARY KEY",
            Dialect::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        }
    }

    /// Column definition for the exposed ulid identity column
    pub fn ulid_column_sql(&self) -> &'static str {
        match self {
            Dialect::Postgres | Dialect::MySql => "ulid VARCHAR(26) NOT NULL UNIQUE",
            Dialect::Sqlite => "ulid TEXT NOT NULL UNIQUE",
        }
    }

    /// Whether the dialect supports row-value comparisons like
    /// `("a","b") > ($1,$2)` for keyset pagination
    pub fn supports_row_values(&self) -> bool {
        matches!(self, Dialect::Postgres)
    }

    /// Trailing clause for LIKE predicates
    ///
    /// SQLite has no default escape character, so escaped patterns need an
    /// explicit ESCAPE clause.
    pub fn like_escape_clause(&self) -> &'static str {
        match self {
            Dialect::Sqlite => " ESCAPE '\\'",
            Dialect::Postgres | Dialect::MySql => "",
        }
    }
}
