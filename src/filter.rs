//! Query parameter parsing
//!
//! Turns untrusted key/value pairs of the form `column[operator]=value` plus
//! the reserved list/sort/pagination parameters into validated, typed inputs
//! for the query builder. Input order is preserved so the rendered SQL text is
//! deterministic.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::schema::Collection;
use crate::types::{ColumnType, Value};

/// Query parameter names that are never interpreted as filters
pub const RESERVED_PARAMS: &[&str] = &["field", "sort", "limit", "after", "fields", "schema", "q"];

static FILTER_KEY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+)\[([a-z]+)\]$").expect("filter key regex"));

// ============================================================================
// Operators and conditions
// ============================================================================

/// Filter operators accepted in query strings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,
    Ne,
    Gt,
    Lt,
    Gte,
    Lte,
    Like,
    In,
}

impl Operator {
    /// Parse the short operator name used in `column[operator]=value`
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "eq" => Some(Self::Eq),
            "ne" => Some(Self::Ne),
            "gt" => Some(Self::Gt),
            "lt" => Some(Self::Lt),
            "gte" => Some(Self::Gte),
            "lte" => Some(Self::Lte),
            "like" => Some(Self::Like),
            "in" => Some(Self::In),
            _ => None,
        }
    }

    /// SQL operator text
    pub fn sql(&self) -> &'static str {
        match self {
            Self::Eq => "=",
            Self::Ne => "!=",
            Self::Gt => ">",
            Self::Lt => "<",
            Self::Gte => ">=",
            Self::Lte => "<=",
            Self::Like => "LIKE",
            Self::In => "IN",
        }
    }

    /// Whether the operator compares by order (gt/lt/gte/lte)
    pub fn is_range(&self) -> bool {
        matches!(self, Self::Gt | Self::Lt | Self::Gte | Self::Lte)
    }
}

/// Value side of a condition: one scalar, or a list for `in`
#[derive(Debug, Clone, PartialEq)]
pub enum ConditionValue {
    Single(Value),
    Many(Vec<Value>),
}

/// A validated filter predicate on one column
///
/// `column` is the physical column name (callers filtering on `id` target the
/// `ulid` column) and has already been checked against the collection schema.
#[derive(Debug, Clone, PartialEq)]
pub struct Condition {
    pub column: String,
    pub operator: Operator,
    pub value: ConditionValue,
}

impl Condition {
    pub fn new(column: impl Into<String>, operator: Operator, value: Value) -> Self {
        Self {
            column: column.into(),
            operator,
            value: ConditionValue::Single(value),
        }
    }
}

/// Escape LIKE wildcards so user input matches literally
///
/// The engine adds its own `%` wildcards around the escaped input.
pub fn escape_like_pattern(raw: &str) -> String {
    raw.replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

// ============================================================================
// Sort specs
// ============================================================================

/// One field of a sort specification
#[derive(Debug, Clone, PartialEq)]
pub struct SortField {
    /// Physical column name (`ulid` for the public `id` field)
    pub column: String,
    pub descending: bool,
}

// ============================================================================
// Parsed list parameters
// ============================================================================

/// Validated query parameters for list and aggregate operations
#[derive(Debug, Clone)]
pub struct ListParams {
    /// Filter conditions, in input order, logically ANDed
    pub conditions: Vec<Condition>,
    /// Sort fields, in input order; empty means ulid order
    pub sort: Vec<SortField>,
    /// Projected physical columns; `None` selects everything
    pub fields: Option<Vec<String>>,
    /// Page size, clamped into `[1, max_limit]`
    pub limit: i64,
    /// Raw cursor token from `after`, not yet decoded
    pub after: Option<String>,
    /// Full-text search term from `q`
    pub search: Option<String>,
    /// Aggregation field from `field`
    pub field: Option<String>,
}

impl ListParams {
    /// Parse and validate raw query pairs against a collection schema
    pub fn parse(
        pairs: &[(String, String)],
        collection: &Collection,
        config: &EngineConfig,
    ) -> Result<Self> {
        let conditions = parse_conditions(pairs, collection, config)?;
        let sort = parse_sort(single(pairs, "sort"), collection, config)?;
        let fields = parse_fields(single(pairs, "fields"), collection)?;
        let limit = parse_limit(single(pairs, "limit"), config)?;

        Ok(Self {
            conditions,
            sort,
            fields,
            limit,
            after: single(pairs, "after").map(str::to_string),
            search: single(pairs, "q").filter(|s| !s.is_empty()).map(str::to_string),
            field: single(pairs, "field").filter(|s| !s.is_empty()).map(str::to_string),
        })
    }
}

fn single<'a>(pairs: &'a [(String, String)], key: &str) -> Option<&'a str> {
    pairs
        .iter()
        .find(|(k, _)| k == key)
        .map(|(_, v)| v.as_str())
}

// ============================================================================
// Filters
// ============================================================================

fn parse_conditions(
    pairs: &[(String, String)],
    collection: &Collection,
    config: &EngineConfig,
) -> Result<Vec<Condition>> {
    let mut conditions = Vec::new();

    for (key, raw_value) in pairs {
        if RESERVED_PARAMS.contains(&key.as_str()) {
            continue;
        }

        let Some(captures) = FILTER_KEY_RE.captures(key) else {
            // Not a filter-shaped parameter
            continue;
        };

        if conditions.len() >= config.max_filters {
            return Err(EngineError::validation(format!(
                "maximum number of filters ({}) exceeded",
                config.max_filters
            )));
        }

        let column_name = &captures[1];
        let op_name = &captures[2];

        let operator = Operator::parse(op_name)
            .ok_or_else(|| EngineError::UnsupportedOperator(op_name.to_string()))?;

        // The public `id` field is the ulid column underneath
        let (physical, column_type) = if column_name == "id" {
            ("ulid".to_string(), ColumnType::String)
        } else {
            let col = collection
                .column(column_name)
                .ok_or_else(|| EngineError::ColumnNotFound(column_name.to_string()))?;
            (col.name.clone(), col.column_type.clone())
        };

        if operator.is_range() && !column_type.is_orderable() {
            return Err(EngineError::UnsupportedOperator(format!(
                "{op_name} is not supported on {column_type} column '{column_name}'"
            )));
        }

        let value = match operator {
            Operator::In => {
                let mut items = Vec::new();
                for part in raw_value.split(',') {
                    items.push(
                        column_type
                            .coerce_str(part.trim())
                            .map_err(|e| e.with_column(column_name))?,
                    );
                }
                ConditionValue::Many(items)
            }
            Operator::Like => {
                if !column_type.is_text() {
                    return Err(EngineError::UnsupportedOperator(format!(
                        "like is not supported on {column_type} column '{column_name}'"
                    )));
                }
                ConditionValue::Single(Value::Text(format!(
                    "%{}%",
                    escape_like_pattern(raw_value)
                )))
            }
            _ => ConditionValue::Single(
                column_type
                    .coerce_str(raw_value)
                    .map_err(|e| e.with_column(column_name))?,
            ),
        };

        conditions.push(Condition {
            column: physical,
            operator,
            value,
        });
    }

    Ok(conditions)
}

// ============================================================================
// Sort
// ============================================================================

fn parse_sort(
    raw: Option<&str>,
    collection: &Collection,
    config: &EngineConfig,
) -> Result<Vec<SortField>> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };

    let mut fields = Vec::new();

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        if fields.len() >= config.max_sort_fields {
            return Err(EngineError::validation(format!(
                "maximum number of sort fields ({}) exceeded",
                config.max_sort_fields
            )));
        }

        let (name, descending) = match part.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (part.strip_prefix('+').unwrap_or(part), false),
        };

        let column = if name == "id" {
            "ulid".to_string()
        } else if collection.has_column(name) {
            name.to_string()
        } else {
            return Err(EngineError::ColumnNotFound(name.to_string()));
        };

        fields.push(SortField { column, descending });
    }

    Ok(fields)
}

// ============================================================================
// Field projection
// ============================================================================

fn parse_fields(raw: Option<&str>, collection: &Collection) -> Result<Option<Vec<String>>> {
    let Some(raw) = raw else {
        return Ok(None);
    };

    // ulid always rides along so pagination cursors stay well-defined
    let mut fields = vec!["ulid".to_string()];

    for part in raw.split(',') {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }

        let physical = if part == "id" {
            "ulid".to_string()
        } else if collection.has_column(part) {
            part.to_string()
        } else {
            return Err(EngineError::ColumnNotFound(part.to_string()));
        };

        if !fields.contains(&physical) {
            fields.push(physical);
        }
    }

    Ok(Some(fields))
}

// ============================================================================
// Limit
// ============================================================================

fn parse_limit(raw: Option<&str>, config: &EngineConfig) -> Result<i64> {
    let Some(raw) = raw else {
        return Ok(config.default_limit);
    };

    let limit: i64 = raw
        .parse()
        .map_err(|_| EngineError::invalid_value(format!("'{raw}' is not a valid limit")))?;

    Ok(limit.clamp(1, config.max_limit))
}
