//! Core type definitions for the engine
//!
//! Includes column types, column definitions, and the typed scalar `Value`
//! that flows between the condition parser, the query builder, and the driver.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};

// ============================================================================
// Column types
// ============================================================================

/// Column type definition with validation and coercion rules
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ColumnType {
    /// Text field (unlimited length)
    String,

    /// 64-bit integer field
    Integer,

    /// Double-precision float field
    Float,

    /// Fixed-point decimal field with precision and scale
    Decimal {
        /// Total number of digits (default: 19)
        #[serde(default = "default_precision")]
        precision: u8,
        /// Number of digits after the decimal point (default: 4)
        #[serde(default = "default_scale")]
        scale: u8,
    },

    /// Boolean field
    Boolean,

    /// Timestamp field, always handled in UTC, RFC 3339 on the wire
    Datetime,

    /// JSON field
    Json,
}

fn default_precision() -> u8 {
    19
}

fn default_scale() -> u8 {
    4
}

impl ColumnType {
    /// Create a Decimal type with specified precision and scale
    pub fn decimal(precision: u8, scale: u8) -> Self {
        ColumnType::Decimal { precision, scale }
    }

    /// Whether the type participates in numeric aggregation (sum/avg/min/max)
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnType::Integer | ColumnType::Float | ColumnType::Decimal { .. }
        )
    }

    /// Whether range operators (gt/lt/gte/lte) apply to the type
    ///
    /// Strings compare lexically and datetimes chronologically; booleans and
    /// JSON documents have no meaningful ordering.
    pub fn is_orderable(&self) -> bool {
        !matches!(self, ColumnType::Boolean | ColumnType::Json)
    }

    /// Whether the type is searchable text (LIKE, full-text search)
    pub fn is_text(&self) -> bool {
        matches!(self, ColumnType::String)
    }

    /// Coerce a raw query-string value into a typed `Value`
    pub fn coerce_str(&self, raw: &str) -> Result<Value> {
        match self {
            ColumnType::String => Ok(Value::Text(raw.to_string())),
            ColumnType::Integer => raw
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|_| EngineError::invalid_value(format!("'{raw}' is not an integer"))),
            ColumnType::Float => raw
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| EngineError::invalid_value(format!("'{raw}' is not a float"))),
            ColumnType::Decimal { .. } => Decimal::from_str(raw)
                .map(Value::Decimal)
                .map_err(|_| EngineError::invalid_value(format!("'{raw}' is not a decimal"))),
            ColumnType::Boolean => match raw {
                "true" => Ok(Value::Bool(true)),
                "false" => Ok(Value::Bool(false)),
                _ => Err(EngineError::invalid_value(format!(
                    "'{raw}' is not a boolean (expected 'true' or 'false')"
                ))),
            },
            ColumnType::Datetime => DateTime::parse_from_rfc3339(raw)
                .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                .map_err(|e| {
                    EngineError::invalid_value(format!("'{raw}' is not an RFC 3339 datetime: {e}"))
                }),
            // JSON columns filter on their text representation
            ColumnType::Json => Ok(Value::Text(raw.to_string())),
        }
    }

    /// Coerce a JSON body value into a typed `Value`
    ///
    /// Null passes through; nullability is enforced by the caller against the
    /// column definition, not here.
    pub fn coerce_json(&self, value: &serde_json::Value) -> Result<Value> {
        if value.is_null() {
            return Ok(Value::Null);
        }

        match self {
            ColumnType::String => value
                .as_str()
                .map(|s| Value::Text(s.to_string()))
                .ok_or_else(|| EngineError::invalid_value(format!("expected string, got {value}"))),
            ColumnType::Integer => value
                .as_i64()
                .map(Value::Int)
                .or_else(|| value.as_str().and_then(|s| s.parse::<i64>().ok()).map(Value::Int))
                .ok_or_else(|| {
                    EngineError::invalid_value(format!("expected integer, got {value}"))
                }),
            ColumnType::Float => value
                .as_f64()
                .map(Value::Float)
                .or_else(|| value.as_str().and_then(|s| s.parse::<f64>().ok()).map(Value::Float))
                .ok_or_else(|| EngineError::invalid_value(format!("expected float, got {value}"))),
            ColumnType::Decimal { .. } => match value {
                serde_json::Value::Number(n) => Decimal::from_str(&n.to_string())
                    .map(Value::Decimal)
                    .map_err(|_| {
                        EngineError::invalid_value(format!("expected decimal, got {value}"))
                    }),
                serde_json::Value::String(s) => Decimal::from_str(s).map(Value::Decimal).map_err(
                    |_| EngineError::invalid_value(format!("expected decimal, got '{s}'")),
                ),
                _ => Err(EngineError::invalid_value(format!(
                    "expected decimal, got {value}"
                ))),
            },
            ColumnType::Boolean => value
                .as_bool()
                .or_else(|| {
                    value.as_str().and_then(|s| match s.to_lowercase().as_str() {
                        "true" | "1" | "yes" => Some(true),
                        "false" | "0" | "no" => Some(false),
                        _ => None,
                    })
                })
                .map(Value::Bool)
                .ok_or_else(|| {
                    EngineError::invalid_value(format!("expected boolean, got {value}"))
                }),
            ColumnType::Datetime => {
                let raw = value.as_str().ok_or_else(|| {
                    EngineError::invalid_value(format!("expected datetime string, got {value}"))
                })?;
                DateTime::parse_from_rfc3339(raw)
                    .map(|dt| Value::DateTime(dt.with_timezone(&Utc)))
                    .map_err(|e| {
                        EngineError::invalid_value(format!("invalid datetime '{raw}': {e}"))
                    })
            }
            ColumnType::Json => Ok(Value::Json(value.clone())),
        }
    }
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::String => "string",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Decimal { .. } => "decimal",
            ColumnType::Boolean => "boolean",
            ColumnType::Datetime => "datetime",
            ColumnType::Json => "json",
        };
        f.write_str(name)
    }
}

// ============================================================================
// Column definitions
// ============================================================================

fn default_nullable() -> bool {
    true
}

/// Column definition within a collection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Column {
    /// Column name (validated against the identifier rules)
    pub name: String,

    /// Column type with coercion rules
    #[serde(flatten)]
    pub column_type: ColumnType,

    /// Whether the column allows NULL values (default: true)
    #[serde(default = "default_nullable")]
    pub nullable: bool,

    /// Whether the column has a UNIQUE constraint (default: false)
    #[serde(default)]
    pub unique: bool,

    /// Default value (SQL expression, e.g., "0", "NOW()", "'active'")
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "default")]
    pub default_value: Option<String>,
}

impl Column {
    /// Create a new column definition with a name and type
    pub fn new(name: impl Into<String>, column_type: ColumnType) -> Self {
        Self {
            name: name.into(),
            column_type,
            nullable: true,
            unique: false,
            default_value: None,
        }
    }

    /// Set the column as non-nullable
    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    /// Set the column as unique
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Set a default value
    pub fn default(mut self, value: impl Into<String>) -> Self {
        self.default_value = Some(value.into());
        self
    }
}

// ============================================================================
// Typed scalar values
// ============================================================================

/// Typed scalar carried between parser, builder, and driver
///
/// The wire format (JSON request and response bodies) is converted to and
/// from `Value` at the boundary; nothing inside the engine handles untyped
/// data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t", content = "v", rename_all = "lowercase")]
pub enum Value {
    Null,
    Text(String),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Bool(bool),
    DateTime(DateTime<Utc>),
    Json(serde_json::Value),
}

impl Value {
    /// Convert to the JSON wire representation
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Text(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::Number((*i).into()),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::Decimal(d) => {
                use rust_decimal::prelude::ToPrimitive;
                d.to_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(serde_json::Value::Number)
                    .unwrap_or(serde_json::Value::Null)
            }
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Json(v) => v.clone(),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}
