//! Row-to-record conversion
//!
//! Driver rows come back in whatever shapes the underlying database uses
//! (SQLite stores booleans as 0/1 integers and datetimes as text). Records
//! leaving the engine honor the registry's type map instead: booleans are JSON
//! booleans, datetimes are RFC 3339 strings, JSON columns are real JSON
//! values. The internal primary key never appears; the `ulid` column is
//! exposed as `id`.

use chrono::{DateTime, Utc};

use crate::driver::Row;
use crate::schema::Collection;
use crate::types::{ColumnType, Value};

/// JSON object shape used for records on the wire
pub type Record = serde_json::Map<String, serde_json::Value>;

/// Convert one driver row into a caller-facing record
pub fn row_to_record(row: &Row, collection: &Collection) -> Record {
    let mut record = Record::new();

    for (name, value) in row.iter() {
        if name == "id" {
            // Internal autoincrement key, never exposed
            continue;
        }
        if name == "ulid" {
            record.insert("id".to_string(), value.to_json());
            continue;
        }

        let json = match collection.column(name) {
            Some(col) => normalize(value, &col.column_type),
            None => value.to_json(),
        };
        record.insert(name.to_string(), json);
    }

    record
}

/// The exposed identity of a row, when present
pub fn record_id(row: &Row) -> Option<&str> {
    match row.get("ulid") {
        Some(Value::Text(id)) => Some(id),
        _ => None,
    }
}

fn normalize(value: &Value, column_type: &ColumnType) -> serde_json::Value {
    if value.is_null() {
        return serde_json::Value::Null;
    }

    match column_type {
        ColumnType::Boolean => serde_json::Value::Bool(as_bool(value)),
        ColumnType::Datetime => match value {
            Value::DateTime(dt) => serde_json::Value::String(dt.to_rfc3339()),
            Value::Text(raw) => DateTime::parse_from_rfc3339(raw)
                .map(|dt| serde_json::Value::String(dt.with_timezone(&Utc).to_rfc3339()))
                .unwrap_or_else(|_| serde_json::Value::String(raw.clone())),
            other => other.to_json(),
        },
        ColumnType::Json => match value {
            Value::Json(v) => v.clone(),
            // SQLite and MySQL may hand JSON back as text
            Value::Text(raw) => serde_json::from_str(raw)
                .unwrap_or_else(|_| serde_json::Value::String(raw.clone())),
            other => other.to_json(),
        },
        _ => value.to_json(),
    }
}

fn as_bool(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Int(i) => *i != 0,
        Value::Float(f) => *f != 0.0,
        Value::Text(s) => matches!(s.as_str(), "1" | "true" | "TRUE" | "t" | "T"),
        _ => false,
    }
}
