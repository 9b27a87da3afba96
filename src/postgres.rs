//! PostgreSQL driver adapter
//!
//! Implements the `Driver` contract over a sqlx connection pool with
//! type-aware parameter binding and row decoding. Cancellation of an engine
//! future propagates into sqlx and aborts the in-flight statement.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::postgres::{PgArguments, PgPool, PgRow};
use sqlx::query::Query;
use sqlx::{Column as _, Postgres, Row as _, TypeInfo as _};

use crate::driver::{Driver, Row};
use crate::error::{EngineError, Result};
use crate::sql::Dialect;
use crate::types::Value;

/// `Driver` implementation backed by a PostgreSQL connection pool
pub struct PgDriver {
    pool: PgPool,
}

impl PgDriver {
    /// Connect to the database and wrap the pool
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url)
            .await
            .map_err(|e| EngineError::execution(format!("database connection failed: {e}")))?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool
    ///
    /// Use this to share one pool between the engine and other consumers.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Reference to the underlying pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn bind_all<'q>(sql: &'q str, args: &'q [Value]) -> Query<'q, Postgres, PgArguments> {
        let mut query = sqlx::query(sql);
        for value in args {
            query = bind_value(query, value);
        }
        query
    }
}

#[async_trait]
impl Driver for PgDriver {
    fn dialect(&self) -> Dialect {
        Dialect::Postgres
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> Result<u64> {
        let result = Self::bind_all(sql, args).execute(&self.pool).await?;
        Ok(result.rows_affected())
    }

    async fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        let rows = Self::bind_all(sql, args).fetch_all(&self.pool).await?;
        Ok(rows.iter().map(decode_row).collect())
    }

    async fn query_value(&self, sql: &str, args: &[Value]) -> Result<Value> {
        let row = Self::bind_all(sql, args).fetch_optional(&self.pool).await?;
        Ok(match row {
            Some(row) => match row.columns().first() {
                Some(col) => decode_column(&row, 0, col.type_info().name()),
                None => Value::Null,
            },
            None => Value::Null,
        })
    }
}

fn bind_value<'q>(
    query: Query<'q, Postgres, PgArguments>,
    value: &'q Value,
) -> Query<'q, Postgres, PgArguments> {
    match value {
        // The builder renders NULL inline; this arm is a safety net
        Value::Null => query.bind(None::<String>),
        Value::Text(s) => query.bind(s.as_str()),
        Value::Int(i) => query.bind(*i),
        Value::Float(f) => query.bind(*f),
        Value::Decimal(d) => query.bind(*d),
        Value::Bool(b) => query.bind(*b),
        Value::DateTime(dt) => query.bind(*dt),
        Value::Json(v) => query.bind(v),
    }
}

fn decode_row(pg_row: &PgRow) -> Row {
    let mut row = Row::new();
    for (index, column) in pg_row.columns().iter().enumerate() {
        let value = decode_column(pg_row, index, column.type_info().name());
        row.push(column.name(), value);
    }
    row
}

fn decode_column(row: &PgRow, index: usize, type_name: &str) -> Value {
    let decoded = match type_name {
        "BOOL" => row
            .try_get::<Option<bool>, _>(index)
            .ok()
            .flatten()
            .map(Value::Bool),
        "INT2" => row
            .try_get::<Option<i16>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(i64::from(v))),
        "INT4" => row
            .try_get::<Option<i32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Int(i64::from(v))),
        "INT8" => row
            .try_get::<Option<i64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Int),
        "FLOAT4" => row
            .try_get::<Option<f32>, _>(index)
            .ok()
            .flatten()
            .map(|v| Value::Float(f64::from(v))),
        "FLOAT8" => row
            .try_get::<Option<f64>, _>(index)
            .ok()
            .flatten()
            .map(Value::Float),
        "NUMERIC" => row
            .try_get::<Option<rust_decimal::Decimal>, _>(index)
            .ok()
            .flatten()
            .map(Value::Decimal),
        "TIMESTAMPTZ" => row
            .try_get::<Option<DateTime<Utc>>, _>(index)
            .ok()
            .flatten()
            .map(Value::DateTime),
        "TIMESTAMP" => row
            .try_get::<Option<NaiveDateTime>, _>(index)
            .ok()
            .flatten()
            .map(|naive| Value::DateTime(DateTime::from_naive_utc_and_offset(naive, Utc))),
        "JSON" | "JSONB" => row
            .try_get::<Option<serde_json::Value>, _>(index)
            .ok()
            .flatten()
            .map(Value::Json),
        _ => row
            .try_get::<Option<String>, _>(index)
            .ok()
            .flatten()
            .map(Value::Text),
    };

    decoded.unwrap_or(Value::Null)
}
