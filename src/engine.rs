//! Engine facade
//!
//! `DataEngine` wires the registry, the condition parser, the query builder,
//! and the driver into the operation surface handlers call: collection
//! lifecycle, list/get/create/update/destroy, and aggregation. Every
//! operation validates against the registry before any SQL is built, so all
//! recoverable failures happen before the database is touched.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use crate::config::EngineConfig;
use crate::cursor::Cursor;
use crate::driver::Driver;
use crate::error::{EngineError, Result};
use crate::filter::{Condition, ListParams, Operator, SortField};
use crate::migrate;
use crate::record::{Record, record_id, row_to_record};
use crate::registry::SchemaRegistry;
use crate::schema::{Collection, CollectionDescriptor, MigrationBatch};
use crate::sql::{AggregateFunc, DdlGenerator, QueryBuilder, SelectParams};
use crate::types::Value;

/// Response shape for list operations
///
/// `total` reflects the filtered-but-unlimited row count; `next_cursor` is
/// present exactly when rows exist beyond this page.
#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub data: Vec<Record>,
    pub total: i64,
    pub next_cursor: Option<String>,
    pub limit: i64,
}

impl ListResponse {
    fn empty(limit: i64) -> Self {
        Self {
            data: Vec::new(),
            total: 0,
            next_cursor: None,
            limit,
        }
    }
}

/// Response shape for aggregation operations
#[derive(Debug, Serialize)]
pub struct AggregateResponse {
    pub value: serde_json::Value,
}

/// Schema-driven data engine over a SQL database
pub struct DataEngine {
    driver: Arc<dyn Driver>,
    registry: Arc<SchemaRegistry>,
    config: EngineConfig,
}

impl DataEngine {
    /// Create an engine with default configuration and an empty registry
    pub fn new(driver: Arc<dyn Driver>) -> Self {
        Self::with_config(driver, EngineConfig::default())
    }

    /// Create an engine with explicit configuration
    pub fn with_config(driver: Arc<dyn Driver>, config: EngineConfig) -> Self {
        Self {
            driver,
            registry: Arc::new(SchemaRegistry::new()),
            config,
        }
    }

    /// The schema registry backing this engine
    pub fn registry(&self) -> &SchemaRegistry {
        &self.registry
    }

    /// The engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn builder(&self) -> QueryBuilder {
        QueryBuilder::new(self.driver.dialect())
    }

    fn collection(&self, name: &str) -> Result<Collection> {
        self.registry
            .get(name)
            .ok_or_else(|| EngineError::CollectionNotFound(name.to_string()))
    }

    // ========================================================================
    // Collection lifecycle
    // ========================================================================

    /// Create a collection: table first, registry second
    pub async fn create_collection(&self, collection: Collection) -> Result<Collection> {
        collection.validate(self.config.max_columns)?;

        if self.registry.contains(&collection.name) {
            return Err(EngineError::validation(format!(
                "collection '{}' already exists",
                collection.name
            )));
        }
        if self.registry.len() >= self.config.max_collections {
            return Err(EngineError::validation(format!(
                "maximum number of collections ({}) reached",
                self.config.max_collections
            )));
        }

        let ddl = DdlGenerator::new(self.driver.dialect());
        self.driver
            .execute(&ddl.create_table(&collection), &[])
            .await?;

        self.registry.set(collection.clone());
        info!(collection = collection.name, "collection created");

        Ok(collection)
    }

    /// Destroy a collection: drop the table, then forget the schema
    pub async fn destroy_collection(&self, name: &str) -> Result<()> {
        let collection = self.collection(name)?;

        let ddl = DdlGenerator::new(self.driver.dialect());
        self.driver
            .execute(&ddl.drop_table(&collection.name), &[])
            .await?;

        self.registry.remove(name);
        info!(collection = name, "collection destroyed");

        Ok(())
    }

    /// Apply a migration batch to a live collection
    pub async fn apply_migration(
        &self,
        name: &str,
        batch: &MigrationBatch,
    ) -> Result<Collection> {
        migrate::apply(
            self.driver.as_ref(),
            &self.registry,
            name,
            batch,
            self.config.max_columns,
        )
        .await
    }

    /// Schema metadata for one collection
    pub fn describe(&self, name: &str) -> Result<CollectionDescriptor> {
        Ok(CollectionDescriptor::from_collection(&self.collection(name)?))
    }

    /// Snapshots of all collections
    pub fn collections(&self) -> Vec<Collection> {
        self.registry.get_all()
    }

    // ========================================================================
    // List
    // ========================================================================

    /// List records: filters, search, sort, field projection, keyset paging
    pub async fn list(&self, name: &str, raw_params: &[(String, String)]) -> Result<ListResponse> {
        let collection = self.collection(name)?;
        let params = ListParams::parse(raw_params, &collection, &self.config)?;
        let builder = self.builder();

        // Invalid or stale cursors fail closed: an empty page, no query
        let cursor = match &params.after {
            Some(token) => match Cursor::decode(token) {
                Ok(c) if cursor_matches_sort(&c, &params.sort) => Some(c),
                _ => {
                    debug!(collection = name, "rejected cursor; returning empty page");
                    return Ok(ListResponse::empty(params.limit));
                }
            },
            None => None,
        };

        // Total reflects filters and search but never the cursor
        let (count_sql, count_args) =
            builder.count(&collection, &params.conditions, params.search.as_deref());
        let total = value_to_i64(&self.driver.query_value(&count_sql, &count_args).await?);

        let (sql, args) = builder.select(
            &collection,
            &SelectParams {
                fields: params.fields.as_deref(),
                conditions: &params.conditions,
                sort: &params.sort,
                cursor: cursor.as_ref(),
                search: params.search.as_deref(),
                // One extra row reveals whether another page exists
                limit: params.limit + 1,
            },
        );
        let mut rows = self.driver.query(&sql, &args).await?;

        let has_more = rows.len() as i64 > params.limit;
        if has_more {
            rows.truncate(params.limit as usize);
        }

        let next_cursor = if has_more {
            rows.last().and_then(|last| {
                let id = record_id(last)?;
                Some(next_cursor_for(last, &params.sort, id).encode())
            })
        } else {
            None
        };

        let data = rows.iter().map(|r| row_to_record(r, &collection)).collect();

        Ok(ListResponse {
            data,
            total,
            next_cursor,
            limit: params.limit,
        })
    }

    // ========================================================================
    // Get / Create / Update / Destroy
    // ========================================================================

    /// Fetch one record by its exposed id
    pub async fn get(&self, name: &str, id: &str) -> Result<Record> {
        let collection = self.collection(name)?;
        validate_record_id(id)?;
        self.fetch_by_id(&collection, id).await
    }

    /// Insert one record and return it as stored
    pub async fn create(&self, name: &str, data: &serde_json::Value) -> Result<Record> {
        let collection = self.collection(name)?;
        let fields = object_fields(data, &collection)?;

        let id = ulid::Ulid::new().to_string();
        let mut columns = vec!["ulid".to_string()];
        let mut values = vec![Value::Text(id.clone())];

        for col in &collection.columns {
            match fields.get(col.name.as_str()) {
                Some(raw) => {
                    let value = col
                        .column_type
                        .coerce_json(raw)
                        .map_err(|e| e.with_column(&col.name))?;
                    if value.is_null() && !col.nullable {
                        return Err(EngineError::validation(format!(
                            "column '{}' does not allow NULL values",
                            col.name
                        )));
                    }
                    columns.push(col.name.clone());
                    values.push(value);
                }
                None => {
                    if !col.nullable && col.default_value.is_none() {
                        return Err(EngineError::validation(format!(
                            "required column '{}' is missing",
                            col.name
                        )));
                    }
                }
            }
        }

        let (sql, args) = self.builder().insert(&collection.name, &columns, values);
        self.driver.execute(&sql, &args).await?;

        self.fetch_by_id(&collection, &id).await
    }

    /// Update one record and return it as stored
    pub async fn update(
        &self,
        name: &str,
        id: &str,
        data: &serde_json::Value,
    ) -> Result<Record> {
        let collection = self.collection(name)?;
        validate_record_id(id)?;
        let fields = object_fields(data, &collection)?;

        let mut assignments: Vec<(String, Value)> = Vec::new();
        for col in &collection.columns {
            if let Some(raw) = fields.get(col.name.as_str()) {
                let value = col
                    .column_type
                    .coerce_json(raw)
                    .map_err(|e| e.with_column(&col.name))?;
                if value.is_null() && !col.nullable {
                    return Err(EngineError::validation(format!(
                        "column '{}' does not allow NULL values",
                        col.name
                    )));
                }
                assignments.push((col.name.clone(), value));
            }
        }

        if assignments.is_empty() {
            return self.fetch_by_id(&collection, id).await;
        }

        let (sql, args) = self.builder().update(&collection.name, assignments, id);
        let affected = self.driver.execute(&sql, &args).await?;
        if affected == 0 {
            return Err(EngineError::RecordNotFound(id.to_string()));
        }

        self.fetch_by_id(&collection, id).await
    }

    /// Delete one record
    pub async fn destroy(&self, name: &str, id: &str) -> Result<()> {
        let collection = self.collection(name)?;
        validate_record_id(id)?;

        let (sql, args) = self.builder().delete(&collection.name, id);
        let affected = self.driver.execute(&sql, &args).await?;
        if affected == 0 {
            return Err(EngineError::RecordNotFound(id.to_string()));
        }

        Ok(())
    }

    // ========================================================================
    // Aggregation
    // ========================================================================

    /// Run an aggregation over the filtered record set
    ///
    /// `field` comes from the `field` query parameter and is required for
    /// everything but count; it must name a numeric column. An empty match
    /// set yields numeric zero, never null.
    pub async fn aggregate(
        &self,
        name: &str,
        func: AggregateFunc,
        raw_params: &[(String, String)],
    ) -> Result<AggregateResponse> {
        let collection = self.collection(name)?;
        let params = ListParams::parse(raw_params, &collection, &self.config)?;

        let field = if func.requires_field() {
            let field = params
                .field
                .as_deref()
                .ok_or_else(|| EngineError::validation("field parameter is required"))?;
            let col = collection
                .column(field)
                .ok_or_else(|| EngineError::ColumnNotFound(field.to_string()))?;
            if !col.column_type.is_numeric() {
                return Err(EngineError::NonNumericField(format!(
                    "field '{}' is not numeric (type: {})",
                    col.name, col.column_type
                )));
            }
            Some(field.to_string())
        } else {
            None
        };

        let (sql, args) =
            self.builder()
                .aggregate(&collection, func, field.as_deref(), &params.conditions);
        let result = self.driver.query_value(&sql, &args).await?;

        let value = match func {
            AggregateFunc::Count => serde_json::json!(value_to_i64(&result)),
            _ => match result {
                // Aggregates over zero rows surface as SQL NULL; the contract
                // maps that to numeric zero
                Value::Null => serde_json::json!(0),
                other => other.to_json(),
            },
        };

        Ok(AggregateResponse { value })
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    async fn fetch_by_id(&self, collection: &Collection, id: &str) -> Result<Record> {
        let condition = Condition::new("ulid", Operator::Eq, Value::Text(id.to_string()));
        let (sql, args) = self.builder().select(
            collection,
            &SelectParams {
                fields: None,
                conditions: std::slice::from_ref(&condition),
                sort: &[],
                cursor: None,
                search: None,
                limit: 1,
            },
        );

        let rows = self.driver.query(&sql, &args).await?;
        rows.first()
            .map(|r| row_to_record(r, collection))
            .ok_or_else(|| EngineError::RecordNotFound(id.to_string()))
    }
}

/// A cursor is only honored under the sort it was produced for
fn cursor_matches_sort(cursor: &Cursor, sort: &[SortField]) -> bool {
    let primary = sort.first().filter(|s| s.column != "ulid");
    match (&cursor.sort_key, primary) {
        (Some((col, _)), Some(field)) => *col == field.column,
        (None, None) => true,
        _ => false,
    }
}

fn next_cursor_for(row: &crate::driver::Row, sort: &[SortField], id: &str) -> Cursor {
    match sort.first().filter(|s| s.column != "ulid") {
        Some(field) => {
            let value = row.get(&field.column).cloned().unwrap_or(Value::Null);
            Cursor::with_sort_key(field.column.clone(), value, id)
        }
        None => Cursor::new(id),
    }
}

fn validate_record_id(id: &str) -> Result<()> {
    ulid::Ulid::from_string(id)
        .map(|_| ())
        .map_err(|_| EngineError::invalid_value(format!("'{id}' is not a valid record id")))
}

fn object_fields<'a>(
    data: &'a serde_json::Value,
    collection: &Collection,
) -> Result<&'a serde_json::Map<String, serde_json::Value>> {
    let fields = data
        .as_object()
        .ok_or_else(|| EngineError::validation("record data must be a JSON object"))?;

    for key in fields.keys() {
        if !collection.has_column(key) {
            return Err(EngineError::validation(format!("unknown field '{key}'")));
        }
    }

    Ok(fields)
}

fn value_to_i64(value: &Value) -> i64 {
    match value {
        Value::Int(n) => *n,
        Value::Float(f) => *f as i64,
        Value::Decimal(d) => {
            use rust_decimal::prelude::ToPrimitive;
            d.to_i64().unwrap_or(0)
        }
        _ => 0,
    }
}
