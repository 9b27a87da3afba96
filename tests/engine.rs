//! End-to-end engine tests over a scripted mock driver
//!
//! The mock records every statement and its bound parameters, and serves
//! queued responses per call kind, so these tests exercise the full
//! registry → parser → builder → driver path without a live database.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use mesa::{
    AggregateFunc, Collection, Column, ColumnType, Cursor, DataEngine, Dialect, Driver,
    EngineError, MigrationBatch, Row, Value,
};

// ============================================================================
// Mock driver
// ============================================================================

struct MockDriver {
    dialect: Dialect,
    exec: Mutex<VecDeque<Result<u64, String>>>,
    rows: Mutex<VecDeque<Result<Vec<Row>, String>>>,
    values: Mutex<VecDeque<Result<Value, String>>>,
    log: Mutex<Vec<(String, Vec<Value>)>>,
}

impl MockDriver {
    fn new(dialect: Dialect) -> Arc<Self> {
        Arc::new(Self {
            dialect,
            exec: Mutex::default(),
            rows: Mutex::default(),
            values: Mutex::default(),
            log: Mutex::default(),
        })
    }

    fn expect_exec(&self, affected: u64) {
        self.exec.lock().unwrap().push_back(Ok(affected));
    }

    fn fail_exec(&self, message: &str) {
        self.exec.lock().unwrap().push_back(Err(message.to_string()));
    }

    fn expect_rows(&self, rows: Vec<Row>) {
        self.rows.lock().unwrap().push_back(Ok(rows));
    }

    fn expect_value(&self, value: Value) {
        self.values.lock().unwrap().push_back(Ok(value));
    }

    fn executed(&self) -> Vec<(String, Vec<Value>)> {
        self.log.lock().unwrap().clone()
    }

    fn statements(&self) -> Vec<String> {
        self.executed().into_iter().map(|(sql, _)| sql).collect()
    }

    fn record(&self, sql: &str, args: &[Value]) {
        self.log
            .lock()
            .unwrap()
            .push((sql.to_string(), args.to_vec()));
    }
}

#[async_trait]
impl Driver for MockDriver {
    fn dialect(&self) -> Dialect {
        self.dialect
    }

    async fn execute(&self, sql: &str, args: &[Value]) -> mesa::Result<u64> {
        self.record(sql, args);
        match self.exec.lock().unwrap().pop_front() {
            Some(Ok(n)) => Ok(n),
            Some(Err(m)) => Err(EngineError::QueryExecutionFailed(m)),
            None => Ok(1),
        }
    }

    async fn query(&self, sql: &str, args: &[Value]) -> mesa::Result<Vec<Row>> {
        self.record(sql, args);
        match self.rows.lock().unwrap().pop_front() {
            Some(Ok(rows)) => Ok(rows),
            Some(Err(m)) => Err(EngineError::QueryExecutionFailed(m)),
            None => Ok(Vec::new()),
        }
    }

    async fn query_value(&self, sql: &str, args: &[Value]) -> mesa::Result<Value> {
        self.record(sql, args);
        match self.values.lock().unwrap().pop_front() {
            Some(Ok(v)) => Ok(v),
            Some(Err(m)) => Err(EngineError::QueryExecutionFailed(m)),
            None => Ok(Value::Null),
        }
    }
}

// ============================================================================
// Fixtures
// ============================================================================

const U1: &str = "01ARZ3NDEKTSV4RRFFQ69G5FA1";
const U2: &str = "01ARZ3NDEKTSV4RRFFQ69G5FA2";
const U3: &str = "01ARZ3NDEKTSV4RRFFQ69G5FA3";
const U4: &str = "01ARZ3NDEKTSV4RRFFQ69G5FA4";
const U5: &str = "01ARZ3NDEKTSV4RRFFQ69G5FA5";

fn orders_collection() -> Collection {
    Collection::new(
        "orders",
        vec![
            Column::new("total", ColumnType::Integer).not_null(),
            Column::new("status", ColumnType::String),
        ],
    )
}

fn order_row(ulid: &str, total: i64, status: &str) -> Row {
    Row::new()
        .with("id", Value::Int(0))
        .with("ulid", Value::Text(ulid.to_string()))
        .with("total", Value::Int(total))
        .with("status", Value::Text(status.to_string()))
}

async fn orders_engine(dialect: Dialect) -> (Arc<MockDriver>, DataEngine) {
    let driver = MockDriver::new(dialect);
    let engine = DataEngine::new(driver.clone());
    engine.create_collection(orders_collection()).await.unwrap();
    (driver, engine)
}

fn params(items: &[(&str, &str)]) -> Vec<(String, String)> {
    items
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Collection lifecycle
// ============================================================================

#[tokio::test]
async fn create_collection_issues_ddl_and_registers() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    let statements = driver.statements();
    assert_eq!(statements.len(), 1);
    assert!(statements[0].starts_with("CREATE TABLE \"orders\""));
    assert!(engine.registry().contains("orders"));
}

#[tokio::test]
async fn create_collection_duplicate_rejected() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine
        .create_collection(orders_collection())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn create_collection_reserved_column_rejected() {
    let driver = MockDriver::new(Dialect::Postgres);
    let engine = DataEngine::new(driver.clone());

    let err = engine
        .create_collection(Collection::new(
            "orders",
            vec![Column::new("id", ColumnType::String)],
        ))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::InvalidIdentifier(_)));
    assert!(driver.statements().is_empty());
}

#[tokio::test]
async fn destroy_collection_drops_table_and_unregisters() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    engine.destroy_collection("orders").await.unwrap();

    assert!(!engine.registry().contains("orders"));
    assert_eq!(driver.statements()[1], "DROP TABLE \"orders\"");
}

#[tokio::test]
async fn describe_exposes_id_not_internals() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;

    let descriptor = engine.describe("orders").unwrap();
    assert_eq!(descriptor.primary_key, "id");
    let names: Vec<&str> = descriptor.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["id", "total", "status"]);
}

// ============================================================================
// Aggregation scenarios
// ============================================================================

#[tokio::test]
async fn sum_over_orders() {
    // Five orders with totals [100, 200, 150, 50, 300]: sum = 800
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(800));

    let resp = engine
        .aggregate("orders", AggregateFunc::Sum, &params(&[("field", "total")]))
        .await
        .unwrap();

    assert_eq!(resp.value, serde_json::json!(800));
    let (sql, args) = &driver.executed()[1];
    assert_eq!(sql, "SELECT SUM(\"total\") FROM \"orders\"");
    assert!(args.is_empty());
}

#[tokio::test]
async fn count_with_filter() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(2));

    let resp = engine
        .aggregate(
            "orders",
            AggregateFunc::Count,
            &params(&[("total[gt]", "150")]),
        )
        .await
        .unwrap();

    assert_eq!(resp.value, serde_json::json!(2));
    let (sql, args) = &driver.executed()[1];
    assert_eq!(sql, "SELECT COUNT(*) FROM \"orders\" WHERE \"total\" > $1");
    assert_eq!(args, &vec![Value::Int(150)]);
}

#[tokio::test]
async fn max_with_condition() {
    // Restricted to completed rows [100, 200, 300]: max = 300
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(300));

    let resp = engine
        .aggregate(
            "orders",
            AggregateFunc::Max,
            &params(&[("field", "total"), ("status[eq]", "completed")]),
        )
        .await
        .unwrap();

    assert_eq!(resp.value, serde_json::json!(300));
    let (sql, args) = &driver.executed()[1];
    assert_eq!(
        sql,
        "SELECT MAX(\"total\") FROM \"orders\" WHERE \"status\" = $1"
    );
    assert_eq!(args, &vec![Value::Text("completed".into())]);
}

#[tokio::test]
async fn aggregate_over_empty_set_is_zero() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Null);

    let resp = engine
        .aggregate("orders", AggregateFunc::Sum, &params(&[("field", "total")]))
        .await
        .unwrap();

    assert_eq!(resp.value, serde_json::json!(0));
}

#[tokio::test]
async fn aggregate_on_string_column_rejected() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    let err = engine
        .aggregate("orders", AggregateFunc::Sum, &params(&[("field", "status")]))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::NonNumericField(_)));
    // Validation failed before any SQL was built
    assert_eq!(driver.executed().len(), 1);
}

#[tokio::test]
async fn aggregate_without_field_rejected() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine
        .aggregate("orders", AggregateFunc::Avg, &params(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn aggregate_unknown_field_rejected() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine
        .aggregate("orders", AggregateFunc::Sum, &params(&[("field", "nope")]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::ColumnNotFound(_)));
}

#[tokio::test]
async fn unknown_operator_rejected_before_sql() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    let err = engine
        .aggregate(
            "orders",
            AggregateFunc::Count,
            &params(&[("field", "total"), ("total[unknown]", "5")]),
        )
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::UnsupportedOperator(op) if op == "unknown"));
    assert_eq!(driver.executed().len(), 1);
}

#[tokio::test]
async fn unknown_collection_is_not_found() {
    let driver = MockDriver::new(Dialect::Postgres);
    let engine = DataEngine::new(driver.clone());

    let err = engine
        .aggregate("ghosts", AggregateFunc::Count, &params(&[]))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::CollectionNotFound(name) if name == "ghosts"));

    let err = engine.list("ghosts", &params(&[])).await.unwrap_err();
    assert!(matches!(err, EngineError::CollectionNotFound(_)));
}

// ============================================================================
// List and pagination
// ============================================================================

#[tokio::test]
async fn list_maps_rows_to_records() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(2));
    driver.expect_rows(vec![
        order_row(U1, 100, "completed"),
        order_row(U2, 200, "pending"),
    ]);

    let page = engine.list("orders", &params(&[])).await.unwrap();

    assert_eq!(page.total, 2);
    assert_eq!(page.next_cursor, None);
    assert_eq!(page.data.len(), 2);
    assert_eq!(page.data[0].get("id"), Some(&serde_json::json!(U1)));
    assert_eq!(page.data[0].get("total"), Some(&serde_json::json!(100)));
    assert!(!page.data[0].contains_key("ulid"));
}

#[tokio::test]
async fn list_emits_next_cursor_when_more_rows_exist() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(5));
    // limit+1 rows returned: a third page row proves there is more data
    driver.expect_rows(vec![
        order_row(U1, 100, "a"),
        order_row(U2, 200, "b"),
        order_row(U3, 150, "c"),
    ]);

    let page = engine
        .list("orders", &params(&[("limit", "2")]))
        .await
        .unwrap();

    assert_eq!(page.data.len(), 2);
    assert_eq!(page.total, 5);
    assert_eq!(page.limit, 2);

    let cursor = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
    assert_eq!(cursor.id, U2);
    assert_eq!(cursor.sort_key, None);
}

#[tokio::test]
async fn list_cursor_carries_sort_key() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(5));
    driver.expect_rows(vec![
        order_row(U5, 300, "a"),
        order_row(U2, 200, "b"),
        order_row(U3, 150, "c"),
    ]);

    let page = engine
        .list("orders", &params(&[("sort", "-total"), ("limit", "2")]))
        .await
        .unwrap();

    let cursor = Cursor::decode(page.next_cursor.as_deref().unwrap()).unwrap();
    assert_eq!(cursor.id, U2);
    assert_eq!(cursor.sort_key, Some(("total".to_string(), Value::Int(200))));

    // The select carried the descending sort with the ulid tiebreaker
    let (sql, _) = &driver.executed()[2];
    assert!(sql.contains("ORDER BY \"total\" DESC, \"ulid\" DESC"));
}

#[tokio::test]
async fn list_resumes_from_cursor_with_keyset_predicate() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(5));
    driver.expect_rows(vec![order_row(U3, 150, "c")]);

    let token = Cursor::with_sort_key("total", Value::Int(200), U2).encode();
    let page = engine
        .list(
            "orders",
            &params(&[("sort", "-total"), ("limit", "2"), ("after", token.as_str())]),
        )
        .await
        .unwrap();

    assert_eq!(page.data.len(), 1);
    assert_eq!(page.next_cursor, None);

    let (sql, args) = &driver.executed()[2];
    assert!(sql.contains("(\"total\", \"ulid\") < ($1, $2)"));
    assert_eq!(args[0], Value::Int(200));
    assert_eq!(args[1], Value::Text(U2.into()));
}

#[tokio::test]
async fn list_count_ignores_cursor() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(5));
    driver.expect_rows(vec![]);

    let token = Cursor::new(U2).encode();
    engine
        .list("orders", &params(&[("after", token.as_str())]))
        .await
        .unwrap();

    let (count_sql, _) = &driver.executed()[1];
    assert_eq!(count_sql, "SELECT COUNT(*) FROM \"orders\"");
    let (select_sql, _) = &driver.executed()[2];
    assert!(select_sql.contains("\"ulid\" > $1"));
}

#[tokio::test]
async fn list_invalid_cursor_fails_closed() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    let page = engine
        .list("orders", &params(&[("after", "garbage!!!")]))
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(page.total, 0);
    assert_eq!(page.next_cursor, None);
    // No query was executed for the rejected cursor
    assert_eq!(driver.executed().len(), 1);
}

#[tokio::test]
async fn list_stale_cursor_for_different_sort_fails_closed() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    // Token produced under ulid order, replayed under a total sort
    let token = Cursor::new(U2).encode();
    let page = engine
        .list(
            "orders",
            &params(&[("sort", "-total"), ("after", token.as_str())]),
        )
        .await
        .unwrap();

    assert!(page.data.is_empty());
    assert_eq!(driver.executed().len(), 1);
}

#[tokio::test]
async fn list_search_and_filters_compose() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_value(Value::Int(1));
    driver.expect_rows(vec![order_row(U1, 100, "completed")]);

    engine
        .list("orders", &params(&[("q", "widget"), ("total[gt]", "50")]))
        .await
        .unwrap();

    let (sql, args) = &driver.executed()[2];
    assert!(sql.contains("(\"status\" LIKE $1) AND \"total\" > $2"));
    assert_eq!(args[0], Value::Text("%widget%".into()));
    assert_eq!(args[1], Value::Int(50));
}

#[tokio::test]
async fn pagination_concatenates_without_gaps_or_duplicates() {
    // All five rows in ulid order; pages of two must concatenate to exactly
    // the full set, in order
    let all = [
        order_row(U1, 100, "a"),
        order_row(U2, 200, "b"),
        order_row(U3, 150, "c"),
        order_row(U4, 50, "d"),
        order_row(U5, 300, "e"),
    ];

    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    // Page 1: rows 0..3 (limit+1), page 2: rows 2..5, page 3: rows 4..5
    driver.expect_value(Value::Int(5));
    driver.expect_rows(all[0..3].to_vec());
    driver.expect_value(Value::Int(5));
    driver.expect_rows(all[2..5].to_vec());
    driver.expect_value(Value::Int(5));
    driver.expect_rows(all[4..5].to_vec());

    let mut seen: Vec<String> = Vec::new();
    let mut after: Option<String> = None;

    loop {
        let mut query = vec![("limit".to_string(), "2".to_string())];
        if let Some(token) = &after {
            query.push(("after".to_string(), token.clone()));
        }
        let page = engine.list("orders", &query).await.unwrap();

        for record in &page.data {
            seen.push(record.get("id").unwrap().as_str().unwrap().to_string());
        }

        match page.next_cursor {
            Some(token) => after = Some(token),
            None => break,
        }
    }

    assert_eq!(seen, vec![U1, U2, U3, U4, U5]);
}

// ============================================================================
// CRUD
// ============================================================================

#[tokio::test]
async fn create_inserts_and_refetches() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_exec(1);
    driver.expect_rows(vec![order_row(U1, 100, "completed")]);

    let record = engine
        .create(
            "orders",
            &serde_json::json!({"total": 100, "status": "completed"}),
        )
        .await
        .unwrap();

    assert_eq!(record.get("total"), Some(&serde_json::json!(100)));

    let (insert_sql, insert_args) = &driver.executed()[1];
    assert_eq!(
        insert_sql,
        "INSERT INTO \"orders\" (\"ulid\", \"total\", \"status\") VALUES ($1, $2, $3)"
    );
    // The engine generated a well-formed ulid for the new record
    match &insert_args[0] {
        Value::Text(id) => assert!(ulid::Ulid::from_string(id).is_ok()),
        other => panic!("expected text id, got {other:?}"),
    }
    assert_eq!(insert_args[1], Value::Int(100));
}

#[tokio::test]
async fn create_missing_required_column_rejected() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    let err = engine
        .create("orders", &serde_json::json!({"status": "completed"}))
        .await
        .unwrap_err();

    assert!(matches!(err, EngineError::Validation(_)));
    assert_eq!(driver.executed().len(), 1);
}

#[tokio::test]
async fn create_unknown_field_rejected() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine
        .create("orders", &serde_json::json!({"total": 1, "bogus": true}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(msg) if msg.contains("bogus")));
}

#[tokio::test]
async fn create_type_mismatch_rejected() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine
        .create("orders", &serde_json::json!({"total": "plenty"}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidValue(_)));
}

#[tokio::test]
async fn get_returns_record_or_not_found() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_rows(vec![order_row(U1, 100, "completed")]);

    let record = engine.get("orders", U1).await.unwrap();
    assert_eq!(record.get("id"), Some(&serde_json::json!(U1)));

    driver.expect_rows(vec![]);
    let err = engine.get("orders", U2).await.unwrap_err();
    assert!(matches!(err, EngineError::RecordNotFound(_)));
}

#[tokio::test]
async fn get_malformed_id_rejected_before_sql() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine.get("orders", "not-an-id").await.unwrap_err();
    assert!(matches!(err, EngineError::InvalidValue(_)));
    assert_eq!(driver.executed().len(), 1);
}

#[tokio::test]
async fn update_writes_and_refetches() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_exec(1);
    driver.expect_rows(vec![order_row(U1, 250, "completed")]);

    let record = engine
        .update("orders", U1, &serde_json::json!({"total": 250}))
        .await
        .unwrap();

    assert_eq!(record.get("total"), Some(&serde_json::json!(250)));
    let (sql, args) = &driver.executed()[1];
    assert_eq!(sql, "UPDATE \"orders\" SET \"total\" = $1 WHERE \"ulid\" = $2");
    assert_eq!(args, &vec![Value::Int(250), Value::Text(U1.into())]);
}

#[tokio::test]
async fn update_missing_record_not_found() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    driver.expect_exec(0);

    let err = engine
        .update("orders", U1, &serde_json::json!({"total": 250}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::RecordNotFound(_)));
}

#[tokio::test]
async fn update_null_on_non_nullable_rejected() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine
        .update("orders", U1, &serde_json::json!({"total": null}))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}

#[tokio::test]
async fn destroy_deletes_or_not_found() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    driver.expect_exec(1);
    engine.destroy("orders", U1).await.unwrap();
    let (sql, _) = &driver.executed()[1];
    assert_eq!(sql, "DELETE FROM \"orders\" WHERE \"ulid\" = $1");

    driver.expect_exec(0);
    let err = engine.destroy("orders", U2).await.unwrap_err();
    assert!(matches!(err, EngineError::RecordNotFound(_)));
}

// ============================================================================
// Boolean uniformity across dialects
// ============================================================================

#[tokio::test]
async fn sqlite_integer_booleans_become_json_booleans() {
    let driver = MockDriver::new(Dialect::Sqlite);
    let engine = DataEngine::new(driver.clone());
    engine
        .create_collection(Collection::new(
            "flags",
            vec![Column::new("active", ColumnType::Boolean)],
        ))
        .await
        .unwrap();

    driver.expect_value(Value::Int(1));
    driver.expect_rows(vec![
        Row::new()
            .with("ulid", Value::Text(U1.into()))
            .with("active", Value::Int(1)),
    ]);

    let page = engine.list("flags", &params(&[])).await.unwrap();
    assert_eq!(page.data[0].get("active"), Some(&serde_json::json!(true)));
}

// ============================================================================
// Migration
// ============================================================================

#[tokio::test]
async fn migration_applies_and_updates_registry() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    let batch = MigrationBatch {
        add_columns: vec![Column::new("discount", ColumnType::Float)],
        remove_columns: vec!["status".to_string()],
        ..Default::default()
    };
    let updated = engine.apply_migration("orders", &batch).await.unwrap();

    let names: Vec<&str> = updated.columns.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["total", "discount"]);
    assert_eq!(engine.registry().get("orders").unwrap(), updated);

    let statements = driver.statements();
    assert!(statements[1].contains("ADD COLUMN \"discount\""));
    assert!(statements[2].contains("DROP COLUMN \"status\""));
}

#[tokio::test]
async fn migration_ddl_failure_leaves_registry_at_pre_batch_state() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;
    let before = engine.registry().get("orders").unwrap();

    driver.expect_exec(1);
    driver.fail_exec("disk full");

    let batch = MigrationBatch {
        add_columns: vec![
            Column::new("alpha", ColumnType::String),
            Column::new("beta", ColumnType::String),
        ],
        ..Default::default()
    };
    let err = engine.apply_migration("orders", &batch).await.unwrap_err();

    assert!(matches!(err, EngineError::QueryExecutionFailed(_)));
    // Registry matches the pre-batch collection exactly
    assert_eq!(engine.registry().get("orders").unwrap(), before);
}

#[tokio::test]
async fn migration_validation_failure_runs_no_ddl() {
    let (driver, engine) = orders_engine(Dialect::Postgres).await;

    let batch = MigrationBatch {
        add_columns: vec![Column::new("extra", ColumnType::String)],
        remove_columns: vec!["id".to_string()],
        ..Default::default()
    };
    let err = engine.apply_migration("orders", &batch).await.unwrap_err();

    assert!(matches!(err, EngineError::MigrationConflict(_)));
    // Only the original CREATE TABLE was ever executed
    assert_eq!(driver.executed().len(), 1);
    assert_eq!(engine.registry().get("orders").unwrap(), orders_collection());
}

#[tokio::test]
async fn migration_empty_batch_rejected() {
    let (_, engine) = orders_engine(Dialect::Postgres).await;
    let err = engine
        .apply_migration("orders", &MigrationBatch::default())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
}
