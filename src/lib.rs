//! # mesa
//!
//! A schema-driven dynamic data engine for SQL databases.
//!
//! Collections (tables) are defined at runtime and exposed through a uniform
//! operation surface: list, get, create, update, destroy, and aggregate. The
//! engine keeps an in-memory schema registry as the source of truth, turns
//! untrusted query parameters into parameterized dialect-correct SQL, and
//! applies live column migrations without hand-written migration files.
//!
//! ## Features
//!
//! - **Dynamic Schema Management**: create, migrate, and destroy collections
//!   at runtime; batches of add/rename/modify/remove column operations apply
//!   as one validated unit
//! - **Typed Columns**: string, integer, float, decimal, boolean, datetime,
//!   and JSON columns with type-aware filter coercion
//! - **Safe Querying**: `column[operator]=value` filters, `-field` sorting,
//!   field projection, full-text search, and keyset cursor pagination, all
//!   rendered as parameterized SQL — values never appear in SQL text
//! - **Multiple Dialects**: one query builder per dialect (PostgreSQL, MySQL,
//!   SQLite) behind a single interface, selected at construction
//! - **SQL Injection Prevention**: identifiers are allow-listed against the
//!   registry and the naming rules before they are quoted into SQL
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use mesa::{Collection, Column, ColumnType, DataEngine, PgDriver};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let driver = Arc::new(PgDriver::connect("postgres://localhost/mydb").await?);
//!     let engine = DataEngine::new(driver);
//!
//!     // Define a collection
//!     engine
//!         .create_collection(Collection::new(
//!             "orders",
//!             vec![
//!                 Column::new("total", ColumnType::Integer).not_null(),
//!                 Column::new("status", ColumnType::String),
//!             ],
//!         ))
//!         .await?;
//!
//!     // Insert a record
//!     engine
//!         .create(
//!             "orders",
//!             &serde_json::json!({"total": 100, "status": "completed"}),
//!         )
//!         .await?;
//!
//!     // Query it back
//!     let page = engine
//!         .list(
//!             "orders",
//!             &[
//!                 ("status[eq]".to_string(), "completed".to_string()),
//!                 ("sort".to_string(), "-total".to_string()),
//!             ],
//!         )
//!         .await?;
//!     println!("{} of {} records", page.data.len(), page.total);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! Requests flow registry → parser → builder → driver: the registry validates
//! that the collection and columns exist, the parser coerces values to the
//! column types, the builder renders SQL plus a parameter list for its
//! dialect, and the driver executes it. Rows come back through the registry's
//! type map, so booleans are JSON booleans regardless of how the database
//! stores them, and the internal primary key is never exposed.

pub mod config;
pub mod cursor;
pub mod driver;
pub mod engine;
pub mod error;
pub mod filter;
mod migrate;
pub mod postgres;
pub mod record;
pub mod registry;
pub mod schema;
pub mod sql;
pub mod types;

// Re-export main types for convenience
pub use config::{EngineConfig, EngineConfigBuilder};
pub use cursor::Cursor;
pub use driver::{Driver, Row};
pub use engine::{AggregateResponse, DataEngine, ListResponse};
pub use error::{EngineError, Result};
pub use filter::{Condition, ConditionValue, ListParams, Operator, SortField};
pub use postgres::PgDriver;
pub use record::{Record, row_to_record};
pub use registry::SchemaRegistry;
pub use schema::{
    Collection, CollectionDescriptor, FieldDescriptor, MigrationBatch, ModifyColumn, RenameColumn,
};
pub use sql::{AggregateFunc, DdlGenerator, Dialect, QueryBuilder};
pub use types::{Column, ColumnType, Value};
