//! SQL generation: dialects, identifier sanitization, query building, DDL

pub mod builder;
pub mod ddl;
pub mod dialect;
pub mod sanitize;

pub use builder::{AggregateFunc, HARD_LIMIT_CAP, QueryBuilder, SelectParams};
pub use ddl::DdlGenerator;
pub use dialect::Dialect;
pub use sanitize::{validate_column_name, validate_identifier};
