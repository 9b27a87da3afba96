//! Live schema migration
//!
//! A migration batch is one logical unit: the whole batch is validated
//! against a working copy of the collection before the first DDL statement
//! runs, DDL applies in the fixed order add → rename → modify → remove, and
//! the registry is written once at the end. A mid-batch DDL failure leaves
//! the registry at the pre-batch state and logs the failing statement for
//! manual reconciliation.

use tracing::{debug, error, info};

use crate::driver::Driver;
use crate::error::{EngineError, Result};
use crate::registry::SchemaRegistry;
use crate::schema::{Collection, MigrationBatch};
use crate::sql::ddl::DdlGenerator;
use crate::sql::dialect::Dialect;
use crate::sql::sanitize::{RESERVED_COLUMNS, validate_column_name};
use crate::types::ColumnType;

/// Apply a migration batch to a live collection
pub(crate) async fn apply(
    driver: &dyn Driver,
    registry: &SchemaRegistry,
    collection_name: &str,
    batch: &MigrationBatch,
    max_columns: usize,
) -> Result<Collection> {
    let current = registry
        .get(collection_name)
        .ok_or_else(|| EngineError::CollectionNotFound(collection_name.to_string()))?;

    if batch.is_empty() {
        return Err(EngineError::validation("no operations specified"));
    }

    let (updated, statements) = plan(&current, batch, driver.dialect(), max_columns)?;

    for statement in &statements {
        debug!(collection = collection_name, statement, "applying migration DDL");
        if let Err(e) = driver.execute(statement, &[]).await {
            error!(
                collection = collection_name,
                statement,
                error = %e,
                "migration DDL failed; registry left at pre-batch state"
            );
            return Err(e);
        }
    }

    registry.set(updated.clone());
    info!(
        collection = collection_name,
        statements = statements.len(),
        "migration applied"
    );

    Ok(updated)
}

/// Validate a whole batch and produce the post-batch collection plus the DDL
/// statements, in execution order
///
/// Nothing is mutated; every conflict is caught here, before any DDL runs.
pub(crate) fn plan(
    collection: &Collection,
    batch: &MigrationBatch,
    dialect: Dialect,
    max_columns: usize,
) -> Result<(Collection, Vec<String>)> {
    let ddl = DdlGenerator::new(dialect);
    let mut working = collection.clone();
    let mut statements = Vec::new();

    // 1. Add
    for col in &batch.add_columns {
        validate_column_name(&col.name)?;
        if working.has_column(&col.name) {
            return Err(EngineError::DuplicateColumnName(col.name.clone()));
        }
        statements.push(ddl.add_column(&working.name, col));
        working.columns.push(col.clone());
    }

    if working.columns.len() > max_columns {
        return Err(EngineError::validation(format!(
            "collection '{}' would exceed the maximum of {max_columns} columns",
            working.name
        )));
    }

    // 2. Rename
    for rename in &batch.rename_columns {
        if RESERVED_COLUMNS.contains(&rename.old_name.as_str()) {
            return Err(EngineError::migration_conflict(format!(
                "cannot rename system column '{}'",
                rename.old_name
            )));
        }
        if !working.has_column(&rename.old_name) {
            return Err(EngineError::ColumnNotFound(rename.old_name.clone()));
        }
        validate_column_name(&rename.new_name)?;
        if working.has_column(&rename.new_name) {
            return Err(EngineError::DuplicateColumnName(rename.new_name.clone()));
        }

        statements.push(ddl.rename_column(&working.name, &rename.old_name, &rename.new_name));
        if let Some(col) = working
            .columns
            .iter_mut()
            .find(|c| c.name == rename.old_name)
        {
            col.name = rename.new_name.clone();
        }
    }

    // 3. Modify
    for modify in &batch.modify_columns {
        if RESERVED_COLUMNS.contains(&modify.name.as_str()) {
            return Err(EngineError::migration_conflict(format!(
                "cannot modify system column '{}'",
                modify.name
            )));
        }

        let col = working
            .column(&modify.name)
            .ok_or_else(|| EngineError::ColumnNotFound(modify.name.clone()))?;

        if !is_widening(&col.column_type, &modify.column_type) {
            return Err(EngineError::migration_conflict(format!(
                "cannot narrow column '{}' from {} to {}; existing data could be lost",
                modify.name, col.column_type, modify.column_type
            )));
        }

        if modify.nullable == Some(false) && col.nullable {
            return Err(EngineError::migration_conflict(format!(
                "cannot make column '{}' NOT NULL; existing rows may hold NULL",
                modify.name
            )));
        }

        statements.extend(ddl.modify_column(&working.name, modify)?);

        let col = working
            .columns
            .iter_mut()
            .find(|c| c.name == modify.name)
            .expect("column validated above");
        col.column_type = modify.column_type.clone();
        if let Some(nullable) = modify.nullable {
            col.nullable = nullable;
        }
        if let Some(unique) = modify.unique {
            col.unique = unique;
        }
        if let Some(default) = &modify.default_value {
            col.default_value = Some(default.clone());
        }
    }

    // 4. Remove
    for name in &batch.remove_columns {
        if RESERVED_COLUMNS.contains(&name.as_str()) {
            return Err(EngineError::migration_conflict(format!(
                "cannot remove system column '{name}'"
            )));
        }
        if !working.has_column(name) {
            return Err(EngineError::ColumnNotFound(name.clone()));
        }

        statements.push(ddl.drop_column(&working.name, name));
        working.columns.retain(|c| &c.name != name);
    }

    Ok((working, statements))
}

/// Whether a type change preserves all representable values
///
/// Narrowing fails closed: only conversions that cannot lose data on any
/// existing row are permitted.
fn is_widening(from: &ColumnType, to: &ColumnType) -> bool {
    use ColumnType::*;

    match (from, to) {
        (
            Decimal {
                precision: p1,
                scale: s1,
            },
            Decimal {
                precision: p2,
                scale: s2,
            },
        ) => p2 >= p1 && s2 >= s1,
        (a, b) if a == b => true,
        (Integer, Float | Decimal { .. } | String) => true,
        (Float | Boolean | Datetime | Json, String) => true,
        (Decimal { .. }, String) => true,
        (Boolean, Integer) => true,
        _ => false,
    }
}
