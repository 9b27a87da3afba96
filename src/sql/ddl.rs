//! DDL generation for dynamic schema management
//!
//! Generates dialect-correct DDL for creating collection tables and applying
//! column migrations. Identifiers are validated by the caller before they
//! reach this point.

use crate::error::{EngineError, Result};
use crate::schema::{Collection, ModifyColumn};
use crate::sql::dialect::Dialect;
use crate::types::Column;

/// DDL generator bound to one dialect
#[derive(Debug, Clone, Copy)]
pub struct DdlGenerator {
    dialect: Dialect,
}

impl DdlGenerator {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    /// Generate CREATE TABLE with the system columns and user-defined columns
    ///
    /// Every table carries the internal autoincrement `id` primary key and the
    /// exposed `ulid` identity column ahead of the user columns.
    pub fn create_table(&self, collection: &Collection) -> String {
        let mut column_defs = vec![
            self.dialect.auto_pk_sql().to_string(),
            self.dialect.ulid_column_sql().to_string(),
        ];

        for col in &collection.columns {
            column_defs.push(self.column_definition(col));
        }

        format!(
            "CREATE TABLE {} ({})",
            self.dialect.quote(&collection.name),
            column_defs.join(", ")
        )
    }

    /// Generate DROP TABLE
    pub fn drop_table(&self, name: &str) -> String {
        format!("DROP TABLE {}", self.dialect.quote(name))
    }

    /// Generate ALTER TABLE ADD COLUMN
    pub fn add_column(&self, table: &str, column: &Column) -> String {
        format!(
            "ALTER TABLE {} ADD COLUMN {}",
            self.dialect.quote(table),
            self.column_definition(column)
        )
    }

    /// Generate ALTER TABLE RENAME COLUMN
    ///
    /// The same syntax works on PostgreSQL, MySQL 8, and SQLite 3.25+.
    pub fn rename_column(&self, table: &str, old_name: &str, new_name: &str) -> String {
        format!(
            "ALTER TABLE {} RENAME COLUMN {} TO {}",
            self.dialect.quote(table),
            self.dialect.quote(old_name),
            self.dialect.quote(new_name)
        )
    }

    /// Generate ALTER TABLE DROP COLUMN
    pub fn drop_column(&self, table: &str, column: &str) -> String {
        format!(
            "ALTER TABLE {} DROP COLUMN {}",
            self.dialect.quote(table),
            self.dialect.quote(column)
        )
    }

    /// Generate the statements for a column modification
    ///
    /// PostgreSQL needs one ALTER COLUMN statement per change; MySQL takes a
    /// single MODIFY COLUMN with the full definition. SQLite cannot alter
    /// column definitions in place, so modification fails closed there.
    pub fn modify_column(&self, table: &str, modify: &ModifyColumn) -> Result<Vec<String>> {
        let quoted_table = self.dialect.quote(table);
        let quoted_col = self.dialect.quote(&modify.name);
        let sql_type = self.dialect.column_sql(&modify.column_type);

        match self.dialect {
            Dialect::Postgres => {
                let mut statements = vec![format!(
                    "ALTER TABLE {quoted_table} ALTER COLUMN {quoted_col} TYPE {sql_type}"
                )];

                if let Some(nullable) = modify.nullable {
                    let constraint = if nullable {
                        "DROP NOT NULL"
                    } else {
                        "SET NOT NULL"
                    };
                    statements.push(format!(
                        "ALTER TABLE {quoted_table} ALTER COLUMN {quoted_col} {constraint}"
                    ));
                }

                if let Some(default) = &modify.default_value {
                    statements.push(format!(
                        "ALTER TABLE {quoted_table} ALTER COLUMN {quoted_col} SET DEFAULT {default}"
                    ));
                }

                Ok(statements)
            }
            Dialect::MySql => {
                let mut stmt = format!(
                    "ALTER TABLE {quoted_table} MODIFY COLUMN {quoted_col} {sql_type}"
                );
                if modify.nullable == Some(false) {
                    stmt.push_str(" NOT NULL");
                }
                if modify.unique == Some(true) {
                    stmt.push_str(" UNIQUE");
                }
                if let Some(default) = &modify.default_value {
                    stmt.push_str(" DEFAULT ");
                    stmt.push_str(default);
                }
                Ok(vec![stmt])
            }
            Dialect::Sqlite => Err(EngineError::migration_conflict(format!(
                "SQLite does not support modifying column '{}' in place",
                modify.name
            ))),
        }
    }

    /// Format one column definition for CREATE TABLE or ADD COLUMN
    fn column_definition(&self, col: &Column) -> String {
        let mut parts = vec![
            self.dialect.quote(&col.name),
            self.dialect.column_sql(&col.column_type),
        ];

        if !col.nullable {
            parts.push("NOT NULL".to_string());
        }

        if col.unique {
            parts.push("UNIQUE".to_string());
        }

        if let Some(default) = &col.default_value {
            parts.push(format!("DEFAULT {default}"));
        }

        parts.join(" ")
    }
}
