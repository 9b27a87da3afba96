//! Collection schema model
//!
//! Includes the `Collection` definition owned by the registry, structural
//! validation, migration batch types, and the schema metadata descriptor
//! returned to callers.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, Result};
use crate::sql::sanitize::{validate_column_name, validate_identifier};
use crate::types::{Column, ColumnType};

/// A user-defined collection backed by one SQL table
///
/// The column list never contains the system fields: every table carries an
/// internal autoincrement `id` primary key and a `ulid` identity column, both
/// synthesized by the engine. The `ulid` value is exposed to callers as `id`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    /// Collection name, also the table name
    pub name: String,
    /// User-defined columns, in definition order
    pub columns: Vec<Column>,
}

impl Collection {
    /// Create a new collection definition
    pub fn new(name: impl Into<String>, columns: Vec<Column>) -> Self {
        Self {
            name: name.into(),
            columns,
        }
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether a user-defined column with this name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column(name).is_some()
    }

    /// Validate the collection structurally: naming rules for the collection
    /// and every column, no duplicate column names, column count cap
    pub fn validate(&self, max_columns: usize) -> Result<()> {
        validate_identifier(&self.name)?;

        if self.columns.len() > max_columns {
            return Err(EngineError::validation(format!(
                "collection '{}' exceeds the maximum of {max_columns} columns",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for col in &self.columns {
            validate_column_name(&col.name)?;
            if !seen.insert(col.name.as_str()) {
                return Err(EngineError::DuplicateColumnName(col.name.clone()));
            }
        }

        Ok(())
    }
}

// ============================================================================
// Migration batches
// ============================================================================

/// Rename one column
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RenameColumn {
    pub old_name: String,
    pub new_name: String,
}

/// Change a column's type, nullability, uniqueness, or default
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModifyColumn {
    pub name: String,
    #[serde(flatten)]
    pub column_type: ColumnType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub nullable: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unique: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[serde(rename = "default")]
    pub default_value: Option<String>,
}

/// An ordered batch of schema operations applied as a single logical unit
///
/// Operations apply in a fixed order: add, rename, modify, remove. The whole
/// batch is validated before any DDL runs and the registry is updated only
/// after every statement succeeds.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationBatch {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub add_columns: Vec<Column>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rename_columns: Vec<RenameColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modify_columns: Vec<ModifyColumn>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub remove_columns: Vec<String>,
}

impl MigrationBatch {
    pub fn is_empty(&self) -> bool {
        self.add_columns.is_empty()
            && self.rename_columns.is_empty()
            && self.modify_columns.is_empty()
            && self.remove_columns.is_empty()
    }
}

// ============================================================================
// Schema metadata descriptor
// ============================================================================

/// Field metadata within a collection descriptor
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: String,
    pub nullable: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
}

/// Schema metadata for a collection, as returned to callers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CollectionDescriptor {
    pub collection: String,
    pub fields: Vec<FieldDescriptor>,
    pub primary_key: String,
}

impl CollectionDescriptor {
    /// Build the caller-facing schema view of a collection
    ///
    /// The synthesized `id` field leads the list; internal columns never
    /// appear.
    pub fn from_collection(collection: &Collection) -> Self {
        let mut fields = vec![FieldDescriptor {
            name: "id".to_string(),
            field_type: "string".to_string(),
            nullable: false,
            default: None,
        }];

        for col in &collection.columns {
            fields.push(FieldDescriptor {
                name: col.name.clone(),
                field_type: col.column_type.to_string(),
                nullable: col.nullable,
                default: if col.nullable {
                    col.default_value.clone()
                } else {
                    None
                },
            });
        }

        Self {
            collection: collection.name.clone(),
            fields,
            primary_key: "id".to_string(),
        }
    }
}
