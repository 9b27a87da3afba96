//! In-memory schema registry
//!
//! The registry is the authoritative map of collection name to column
//! definitions, consulted before any query is built. It is the only mutable
//! state shared between requests: reads take a shared lock, writes hold the
//! exclusive lock just long enough to swap a map entry. All lookups return
//! snapshots so callers never observe a half-applied schema change.

use std::collections::HashMap;
use std::sync::RwLock;

use crate::schema::Collection;

/// Thread-safe registry of collection schemas
///
/// Lookups are case-sensitive exact matches. A missing collection is `None`,
/// never a default value; the engine surfaces it as `CollectionNotFound`.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    collections: RwLock<HashMap<String, Collection>>,
}

impl SchemaRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Retrieve a snapshot of a collection schema
    pub fn get(&self, name: &str) -> Option<Collection> {
        self.collections
            .read()
            .expect("registry lock poisoned")
            .get(name)
            .cloned()
    }

    /// Store or replace a collection schema
    pub fn set(&self, collection: Collection) {
        self.collections
            .write()
            .expect("registry lock poisoned")
            .insert(collection.name.clone(), collection);
    }

    /// Remove a collection schema, returning it if present
    pub fn remove(&self, name: &str) -> Option<Collection> {
        self.collections
            .write()
            .expect("registry lock poisoned")
            .remove(name)
    }

    /// Whether a collection exists
    pub fn contains(&self, name: &str) -> bool {
        self.collections
            .read()
            .expect("registry lock poisoned")
            .contains_key(name)
    }

    /// Snapshots of all collections, sorted by name for stable output
    pub fn get_all(&self) -> Vec<Collection> {
        let mut all: Vec<Collection> = self
            .collections
            .read()
            .expect("registry lock poisoned")
            .values()
            .cloned()
            .collect();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    /// Number of registered collections
    pub fn len(&self) -> usize {
        self.collections
            .read()
            .expect("registry lock poisoned")
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
