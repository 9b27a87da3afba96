//! Engine configuration
//!
//! Provides a builder pattern for configuring request and schema limits.

/// Configuration for the data engine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Page size when no limit is specified (default: 100)
    pub default_limit: i64,
    /// Hard page-size cap; larger requests are clamped (default: 1000)
    pub max_limit: i64,
    /// Maximum filter conditions per request (default: 20)
    pub max_filters: usize,
    /// Maximum sort fields per request (default: 5)
    pub max_sort_fields: usize,
    /// Maximum user-defined columns per collection (default: 64)
    pub max_columns: usize,
    /// Maximum number of collections (default: 256)
    pub max_collections: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_limit: 100,
            max_limit: 1000,
            max_filters: 20,
            max_sort_fields: 5,
            max_columns: 64,
            max_collections: 256,
        }
    }
}

impl EngineConfig {
    /// Create a new configuration builder
    pub fn builder() -> EngineConfigBuilder {
        EngineConfigBuilder::default()
    }
}

/// Builder for `EngineConfig`
#[derive(Debug, Default)]
pub struct EngineConfigBuilder {
    config: EngineConfig,
}

impl EngineConfigBuilder {
    /// Set the default page size
    pub fn default_limit(mut self, limit: i64) -> Self {
        self.config.default_limit = limit;
        self
    }

    /// Set the hard page-size cap
    pub fn max_limit(mut self, limit: i64) -> Self {
        self.config.max_limit = limit;
        self
    }

    /// Set the maximum filter conditions per request
    pub fn max_filters(mut self, max: usize) -> Self {
        self.config.max_filters = max;
        self
    }

    /// Set the maximum sort fields per request
    pub fn max_sort_fields(mut self, max: usize) -> Self {
        self.config.max_sort_fields = max;
        self
    }

    /// Set the maximum user-defined columns per collection
    pub fn max_columns(mut self, max: usize) -> Self {
        self.config.max_columns = max;
        self
    }

    /// Set the maximum number of collections
    pub fn max_collections(mut self, max: usize) -> Self {
        self.config.max_collections = max;
        self
    }

    /// Build the configuration
    pub fn build(self) -> EngineConfig {
        self.config
    }
}
