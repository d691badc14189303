//! Configuration properties bound from the `clione-sql` prefix.

use serde::Deserialize;

/// Prefix under which properties are bound.
pub const PROPERTY_PREFIX: &str = "clione-sql";

/// Recognized product names for dialect selection.
pub const SUPPORTED_PRODUCTS: &[&str] = &["oracle", "mysql", "postgres", "db2", "sqlserver", "sqlite", "firebird"];

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct ClioneSqlProperties {
    /// Product name used for dialect selection. `None` auto-detects from the connection.
    pub product_name: Option<String>,
    pub sql_file_encoding: String,
    pub exception_translation_enabled: bool,
    /// Disables permanent SQL file caching.
    pub development_mode: bool,
    /// Milliseconds a cached SQL file stays valid; only used in development mode.
    pub sql_file_cache_time: i64,
    /// Maximum nesting depth when resolving parameter paths on bound entities.
    pub entity_depth_limit: i64,
    /// Base directory for SQL file paths. `None` is the working directory.
    pub sql_file_root: Option<String>,
}

impl Default for ClioneSqlProperties {
    fn default() -> Self {
        Self {
            product_name: None,
            sql_file_encoding: "UTF-8".into(),
            exception_translation_enabled: true,
            development_mode: false,
            sql_file_cache_time: 0,
            entity_depth_limit: 8,
            sql_file_root: None,
        }
    }
}

impl ClioneSqlProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn product_name(&self) -> Option<&str> {
        self.product_name.as_deref()
    }

    pub fn set_product_name(&mut self, product_name: Option<String>) {
        self.product_name = product_name;
    }

    pub fn sql_file_encoding(&self) -> &str {
        &self.sql_file_encoding
    }

    pub fn set_sql_file_encoding(&mut self, encoding: impl Into<String>) {
        self.sql_file_encoding = encoding.into();
    }

    pub fn is_exception_translation_enabled(&self) -> bool {
        self.exception_translation_enabled
    }

    pub fn set_exception_translation_enabled(&mut self, enabled: bool) {
        self.exception_translation_enabled = enabled;
    }

    pub fn is_development_mode(&self) -> bool {
        self.development_mode
    }

    pub fn set_development_mode(&mut self, enabled: bool) {
        self.development_mode = enabled;
    }

    pub fn sql_file_cache_time(&self) -> i64 {
        self.sql_file_cache_time
    }

    pub fn set_sql_file_cache_time(&mut self, millis: i64) {
        self.sql_file_cache_time = millis;
    }

    pub fn entity_depth_limit(&self) -> i64 {
        self.entity_depth_limit
    }

    pub fn set_entity_depth_limit(&mut self, limit: i64) {
        self.entity_depth_limit = limit;
    }

    pub fn sql_file_root(&self) -> Option<&str> {
        self.sql_file_root.as_deref()
    }

    pub fn set_sql_file_root(&mut self, root: Option<String>) {
        self.sql_file_root = root;
    }
}
