//! Property validation: values that bind but cannot be used.

use crate::config::ClioneSqlProperties;
use crate::error::ConfigError;
use crate::sql::{Dialect, Encoding};

pub fn validate(properties: &ClioneSqlProperties) -> Result<(), ConfigError> {
    if let Some(name) = properties.product_name() {
        Dialect::from_product_name(name).ok_or_else(|| ConfigError::UnsupportedProduct(name.to_string()))?;
    }
    Encoding::from_label(properties.sql_file_encoding())
        .ok_or_else(|| ConfigError::UnsupportedEncoding(properties.sql_file_encoding().to_string()))?;
    if properties.sql_file_cache_time() < 0 {
        return Err(ConfigError::Validation(format!(
            "sql-file-cache-time must not be negative: {}",
            properties.sql_file_cache_time()
        )));
    }
    if properties.entity_depth_limit() < 1 {
        return Err(ConfigError::Validation(format!(
            "entity-depth-limit must be at least 1: {}",
            properties.entity_depth_limit()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        assert!(validate(&ClioneSqlProperties::default()).is_ok());
    }

    #[test]
    fn supported_products_are_valid() {
        for name in crate::config::SUPPORTED_PRODUCTS.iter().chain(["PostgreSQL", "SQLite"].iter()) {
            let mut p = ClioneSqlProperties::default();
            p.set_product_name(Some(name.to_string()));
            assert!(validate(&p).is_ok(), "{}", name);
        }
    }

    #[test]
    fn rejects_unknown_product_and_encoding() {
        let mut p = ClioneSqlProperties::default();
        p.set_product_name(Some("h2".into()));
        assert!(matches!(validate(&p), Err(ConfigError::UnsupportedProduct(n)) if n == "h2"));

        let mut p = ClioneSqlProperties::default();
        p.set_sql_file_encoding("Shift_JIS");
        assert!(matches!(validate(&p), Err(ConfigError::UnsupportedEncoding(_))));
    }

    #[test]
    fn rejects_out_of_range_numbers() {
        let mut p = ClioneSqlProperties::default();
        p.set_sql_file_cache_time(-1);
        assert!(matches!(validate(&p), Err(ConfigError::Validation(_))));

        let mut p = ClioneSqlProperties::default();
        p.set_entity_depth_limit(0);
        assert!(matches!(validate(&p), Err(ConfigError::Validation(_))));
    }
}
