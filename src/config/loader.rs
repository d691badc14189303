//! Bind properties from key/value pairs, the process environment, or a JSON file.
//! Keys are matched loosely: `clione-sql.sql-file-encoding`, `clione-sql.sqlFileEncoding` and
//! `CLIONE_SQL_SQL_FILE_ENCODING` all bind the same field.

use crate::config::properties::{ClioneSqlProperties, PROPERTY_PREFIX};
use crate::error::ConfigError;
use std::path::Path;

const ENV_PREFIX: &str = "CLIONE_SQL_";

fn normalize(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '-' && *c != '_')
        .flat_map(char::to_lowercase)
        .collect()
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
        }),
    }
}

fn parse_int(key: &str, value: &str) -> Result<i64, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    })
}

impl ClioneSqlProperties {
    /// Set one property by its name relative to the prefix. Unknown names are ignored; returns
    /// whether the name was recognized.
    pub fn bind(&mut self, name: &str, value: &str) -> Result<bool, ConfigError> {
        let key = format!("{}.{}", PROPERTY_PREFIX, name);
        match normalize(name).as_str() {
            "productname" => {
                let v = value.trim();
                self.product_name = if v.is_empty() { None } else { Some(v.to_string()) };
            }
            "sqlfileencoding" => self.sql_file_encoding = value.trim().to_string(),
            "exceptiontranslationenabled" => self.exception_translation_enabled = parse_bool(&key, value)?,
            "developmentmode" => self.development_mode = parse_bool(&key, value)?,
            "sqlfilecachetime" => self.sql_file_cache_time = parse_int(&key, value)?,
            "entitydepthlimit" => self.entity_depth_limit = parse_int(&key, value)?,
            "sqlfileroot" => {
                let v = value.trim();
                self.sql_file_root = if v.is_empty() { None } else { Some(v.to_string()) };
            }
            _ => return Ok(false),
        }
        Ok(true)
    }

    /// Bind from `clione-sql.<name>=<value>` pairs; keys without the prefix are skipped.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let prefix = format!("{}.", PROPERTY_PREFIX);
        let mut properties = Self::default();
        for (k, v) in pairs {
            if let Some(name) = k.as_ref().strip_prefix(&prefix) {
                if !properties.bind(name, v.as_ref())? {
                    tracing::debug!(key = %k.as_ref(), "ignoring unknown property");
                }
            }
        }
        Ok(properties)
    }

    /// Bind from `CLIONE_SQL_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_env_vars(std::env::vars())
    }

    pub(crate) fn from_env_vars<I>(vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut properties = Self::default();
        for (k, v) in vars {
            if let Some(name) = k.strip_prefix(ENV_PREFIX) {
                properties.bind(&name.to_ascii_lowercase().replace('_', "-"), &v)?;
            }
        }
        Ok(properties)
    }

    /// Bind from a JSON document with a top-level `clione-sql` object. A missing object yields
    /// defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&text)
    }

    pub fn from_json_str(text: &str) -> Result<Self, ConfigError> {
        let mut doc: serde_json::Value =
            serde_json::from_str(text).map_err(|e| ConfigError::Load(e.to_string()))?;
        match doc.get_mut(PROPERTY_PREFIX) {
            Some(section) => serde_json::from_value(section.take()).map_err(|e| ConfigError::Load(e.to_string())),
            None => Ok(Self::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_bindings_yields_defaults() {
        let p = ClioneSqlProperties::from_pairs(Vec::<(String, String)>::new()).unwrap();
        assert_eq!(p, ClioneSqlProperties::default());
    }

    #[test]
    fn each_key_overrides_only_its_field() {
        let cases: Vec<(&str, &str, Box<dyn Fn(&mut ClioneSqlProperties)>)> = vec![
            ("product-name", "postgres", Box::new(|p: &mut ClioneSqlProperties| p.product_name = Some("postgres".into()))),
            ("sql-file-encoding", "ISO-8859-1", Box::new(|p: &mut ClioneSqlProperties| p.sql_file_encoding = "ISO-8859-1".into())),
            ("exception-translation-enabled", "false", Box::new(|p: &mut ClioneSqlProperties| p.exception_translation_enabled = false)),
            ("development-mode", "true", Box::new(|p: &mut ClioneSqlProperties| p.development_mode = true)),
            ("sql-file-cache-time", "3000", Box::new(|p: &mut ClioneSqlProperties| p.sql_file_cache_time = 3000)),
            ("entity-depth-limit", "3", Box::new(|p: &mut ClioneSqlProperties| p.entity_depth_limit = 3)),
        ];
        for (name, value, apply) in cases {
            let p = ClioneSqlProperties::from_pairs([(format!("clione-sql.{}", name), value)]).unwrap();
            let mut expected = ClioneSqlProperties::default();
            apply(&mut expected);
            assert_eq!(p, expected, "binding {}", name);
        }
    }

    #[test]
    fn relaxed_key_forms_bind() {
        let p = ClioneSqlProperties::from_pairs([
            ("clione-sql.sqlFileCacheTime", "10"),
            ("clione-sql.entity_depth_limit", "2"),
            ("spring.datasource.url", "ignored"),
        ])
        .unwrap();
        assert_eq!(p.sql_file_cache_time(), 10);
        assert_eq!(p.entity_depth_limit(), 2);
    }

    #[test]
    fn malformed_values_name_the_key() {
        let err = ClioneSqlProperties::from_pairs([("clione-sql.development-mode", "yes")]).unwrap_err();
        match err {
            ConfigError::InvalidValue { key, value } => {
                assert_eq!(key, "clione-sql.development-mode");
                assert_eq!(value, "yes");
            }
            other => panic!("unexpected error {other:?}"),
        }
        assert!(ClioneSqlProperties::from_pairs([("clione-sql.entity-depth-limit", "deep")]).is_err());
    }

    #[test]
    fn env_vars_bind() {
        let p = ClioneSqlProperties::from_env_vars([
            ("CLIONE_SQL_PRODUCT_NAME".to_string(), "sqlite".to_string()),
            ("CLIONE_SQL_EXCEPTION_TRANSLATION_ENABLED".to_string(), "FALSE".to_string()),
            ("PATH".to_string(), "/usr/bin".to_string()),
        ])
        .unwrap();
        assert_eq!(p.product_name(), Some("sqlite"));
        assert!(!p.is_exception_translation_enabled());
    }

    #[test]
    fn env_var_errors_name_the_property() {
        let err = ClioneSqlProperties::from_env_vars([(
            "CLIONE_SQL_EXCEPTION_TRANSLATION_ENABLED".to_string(),
            "maybe".to_string(),
        )])
        .unwrap_err();
        match err {
            ConfigError::InvalidValue { key, .. } => assert_eq!(key, "clione-sql.exception-translation-enabled"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn json_section_binds() {
        let p = ClioneSqlProperties::from_json_str(r#"{"clione-sql": {"development-mode": true}, "other": 1}"#).unwrap();
        assert!(p.is_development_mode());
        assert_eq!(
            ClioneSqlProperties::from_json_str(r#"{"server": {}}"#).unwrap(),
            ClioneSqlProperties::default()
        );
    }
}
