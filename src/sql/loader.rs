//! SQL file resolution, decoding and caching.

use super::template::SqlTemplate;
use crate::config::ClioneSqlProperties;
use crate::error::ClioneError;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{Duration, Instant};

/// Supported SQL file encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    Utf8,
    Ascii,
    Latin1,
}

impl Encoding {
    pub fn from_label(label: &str) -> Option<Self> {
        let normalized: String = label
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        match normalized.as_str() {
            "utf8" => Some(Encoding::Utf8),
            "usascii" | "ascii" => Some(Encoding::Ascii),
            "iso88591" | "latin1" => Some(Encoding::Latin1),
            _ => None,
        }
    }

    pub fn decode(&self, bytes: Vec<u8>) -> Result<String, std::io::Error> {
        match self {
            Encoding::Utf8 => {
                String::from_utf8(bytes).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
            }
            Encoding::Ascii => {
                if let Some(pos) = bytes.iter().position(|b| !b.is_ascii()) {
                    return Err(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("non-ASCII byte at offset {}", pos),
                    ));
                }
                Ok(bytes.into_iter().map(char::from).collect())
            }
            Encoding::Latin1 => Ok(bytes.into_iter().map(char::from).collect()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CachePolicy {
    Forever,
    For(Duration),
}

struct CachedTemplate {
    template: Arc<SqlTemplate>,
    loaded_at: Instant,
}

/// Loads and parses SQL files. Clones share one cache.
#[derive(Clone)]
pub struct SqlFileLoader {
    root: Option<PathBuf>,
    encoding: Encoding,
    policy: CachePolicy,
    cache: Arc<RwLock<HashMap<PathBuf, CachedTemplate>>>,
}

impl SqlFileLoader {
    /// Unknown encodings fall back to UTF-8; `config::validate` reports them at startup.
    pub fn new(properties: &ClioneSqlProperties) -> Self {
        let policy = if properties.is_development_mode() {
            CachePolicy::For(Duration::from_millis(properties.sql_file_cache_time().max(0) as u64))
        } else {
            CachePolicy::Forever
        };
        Self {
            root: properties.sql_file_root().map(PathBuf::from),
            encoding: Encoding::from_label(properties.sql_file_encoding()).unwrap_or(Encoding::Utf8),
            policy,
            cache: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn resolve(&self, path: impl AsRef<Path>) -> PathBuf {
        match &self.root {
            Some(root) => root.join(path),
            None => path.as_ref().to_path_buf(),
        }
    }

    /// Path of `file` in the directory named after `T`'s module path (`app::person::Repo` -> `app/person/file`).
    pub fn path_relative_to<T: ?Sized>(file: &str) -> PathBuf {
        let type_name = std::any::type_name::<T>();
        let type_name = type_name.split('<').next().unwrap_or(type_name);
        let mut segments: Vec<&str> = type_name.split("::").collect();
        segments.pop();
        let mut path: PathBuf = segments.into_iter().collect();
        path.push(file);
        path
    }

    pub async fn load(&self, path: impl AsRef<Path>) -> Result<Arc<SqlTemplate>, ClioneError> {
        let resolved = self.resolve(path);
        if let Some(template) = self.cached(&resolved) {
            tracing::debug!(path = %resolved.display(), "sql file cache hit");
            return Ok(template);
        }
        tracing::debug!(path = %resolved.display(), "loading sql file");
        let bytes = match tokio::fs::read(&resolved).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ClioneError::SqlFileNotFound { path: resolved });
            }
            Err(e) => return Err(ClioneError::FileRead { path: resolved, source: e }),
        };
        let text = self
            .encoding
            .decode(bytes)
            .map_err(|e| ClioneError::FileRead {
                path: resolved.clone(),
                source: e,
            })?;
        let template = Arc::new(SqlTemplate::parse(&text)?);
        let mut cache = self.cache.write().unwrap_or_else(|e| e.into_inner());
        cache.insert(
            resolved,
            CachedTemplate {
                template: template.clone(),
                loaded_at: Instant::now(),
            },
        );
        Ok(template)
    }

    fn cached(&self, path: &Path) -> Option<Arc<SqlTemplate>> {
        let cache = self.cache.read().unwrap_or_else(|e| e.into_inner());
        let entry = cache.get(path)?;
        match self.policy {
            CachePolicy::Forever => Some(entry.template.clone()),
            CachePolicy::For(ttl) if entry.loaded_at.elapsed() < ttl => Some(entry.template.clone()),
            CachePolicy::For(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sql::{Dialect, Params};

    mod person {
        pub struct Repository;
    }

    fn loader(root: &Path, configure: impl FnOnce(&mut ClioneSqlProperties)) -> SqlFileLoader {
        let mut p = ClioneSqlProperties::default();
        p.set_sql_file_root(Some(root.to_string_lossy().into_owned()));
        configure(&mut p);
        SqlFileLoader::new(&p)
    }

    fn render(template: &SqlTemplate) -> String {
        template.bind(&Params::new(), Dialect::Sqlite, 8).unwrap().sql
    }

    #[test]
    fn encodings() {
        assert_eq!(Encoding::from_label("UTF-8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::from_label("utf8"), Some(Encoding::Utf8));
        assert_eq!(Encoding::from_label("US-ASCII"), Some(Encoding::Ascii));
        assert_eq!(Encoding::from_label("ISO-8859-1"), Some(Encoding::Latin1));
        assert_eq!(Encoding::from_label("Shift_JIS"), None);
        assert_eq!(Encoding::Latin1.decode(vec![0x63, 0x61, 0x66, 0xE9]).unwrap(), "café");
        assert!(Encoding::Ascii.decode(vec![0xE9]).is_err());
        assert!(Encoding::Utf8.decode(vec![0xFF]).is_err());
    }

    #[test]
    fn relative_paths_follow_module_path() {
        let path = SqlFileLoader::path_relative_to::<person::Repository>("Select.sql");
        assert!(path.ends_with("sql/loader/tests/person/Select.sql"), "{}", path.display());
        assert!(path.starts_with("clione_sql_boot"));
    }

    #[tokio::test]
    async fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let err = loader(dir.path(), |_| {}).load("nope.sql").await.unwrap_err();
        match err {
            ClioneError::SqlFileNotFound { path } => assert_eq!(path, dir.path().join("nope.sql")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[tokio::test]
    async fn caches_outside_development_mode() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sql"), "SELECT 1").unwrap();
        let l = loader(dir.path(), |_| {});
        assert_eq!(render(&l.load("a.sql").await.unwrap()), "SELECT 1");
        std::fs::write(dir.path().join("a.sql"), "SELECT 2").unwrap();
        assert_eq!(render(&l.load("a.sql").await.unwrap()), "SELECT 1");
    }

    #[tokio::test]
    async fn development_mode_reloads_after_cache_time() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sql"), "SELECT 1").unwrap();
        let l = loader(dir.path(), |p| {
            p.set_development_mode(true);
            p.set_sql_file_cache_time(0);
        });
        assert_eq!(render(&l.load("a.sql").await.unwrap()), "SELECT 1");
        std::fs::write(dir.path().join("a.sql"), "SELECT 2").unwrap();
        assert_eq!(render(&l.load("a.sql").await.unwrap()), "SELECT 2");
    }

    #[tokio::test]
    async fn development_mode_reuses_text_within_cache_time() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sql"), "SELECT 1").unwrap();
        let l = loader(dir.path(), |p| {
            p.set_development_mode(true);
            p.set_sql_file_cache_time(60_000);
        });
        let first = l.load("a.sql").await.unwrap();
        std::fs::write(dir.path().join("a.sql"), "SELECT 2").unwrap();
        let second = l.load("a.sql").await.unwrap();
        assert_eq!(render(&second), "SELECT 1");
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[tokio::test]
    async fn undecodable_file_is_read_failure() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.sql"), [0xFFu8, 0xFE]).unwrap();
        let err = loader(dir.path(), |_| {}).load("a.sql").await.unwrap_err();
        assert!(matches!(err, ClioneError::FileRead { .. }));
    }
}
