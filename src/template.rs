//! Facade for executing 2-Way SQL against the application's data source.
//!
//! Every call checks out the connection for the current unit of work and builds a new
//! [`SqlManager`] around it, so nothing mutable is shared between calls.
//!
//! ```ignore
//! let people = template.use_file("sql/person/SelectAll.sql").await?.find_all(&Params::new()).await?;
//!
//! let person = template
//!     .use_sql("SELECT * FROM person WHERE id = /* id */'1'")
//!     .await?
//!     .find(&Params::new().with("id", 1))
//!     .await?;
//! ```

use crate::config::ClioneSqlProperties;
use crate::datasource::TransactionAwareDataSource;
use crate::error::ClioneError;
use crate::manager::SqlManager;
use crate::sql::{Dialect, SqlExecutor, SqlFileLoader};
use std::future::Future;
use std::path::Path;
use std::sync::Arc;

struct Inner {
    data_source: TransactionAwareDataSource,
    properties: ClioneSqlProperties,
    loader: SqlFileLoader,
}

#[derive(Clone)]
pub struct ClioneSqlTemplate {
    inner: Arc<Inner>,
}

impl std::fmt::Debug for ClioneSqlTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClioneSqlTemplate")
            .field("data_source", &self.inner.data_source)
            .field("properties", &self.inner.properties)
            .finish()
    }
}

impl ClioneSqlTemplate {
    /// A raw pool is wrapped in a [`TransactionAwareDataSource`]; an already wrapped source is used as is.
    pub fn new(data_source: impl Into<TransactionAwareDataSource>, properties: ClioneSqlProperties) -> Self {
        let loader = SqlFileLoader::new(&properties);
        Self {
            inner: Arc::new(Inner {
                data_source: TransactionAwareDataSource::wrap(data_source),
                properties,
                loader,
            }),
        }
    }

    pub fn data_source(&self) -> &TransactionAwareDataSource {
        &self.inner.data_source
    }

    pub fn properties(&self) -> &ClioneSqlProperties {
        &self.inner.properties
    }

    /// Whether both handles refer to the same template instance.
    pub fn same_instance(&self, other: &ClioneSqlTemplate) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Load a template from a file under the configured SQL root.
    pub async fn use_file(&self, sql_path: impl AsRef<Path>) -> Result<SqlExecutor, ClioneError> {
        let manager = self.create_sql_manager().await?;
        manager.use_file(&self.inner.loader, sql_path).await
    }

    /// Load a template from the directory that mirrors `T`'s module path.
    pub async fn use_file_for<T: ?Sized>(&self, sql_file: &str) -> Result<SqlExecutor, ClioneError> {
        let path = SqlFileLoader::path_relative_to::<T>(sql_file);
        self.use_file(path).await
    }

    /// Use an inline 2-Way SQL string.
    pub async fn use_sql(&self, sql: &str) -> Result<SqlExecutor, ClioneError> {
        let manager = self.create_sql_manager().await?;
        manager.use_sql(sql)
    }

    /// Run `f` in a transaction on this template's data source.
    pub async fn transaction<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ClioneError>,
    {
        self.inner.data_source.in_transaction(f).await
    }

    async fn create_sql_manager(&self) -> Result<SqlManager, ClioneError> {
        let conn = self.inner.data_source.get_connection().await?;
        let depth_limit = self.inner.properties.entity_depth_limit().max(1) as usize;
        match self.inner.properties.product_name() {
            Some(name) => match Dialect::from_product_name(name) {
                Some(dialect) => Ok(SqlManager::with_dialect(conn, dialect, depth_limit)),
                None => {
                    tracing::warn!(product_name = %name, "unknown product name, detecting dialect");
                    SqlManager::detect(conn, depth_limit).await
                }
            },
            None => SqlManager::detect(conn, depth_limit).await,
        }
    }
}
