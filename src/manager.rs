//! Per-call execution context: one connection, one dialect.

use crate::datasource::ConnectionHandle;
use crate::error::ClioneError;
use crate::sql::{Dialect, SqlExecutor, SqlFileLoader, SqlTemplate};
use std::path::Path;
use std::sync::Arc;

/// Binds a connection and dialect for one unit of work. Built fresh for every facade call and
/// consumed by the executor it produces.
#[derive(Debug)]
pub struct SqlManager {
    conn: ConnectionHandle,
    dialect: Dialect,
    depth_limit: usize,
}

impl SqlManager {
    /// Manager with an explicit dialect.
    pub fn with_dialect(conn: ConnectionHandle, dialect: Dialect, depth_limit: usize) -> Self {
        Self {
            conn,
            dialect,
            depth_limit,
        }
    }

    /// Manager whose dialect is detected from the connection's backend.
    pub async fn detect(mut conn: ConnectionHandle, depth_limit: usize) -> Result<Self, ClioneError> {
        let backend = conn.backend_name().await?;
        let dialect = Dialect::detect(&backend);
        tracing::debug!(backend = %backend, dialect = %dialect, "detected dialect");
        Ok(Self::with_dialect(conn, dialect, depth_limit))
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub async fn use_file(self, loader: &SqlFileLoader, path: impl AsRef<Path>) -> Result<SqlExecutor, ClioneError> {
        let template = loader.load(path).await?;
        Ok(self.into_executor(template))
    }

    pub fn use_sql(self, sql: &str) -> Result<SqlExecutor, ClioneError> {
        let template = Arc::new(SqlTemplate::parse(sql)?);
        Ok(self.into_executor(template))
    }

    fn into_executor(self, template: Arc<SqlTemplate>) -> SqlExecutor {
        SqlExecutor::new(self.conn, self.dialect, template, self.depth_limit)
    }
}
