//! Executes one template on the connection it was created with.

use super::dialect::Dialect;
use super::params::{BindValue, Params};
use super::result::{row_to_result_map, ResultMap};
use super::template::{BoundSql, SqlTemplate};
use crate::datasource::ConnectionHandle;
use crate::error::ClioneError;
use serde::de::DeserializeOwned;
use sqlx::any::AnyArguments;
use sqlx::query::Query;
use sqlx::Any;
use std::sync::Arc;

/// Query handle bound to one connection. Not shared between tasks; reusable within its unit of work.
#[derive(Debug)]
pub struct SqlExecutor {
    conn: ConnectionHandle,
    dialect: Dialect,
    template: Arc<SqlTemplate>,
    depth_limit: usize,
}

fn build_query(bound: &BoundSql) -> Query<'_, Any, AnyArguments<'_>> {
    let mut query = sqlx::query::<Any>(&bound.sql);
    for value in &bound.values {
        query = match value {
            BindValue::Null => query.bind(Option::<String>::None),
            BindValue::Bool(b) => query.bind(*b),
            BindValue::I64(n) => query.bind(*n),
            BindValue::F64(n) => query.bind(*n),
            BindValue::String(s) => query.bind(s.as_str()),
        };
    }
    query
}

impl SqlExecutor {
    pub(crate) fn new(conn: ConnectionHandle, dialect: Dialect, template: Arc<SqlTemplate>, depth_limit: usize) -> Self {
        Self {
            conn,
            dialect,
            template,
            depth_limit,
        }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    pub fn is_transactional(&self) -> bool {
        self.conn.is_transactional()
    }

    /// The SQL and values that `params` would produce, without executing.
    pub fn render(&self, params: &Params) -> Result<BoundSql, ClioneError> {
        self.template.bind(params, self.dialect, self.depth_limit)
    }

    pub async fn find_all(&mut self, params: &Params) -> Result<Vec<ResultMap>, ClioneError> {
        let bound = self.render(params)?;
        tracing::debug!(sql = %bound.sql, binds = bound.values.len(), "query");
        let rows = self.conn.fetch_all(build_query(&bound)).await?;
        Ok(rows.iter().map(row_to_result_map).collect())
    }

    /// First row, or `None` when the query returns nothing.
    pub async fn find(&mut self, params: &Params) -> Result<Option<ResultMap>, ClioneError> {
        Ok(self.find_all(params).await?.into_iter().next())
    }

    pub async fn find_as<T: DeserializeOwned>(&mut self, params: &Params) -> Result<Option<T>, ClioneError> {
        self.find(params).await?.map(ResultMap::into_entity).transpose()
    }

    pub async fn find_all_as<T: DeserializeOwned>(&mut self, params: &Params) -> Result<Vec<T>, ClioneError> {
        self.find_all(params)
            .await?
            .into_iter()
            .map(ResultMap::into_entity)
            .collect()
    }

    /// Executes a data-modifying statement and returns the affected row count.
    pub async fn update(&mut self, params: &Params) -> Result<u64, ClioneError> {
        let bound = self.render(params)?;
        tracing::debug!(sql = %bound.sql, binds = bound.values.len(), "update");
        let result = self.conn.execute(build_query(&bound)).await?;
        Ok(result.rows_affected())
    }
}
