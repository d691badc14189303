//! Transaction-aware connection provider over an sqlx `AnyPool`.
//!
//! Outside a transaction every `get_connection` checks a fresh connection out of the pool.
//! Inside `in_transaction` the transaction's connection is bound to the current task and handed
//! out instead, so every call in the unit of work sees the same transactional state.
//!
//! The binding is keyed by the pool, not by the wrapper: every source built over clones of one
//! pool joins the same transaction.

use crate::error::ClioneError;
use sqlx::any::{AnyArguments, AnyQueryResult, AnyRow};
use sqlx::{AnyConnection, AnyPool};
use sqlx::pool::PoolConnection;
use sqlx::query::Query;
use sqlx::{Any, Transaction};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::Mutex;

type SharedTransaction = Arc<Mutex<Option<Transaction<'static, Any>>>>;

#[derive(Clone)]
struct BoundTransaction {
    pool: AnyPool,
    tx: SharedTransaction,
}

tokio::task_local! {
    static CURRENT_TRANSACTION: BoundTransaction;
}

/// Connection provider that participates in the ambient transaction.
#[derive(Clone)]
pub struct TransactionAwareDataSource {
    pool: AnyPool,
}

/// Clones of a pool share their connect options.
fn same_pool(a: &AnyPool, b: &AnyPool) -> bool {
    Arc::ptr_eq(&a.connect_options(), &b.connect_options())
}

impl PartialEq for TransactionAwareDataSource {
    fn eq(&self, other: &Self) -> bool {
        same_pool(&self.pool, &other.pool)
    }
}

impl Eq for TransactionAwareDataSource {}

impl std::fmt::Debug for TransactionAwareDataSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransactionAwareDataSource")
            .field("pool_size", &self.pool.size())
            .finish()
    }
}

impl From<AnyPool> for TransactionAwareDataSource {
    fn from(pool: AnyPool) -> Self {
        Self::new(pool)
    }
}

impl TransactionAwareDataSource {
    pub fn new(pool: AnyPool) -> Self {
        Self { pool }
    }

    /// Wrap a raw pool, or return an already transaction-aware source unchanged.
    pub fn wrap(source: impl Into<TransactionAwareDataSource>) -> Self {
        source.into()
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn in_transaction_scope(&self) -> bool {
        self.bound().is_some()
    }

    fn bound(&self) -> Option<SharedTransaction> {
        CURRENT_TRANSACTION
            .try_with(|b| same_pool(&b.pool, &self.pool).then(|| b.tx.clone()))
            .ok()
            .flatten()
    }

    /// The connection for the current unit of work: the bound transactional one, or a new one
    /// from the pool.
    pub async fn get_connection(&self) -> Result<ConnectionHandle, ClioneError> {
        if let Some(tx) = self.bound() {
            return Ok(ConnectionHandle::Transactional(tx));
        }
        let conn = self.pool.acquire().await.map_err(|e| ClioneError::ConnectionNotFound {
            message: e.to_string(),
            source: Some(e),
        })?;
        Ok(ConnectionHandle::Pooled(conn))
    }

    /// Run `f` in a transaction: commit on `Ok`, roll back on `Err`. Joins an enclosing
    /// transaction on the same pool instead of starting a new one.
    pub async fn in_transaction<F, Fut, T, E>(&self, f: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: From<ClioneError>,
    {
        if self.in_transaction_scope() {
            return f().await;
        }
        let tx = self.pool.begin().await.map_err(|e| ClioneError::ConnectionNotFound {
            message: e.to_string(),
            source: Some(e),
        })?;
        let shared: SharedTransaction = Arc::new(Mutex::new(Some(tx)));
        let bound = BoundTransaction {
            pool: self.pool.clone(),
            tx: shared.clone(),
        };
        tracing::debug!("transaction started");
        let result = CURRENT_TRANSACTION.scope(bound, f()).await;

        let tx = shared.lock().await.take();
        let Some(tx) = tx else {
            return result;
        };
        match &result {
            Ok(_) => {
                tx.commit().await.map_err(ClioneError::from_statement)?;
                tracing::debug!("transaction committed");
            }
            Err(_) => {
                if let Err(e) = tx.rollback().await {
                    tracing::warn!(error = %e, "rollback failed");
                } else {
                    tracing::debug!("transaction rolled back");
                }
            }
        }
        result
    }
}

/// A connection for one unit of work.
pub enum ConnectionHandle {
    Pooled(PoolConnection<Any>),
    Transactional(SharedTransaction),
}

impl std::fmt::Debug for ConnectionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionHandle::Pooled(_) => f.write_str("ConnectionHandle::Pooled"),
            ConnectionHandle::Transactional(_) => f.write_str("ConnectionHandle::Transactional"),
        }
    }
}

fn closed_transaction() -> ClioneError {
    ClioneError::connection_not_found("transaction already completed")
}

impl ConnectionHandle {
    pub fn is_transactional(&self) -> bool {
        matches!(self, ConnectionHandle::Transactional(_))
    }

    /// Backend name reported by the driver, e.g. `PostgreSQL` or `SQLite`.
    pub async fn backend_name(&mut self) -> Result<String, ClioneError> {
        match self {
            ConnectionHandle::Pooled(conn) => Ok(backend_of(conn)),
            ConnectionHandle::Transactional(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(closed_transaction)?;
                Ok(backend_of(tx))
            }
        }
    }

    pub async fn fetch_all<'q>(
        &mut self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Result<Vec<AnyRow>, ClioneError> {
        match self {
            ConnectionHandle::Pooled(conn) => query.fetch_all(&mut **conn).await.map_err(ClioneError::from_statement),
            ConnectionHandle::Transactional(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(closed_transaction)?;
                query.fetch_all(&mut **tx).await.map_err(ClioneError::from_statement)
            }
        }
    }

    pub async fn execute<'q>(
        &mut self,
        query: Query<'q, Any, AnyArguments<'q>>,
    ) -> Result<AnyQueryResult, ClioneError> {
        match self {
            ConnectionHandle::Pooled(conn) => query.execute(&mut **conn).await.map_err(ClioneError::from_statement),
            ConnectionHandle::Transactional(shared) => {
                let mut guard = shared.lock().await;
                let tx = guard.as_mut().ok_or_else(closed_transaction)?;
                query.execute(&mut **tx).await.map_err(ClioneError::from_statement)
            }
        }
    }
}

fn backend_of(conn: &AnyConnection) -> String {
    conn.backend_name().to_string()
}
