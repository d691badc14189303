//! Typed errors and HTTP mapping.

use crate::translate::{DataAccessError, FailureCategory, SqlStateCategory};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

/// Boxed error accepted by exception translators.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for '{key}': {value}")]
    InvalidValue { key: String, value: String },
    #[error("unsupported product name: {0}")]
    UnsupportedProduct(String),
    #[error("unsupported sql file encoding: {0}")]
    UnsupportedEncoding(String),
    #[error("config load: {0}")]
    Load(String),
    #[error("validation: {0}")]
    Validation(String),
}

/// Constraint reported by the driver alongside a database error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    Unique,
    ForeignKey,
    NotNull,
    Check,
}

/// Failure raised while executing a statement, with the vendor SQL state when known.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct SqlFailure {
    message: String,
    sql_state: Option<String>,
    constraint: Option<Constraint>,
    #[source]
    source: Option<sqlx::Error>,
}

impl SqlFailure {
    pub fn new(message: impl Into<String>, sql_state: Option<&str>) -> Self {
        Self {
            message: message.into(),
            sql_state: sql_state.map(str::to_string),
            constraint: None,
            source: None,
        }
    }

    pub fn with_constraint(mut self, constraint: Constraint) -> Self {
        self.constraint = Some(constraint);
        self
    }

    pub fn sql_state(&self) -> Option<&str> {
        self.sql_state.as_deref()
    }

    pub fn constraint(&self) -> Option<Constraint> {
        self.constraint
    }
}

impl From<sqlx::Error> for SqlFailure {
    fn from(err: sqlx::Error) -> Self {
        let (sql_state, constraint) = match &err {
            sqlx::Error::Database(db) => {
                let constraint = match db.kind() {
                    sqlx::error::ErrorKind::UniqueViolation => Some(Constraint::Unique),
                    sqlx::error::ErrorKind::ForeignKeyViolation => Some(Constraint::ForeignKey),
                    sqlx::error::ErrorKind::NotNullViolation => Some(Constraint::NotNull),
                    sqlx::error::ErrorKind::CheckViolation => Some(Constraint::Check),
                    _ => None,
                };
                (db.code().map(|c| c.into_owned()), constraint)
            }
            _ => (None, None),
        };
        Self {
            message: err.to_string(),
            sql_state,
            constraint,
            source: Some(err),
        }
    }
}

/// Failures raised by the 2-Way SQL layer.
#[derive(Error, Debug)]
pub enum ClioneError {
    #[error("sql execution failed: {0}")]
    Sql(#[from] SqlFailure),
    #[error("connection not found: {message}")]
    ConnectionNotFound {
        message: String,
        #[source]
        source: Option<sqlx::Error>,
    },
    #[error("sql file not found: {}", path.display())]
    SqlFileNotFound { path: PathBuf },
    #[error("parameter not found: {0}")]
    ParameterNotFound(String),
    #[error("format: {0}")]
    Format(String),
    #[error("duplicate key: {message}")]
    DuplicateKey {
        message: String,
        #[source]
        source: Option<SqlFailure>,
    },
    #[error("sql file read failed: {}: {source}", path.display())]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl ClioneError {
    pub fn connection_not_found(message: impl Into<String>) -> Self {
        ClioneError::ConnectionNotFound {
            message: message.into(),
            source: None,
        }
    }

    pub fn duplicate_key(message: impl Into<String>) -> Self {
        ClioneError::DuplicateKey {
            message: message.into(),
            source: None,
        }
    }

    /// Wraps a statement failure, lifting unique violations to `DuplicateKey`.
    pub(crate) fn from_statement(err: sqlx::Error) -> Self {
        let failure = SqlFailure::from(err);
        if failure.constraint() == Some(Constraint::Unique) {
            return ClioneError::DuplicateKey {
                message: failure.message.clone(),
                source: Some(failure),
            };
        }
        ClioneError::Sql(failure)
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    DataAccess(#[from] DataAccessError),
    #[error(transparent)]
    Clione(#[from] ClioneError),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("internal: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

fn data_access_status(category: FailureCategory) -> (StatusCode, &'static str) {
    match category {
        FailureCategory::ResourceFailure => (StatusCode::SERVICE_UNAVAILABLE, "resource_failure"),
        FailureCategory::NonTransientResourceFailure => {
            (StatusCode::INTERNAL_SERVER_ERROR, "non_transient_resource_failure")
        }
        FailureCategory::InvalidUsage => (StatusCode::BAD_REQUEST, "invalid_usage"),
        FailureCategory::DuplicateKey => (StatusCode::CONFLICT, "duplicate_key"),
        FailureCategory::SqlStateDerived(state) => match state {
            SqlStateCategory::DuplicateKey => (StatusCode::CONFLICT, "duplicate_key"),
            SqlStateCategory::DataIntegrityViolation => (StatusCode::CONFLICT, "data_integrity_violation"),
            SqlStateCategory::BadSqlGrammar => (StatusCode::INTERNAL_SERVER_ERROR, "bad_sql_grammar"),
            SqlStateCategory::DataAccessResourceFailure
            | SqlStateCategory::TransientDataAccessResource
            | SqlStateCategory::QueryTimeout => (StatusCode::SERVICE_UNAVAILABLE, "resource_failure"),
            SqlStateCategory::ConcurrencyFailure => (StatusCode::CONFLICT, "concurrency_failure"),
            SqlStateCategory::Uncategorized => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
        },
        FailureCategory::Unrecognized => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::DataAccess(e) => data_access_status(e.category()),
            AppError::Clione(_) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::BadRequest(_) => (StatusCode::BAD_REQUEST, "bad_request"),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error"),
        };
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message: self.to_string(),
                details: None,
            },
        };
        (status, Json(body)).into_response()
    }
}
