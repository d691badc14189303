//! Maps `ClioneError` kinds onto data-access failure categories.

use super::sql_state::{categorize, SqlStateCategory};
use crate::error::{BoxError, ClioneError};
use thiserror::Error;

/// Host-recognized failure categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureCategory {
    ResourceFailure,
    NonTransientResourceFailure,
    InvalidUsage,
    DuplicateKey,
    SqlStateDerived(SqlStateCategory),
    Unrecognized,
}

/// A translated failure. The original error is kept as the source.
#[derive(Error, Debug)]
#[error("{message}")]
pub struct DataAccessError {
    category: FailureCategory,
    message: String,
    #[source]
    cause: BoxError,
}

impl DataAccessError {
    pub fn category(&self) -> FailureCategory {
        self.category
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn cause(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        self.cause.as_ref()
    }

    pub fn into_cause(self) -> BoxError {
        self.cause
    }
}

/// Outcome of asking a translator about a failure.
#[derive(Debug)]
pub enum Translation {
    Translated(DataAccessError),
    /// Not handled; the failure is handed back untouched for the next translator.
    Unrecognized(BoxError),
}

impl Translation {
    pub fn is_translated(&self) -> bool {
        matches!(self, Translation::Translated(_))
    }
}

/// One link in a chain of exception translators.
pub trait PersistenceExceptionTranslator: Send + Sync {
    fn translate_if_possible(&self, err: BoxError) -> Translation;
}

/// Translator for failures raised by the 2-Way SQL layer.
#[derive(Debug, Default, Clone, Copy)]
pub struct ClioneSqlExceptionTranslator;

impl ClioneSqlExceptionTranslator {
    pub fn new() -> Self {
        Self
    }

    /// Pure classification; anything that is not a `ClioneError` is `Unrecognized`.
    pub fn classify(err: &(dyn std::error::Error + 'static)) -> FailureCategory {
        match err.downcast_ref::<ClioneError>() {
            Some(ClioneError::Sql(failure)) => FailureCategory::SqlStateDerived(categorize(failure)),
            Some(ClioneError::ConnectionNotFound { .. }) => FailureCategory::ResourceFailure,
            Some(ClioneError::SqlFileNotFound { .. }) => FailureCategory::NonTransientResourceFailure,
            Some(ClioneError::ParameterNotFound(_)) => FailureCategory::InvalidUsage,
            Some(ClioneError::Format(_)) => FailureCategory::InvalidUsage,
            Some(ClioneError::DuplicateKey { .. }) => FailureCategory::DuplicateKey,
            Some(ClioneError::FileRead { .. }) | None => FailureCategory::Unrecognized,
        }
    }
}

impl PersistenceExceptionTranslator for ClioneSqlExceptionTranslator {
    fn translate_if_possible(&self, err: BoxError) -> Translation {
        let category = Self::classify(err.as_ref());
        if category == FailureCategory::Unrecognized {
            return Translation::Unrecognized(err);
        }
        Translation::Translated(DataAccessError {
            category,
            message: err.to_string(),
            cause: err,
        })
    }
}
