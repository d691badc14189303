//! Translation of 2-Way SQL failures into data-access failure categories.

mod chain;
mod sql_state;
mod translator;

pub use chain::ChainedExceptionTranslator;
pub use sql_state::{categorize, SqlStateCategory};
pub use translator::{
    ClioneSqlExceptionTranslator, DataAccessError, FailureCategory, PersistenceExceptionTranslator, Translation,
};
