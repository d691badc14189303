//! SQL-state class-code lookup.

use crate::error::{Constraint, SqlFailure};

/// Category derived from a vendor SQL state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqlStateCategory {
    BadSqlGrammar,
    DataIntegrityViolation,
    DuplicateKey,
    DataAccessResourceFailure,
    TransientDataAccessResource,
    QueryTimeout,
    ConcurrencyFailure,
    Uncategorized,
}

const BAD_SQL_GRAMMAR_CODES: &[&str] = &["07", "21", "2A", "37", "42", "65"];
const DATA_INTEGRITY_VIOLATION_CODES: &[&str] = &["01", "02", "22", "23", "27", "44"];
const DATA_ACCESS_RESOURCE_FAILURE_CODES: &[&str] = &["08", "53", "54", "57", "58"];
const TRANSIENT_DATA_ACCESS_RESOURCE_CODES: &[&str] = &["JW", "JZ", "S1"];
const CONCURRENCY_FAILURE_CODES: &[&str] = &["40", "61"];

const DUPLICATE_KEY_STATE: &str = "23505";
const QUERY_TIMEOUT_STATE: &str = "57014";

/// Classifies by SQL state. Five-character ANSI states are looked up by class code; drivers that
/// report numeric result codes instead (SQLite) fall back to the reported constraint kind.
pub fn categorize(failure: &SqlFailure) -> SqlStateCategory {
    if let Some(state) = failure.sql_state().filter(|s| is_ansi_state(s)) {
        if state == DUPLICATE_KEY_STATE {
            return SqlStateCategory::DuplicateKey;
        }
        if state == QUERY_TIMEOUT_STATE {
            return SqlStateCategory::QueryTimeout;
        }
        let class = &state[..2];
        if BAD_SQL_GRAMMAR_CODES.contains(&class) {
            return SqlStateCategory::BadSqlGrammar;
        }
        if DATA_INTEGRITY_VIOLATION_CODES.contains(&class) {
            if failure.constraint() == Some(Constraint::Unique) {
                return SqlStateCategory::DuplicateKey;
            }
            return SqlStateCategory::DataIntegrityViolation;
        }
        if DATA_ACCESS_RESOURCE_FAILURE_CODES.contains(&class) {
            return SqlStateCategory::DataAccessResourceFailure;
        }
        if TRANSIENT_DATA_ACCESS_RESOURCE_CODES.contains(&class) {
            return SqlStateCategory::TransientDataAccessResource;
        }
        if CONCURRENCY_FAILURE_CODES.contains(&class) {
            return SqlStateCategory::ConcurrencyFailure;
        }
    }
    match failure.constraint() {
        Some(Constraint::Unique) => SqlStateCategory::DuplicateKey,
        Some(_) => SqlStateCategory::DataIntegrityViolation,
        None => SqlStateCategory::Uncategorized,
    }
}

fn is_ansi_state(state: &str) -> bool {
    state.len() == 5 && state.chars().all(|c| c.is_ascii_alphanumeric())
}
