//! Sample application: person CRUD over 2-Way SQL.

pub mod app;
pub mod person;

pub use app::{build_app, init_schema, AppState};
