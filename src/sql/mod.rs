//! 2-Way SQL: templates, parameters, dialects, SQL files and execution.

mod dialect;
mod executor;
mod loader;
mod params;
mod result;
mod template;

pub use dialect::Dialect;
pub use executor::SqlExecutor;
pub use loader::{Encoding, SqlFileLoader};
pub use params::{BindValue, Params};
pub use result::ResultMap;
pub use template::{BoundSql, SqlTemplate};
