//! clione-sql boot: 2-Way SQL facade, property binding, exception translation and startup wiring.

pub mod autoconfig;
pub mod config;
pub mod datasource;
pub mod error;
pub mod manager;
pub mod response;
pub mod routes;
pub mod sql;
pub mod telemetry;
pub mod template;
pub mod translate;

pub use autoconfig::{ClioneSqlAutoConfiguration, ClioneSqlBeans};
pub use config::{validate, ClioneSqlProperties};
pub use datasource::{ConnectionHandle, TransactionAwareDataSource};
pub use error::{AppError, BoxError, ClioneError, ConfigError, SqlFailure};
pub use manager::SqlManager;
pub use response::{success_many, success_one, success_one_ok};
pub use routes::common_routes_with_ready;
pub use sql::{Dialect, Params, ResultMap, SqlExecutor};
pub use template::ClioneSqlTemplate;
pub use translate::{
    ChainedExceptionTranslator, ClioneSqlExceptionTranslator, DataAccessError, FailureCategory,
    PersistenceExceptionTranslator, SqlStateCategory, Translation,
};
