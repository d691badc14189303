//! Sample server. Env: DATABASE_URL (default in-memory SQLite), BIND_ADDR (default 127.0.0.1:8080),
//! CLIONE_SQL_* for library properties.

use clione_sql_boot::telemetry::init_tracing;
use clione_sql_boot::{AppError, ClioneSqlProperties};
use clione_sql_samples::build_app;
use sqlx::any::AnyPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let _ = dotenvy::dotenv();
    init_tracing("clione_sql_boot=info,clione_sql_samples=info");

    let database_url = std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite::memory:".to_string());
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    sqlx::any::install_default_drivers();
    let mut options = AnyPoolOptions::new().max_connections(5);
    if database_url.starts_with("sqlite::memory:") {
        // every in-memory connection is a separate database
        options = options.max_connections(1).idle_timeout(None).max_lifetime(None);
    }
    let pool = options.connect(&database_url).await?;

    let mut properties = ClioneSqlProperties::from_env().map_err(AppError::from)?;
    if properties.sql_file_root().is_none() {
        properties.set_sql_file_root(Some(env!("CARGO_MANIFEST_DIR").to_string()));
    }

    let app = build_app(pool, properties).await?;
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "listening");
    axum::serve(listener, app).await?;
    Ok(())
}
