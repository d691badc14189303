//! Application assembly: schema, startup wiring and routes.

use crate::person::{person_routes, PersonService};
use axum::Router;
use clione_sql_boot::{
    common_routes_with_ready, AppError, ClioneSqlAutoConfiguration, ClioneSqlBeans, ClioneSqlProperties,
    ClioneSqlTemplate, Params,
};
use sqlx::AnyPool;
use tower_http::limit::RequestBodyLimitLayer;

const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub persons: PersonService,
    pub beans: ClioneSqlBeans,
}

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS person (
    id INTEGER PRIMARY KEY,
    name VARCHAR(100) NOT NULL,
    status VARCHAR(20) NOT NULL,
    created_at VARCHAR(40) NOT NULL DEFAULT CURRENT_TIMESTAMP
)";

const SEED: &[(i64, &str, &str)] = &[(1, "Alice", "ACTIVE"), (2, "Bob", "ACTIVE"), (3, "Carol", "INACTIVE")];

/// Create the person table and seed it when empty.
pub async fn init_schema(template: &ClioneSqlTemplate) -> Result<(), AppError> {
    template.use_sql(SCHEMA).await?.update(&Params::new()).await?;
    let existing = template
        .use_sql("SELECT COUNT(*) AS cnt FROM person")
        .await?
        .find(&Params::new())
        .await?
        .and_then(|r| r.get_i64("cnt"))
        .unwrap_or(0);
    if existing > 0 {
        return Ok(());
    }
    let now = chrono::Utc::now().to_rfc3339();
    template
        .transaction(|| async {
            for (id, name, status) in SEED {
                template
                    .use_sql(
                        "INSERT INTO person (id, name, status, created_at) \
                         VALUES (/* id */0, /* name */'dummy', /* status */'ACTIVE', /* created_at */'2024-01-01')",
                    )
                    .await?
                    .update(
                        &Params::new()
                            .with("id", *id)
                            .with("name", *name)
                            .with("status", *status)
                            .with("created_at", now.as_str()),
                    )
                    .await?;
            }
            Ok::<_, AppError>(())
        })
        .await?;
    tracing::info!(rows = SEED.len(), "seeded person table");
    Ok(())
}

/// Wire the library against `pool` and mount the sample routes.
pub async fn build_app(pool: AnyPool, properties: ClioneSqlProperties) -> Result<Router, AppError> {
    let beans = ClioneSqlAutoConfiguration::new(properties)
        .with_data_source(pool)
        .configure()?;
    let template = beans
        .template()
        .cloned()
        .ok_or_else(|| AppError::Internal("no template configured".into()))?;
    init_schema(&template).await?;

    let state = AppState {
        persons: PersonService::new(template.clone()),
        beans,
    };
    Ok(Router::new()
        .merge(common_routes_with_ready(template))
        .nest("/persons", person_routes(state))
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT)))
}
