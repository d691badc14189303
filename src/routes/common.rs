//! Common routes: health, readiness, version.

use crate::sql::Params;
use crate::template::ClioneSqlTemplate;
use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use serde::Serialize;

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    checked_at: String,
}

#[derive(Serialize)]
struct ReadyBody {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'static str>,
}

async fn health() -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        checked_at: chrono::Utc::now().to_rfc3339(),
    })
}

async fn ready(State(template): State<ClioneSqlTemplate>) -> Result<Json<ReadyBody>, (StatusCode, Json<ReadyBody>)> {
    let probe = async {
        let mut executor = template.use_sql("SELECT 1").await?;
        executor.find(&Params::new()).await
    };
    if let Err(e) = probe.await {
        tracing::warn!(error = %e, "readiness probe failed");
        return Err((
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ReadyBody {
                status: "degraded",
                database: Some("unavailable"),
            }),
        ));
    }
    Ok(Json(ReadyBody {
        status: "ok",
        database: Some("ok"),
    }))
}

async fn version() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Common routes including readiness with a database round trip through the template.
pub fn common_routes_with_ready(template: ClioneSqlTemplate) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .route("/info", get(version))
        .with_state(template)
}
