//! REST endpoints under /persons.

use crate::app::AppState;
use axum::{
    extract::{Path, Query, State},
    response::IntoResponse,
    routing::{get, put},
    Router,
};
use clione_sql_boot::response::Affected;
use clione_sql_boot::{success_many, success_one, success_one_ok, AppError};
use serde::Deserialize;

#[derive(Deserialize)]
struct SearchQuery {
    name: Option<String>,
}

#[derive(Deserialize)]
struct InsertQuery {
    id: i64,
    name: String,
    status: String,
}

#[derive(Deserialize)]
struct StatusQuery {
    status: String,
}

async fn find_all(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let rows = state.beans.translate_result(state.persons.find_all().await)?;
    Ok(success_many(rows))
}

async fn find_by_name(
    State(state): State<AppState>,
    Query(q): Query<SearchQuery>,
) -> Result<impl IntoResponse, AppError> {
    let name = q.name.unwrap_or_default();
    if name.trim().is_empty() {
        return Err(AppError::BadRequest("name must not be blank".into()));
    }
    let rows = state.beans.translate_result(state.persons.find_by_name(&name).await)?;
    Ok(success_many(rows))
}

async fn find_by_id(State(state): State<AppState>, Path(id): Path<i64>) -> Result<impl IntoResponse, AppError> {
    let row = state.beans.translate_result(state.persons.find_by_id(id).await)?;
    let row = row.ok_or_else(|| AppError::NotFound(format!("person {}", id)))?;
    Ok(success_one_ok(row))
}

async fn insert(State(state): State<AppState>, Query(q): Query<InsertQuery>) -> Result<impl IntoResponse, AppError> {
    let affected = state
        .beans
        .translate_result(state.persons.insert(q.id, &q.name, &q.status).await)?;
    tracing::info!(id = q.id, "person created");
    Ok(success_one(Affected { affected }))
}

async fn update_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(q): Query<StatusQuery>,
) -> Result<impl IntoResponse, AppError> {
    let affected = state
        .beans
        .translate_result(state.persons.update_status(id, &q.status).await)?;
    Ok(success_one_ok(Affected { affected }))
}

pub fn person_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(find_all).post(insert))
        .route("/search", get(find_by_name))
        .route("/:id", get(find_by_id))
        .route("/:id/status", put(update_status))
        .with_state(state)
}
