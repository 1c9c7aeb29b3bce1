//! Status, bootstrap, refresh and catalog browsing/admin handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::startup;
use crate::state::AppState;
use crate::status::{collect, StatusReport};

use super::{error, not_found, ApiError, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct SearchQuery {
    /// Case-insensitive substring.
    pub q: Option<String>,
}

pub(crate) fn require_query(query: SearchQuery) -> Result<String, ApiError> {
    query
        .q
        .map(|q| q.trim().to_string())
        .filter(|q| !q.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, "missing query parameter: q"))
}

// ── Status & lifecycle ───────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/status",
    tag = "Catalog",
    responses((status = 200, description = "Initialization flag and catalog stats", body = Object))
)]
pub async fn status(State(state): State<Arc<AppState>>) -> Json<StatusReport> {
    Json(collect(&state).await)
}

#[utoipa::path(
    post,
    path = "/init",
    tag = "Catalog",
    responses((status = 200, description = "Init summary, cached after the first call", body = Object))
)]
pub async fn init(State(state): State<Arc<AppState>>) -> Json<startup::InitSummary> {
    Json(startup::initialize(&state).await)
}

#[utoipa::path(
    post,
    path = "/refresh",
    tag = "Catalog",
    responses((status = 200, description = "Remote refresh outcome with net-new API count", body = Object))
)]
pub async fn refresh(State(state): State<Arc<AppState>>) -> Json<startup::RefreshSummary> {
    Json(startup::refresh(&state).await)
}

// ── APIs ─────────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/apis",
    tag = "Catalog",
    responses((status = 200, description = "Every catalog entry", body = Object))
)]
pub async fn apis_list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let apis = state.store.get_all_apis();
    Json(json!({ "count": apis.len(), "apis": apis }))
}

#[utoipa::path(
    get,
    path = "/apis/search",
    tag = "Catalog",
    params(SearchQuery),
    responses(
        (status = 200, description = "Entries matching name, description or category", body = Object),
        (status = 400, description = "Missing q", body = ErrorResponse)
    )
)]
pub async fn apis_search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let q = require_query(query)?;
    let apis = state.store.search(&q);
    Ok(Json(json!({ "query": q, "count": apis.len(), "apis": apis })))
}

#[utoipa::path(
    get,
    path = "/apis/category/{category}",
    tag = "Catalog",
    params(("category" = String, Path, description = "Category name, case-insensitive")),
    responses((status = 200, description = "Entries in the category", body = Object))
)]
pub async fn apis_by_category(
    State(state): State<Arc<AppState>>,
    Path(category): Path<String>,
) -> Json<Value> {
    let apis = state.store.by_category(&category);
    Json(json!({ "category": category, "count": apis.len(), "apis": apis }))
}

#[utoipa::path(
    delete,
    path = "/apis/{id}",
    tag = "Catalog",
    params(("id" = String, Path, description = "API name or normalized id")),
    responses(
        (status = 200, description = "Removed entry", body = Object),
        (status = 404, description = "Unknown API", body = ErrorResponse)
    )
)]
pub async fn apis_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let removed = state.store.remove_api(&id).ok_or_else(|| not_found("api", &id))?;
    // Flows are regenerated so none keeps a key into the removed entry.
    let flows = state.composer.generate_auto_flows();
    Ok(Json(json!({ "removed": removed.name, "flows": flows.len() })))
}

#[utoipa::path(
    delete,
    path = "/apis",
    tag = "Catalog",
    responses((status = 200, description = "Catalog cleared", body = Object))
)]
pub async fn apis_clear(State(state): State<Arc<AppState>>) -> Json<Value> {
    let removed = startup::reset(&state).await;
    info!(removed, "catalog cleared by admin");
    Json(json!({ "removed": removed }))
}

#[utoipa::path(
    post,
    path = "/apis/health-check",
    tag = "Catalog",
    responses((status = 200, description = "Probe counts by health status", body = Object))
)]
pub async fn apis_health_check(State(state): State<Arc<AppState>>) -> Json<apiloom_ingest::HealthReport> {
    Json(state.health.check_all(&state.store).await)
}

// ── Sources ──────────────────────────────────────────────────────

#[utoipa::path(
    get,
    path = "/sources",
    tag = "Catalog",
    responses((status = 200, description = "Registered directory sources", body = Object))
)]
pub async fn sources_list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let sources = state.store.get_all_sources();
    Json(json!({ "count": sources.len(), "sources": sources }))
}
