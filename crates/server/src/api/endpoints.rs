use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde_json::{json, Value};

use crate::state::AppState;

use super::catalog::{require_query, SearchQuery};
use super::{not_found, ApiError, ErrorResponse};

#[utoipa::path(
    get,
    path = "/endpoints",
    tag = "Endpoints",
    responses((status = 200, description = "Every auto endpoint, sorted by key", body = Object))
)]
pub async fn endpoints_list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let endpoints = state.registry.all_auto_endpoints();
    Json(json!({ "count": endpoints.len(), "endpoints": endpoints }))
}

#[utoipa::path(
    get,
    path = "/endpoints/search",
    tag = "Endpoints",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching auto endpoints", body = Object),
        (status = 400, description = "Missing q", body = ErrorResponse)
    )
)]
pub async fn endpoints_search(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Value>, ApiError> {
    let q = require_query(query)?;
    let endpoints = state.registry.search(&q);
    Ok(Json(json!({ "query": q, "count": endpoints.len(), "endpoints": endpoints })))
}

#[utoipa::path(
    get,
    path = "/endpoints/{key}",
    tag = "Endpoints",
    params(("key" = String, Path, description = "public.<api>.<endpoint>")),
    responses(
        (status = 200, description = "Endpoint with a text description", body = Object),
        (status = 404, description = "Unknown key", body = ErrorResponse)
    )
)]
pub async fn endpoints_get(
    State(state): State<Arc<AppState>>,
    Path(key): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let endpoint = state.registry.endpoint(&key).ok_or_else(|| not_found("endpoint", &key))?;
    let description = state.registry.describe_endpoint(&key);
    Ok(Json(json!({ "endpoint": endpoint, "description": description })))
}
