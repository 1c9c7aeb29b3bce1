use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;

use super::{error, not_found, ApiError, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct CategoryFlowRequest {
    #[serde(default)]
    pub categories: Vec<String>,
}

#[utoipa::path(
    get,
    path = "/flows",
    tag = "Flows",
    responses((status = 200, description = "Stored flows, auto and manual", body = Object))
)]
pub async fn flows_list(State(state): State<Arc<AppState>>) -> Json<Value> {
    let flows = state.store.get_all_flows();
    Json(json!({ "count": flows.len(), "flows": flows }))
}

#[utoipa::path(
    get,
    path = "/flows/{id}",
    tag = "Flows",
    params(("id" = String, Path, description = "Flow id")),
    responses(
        (status = 200, description = "Flow with its rendered description", body = Object),
        (status = 404, description = "Unknown flow", body = ErrorResponse)
    )
)]
pub async fn flows_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let flow = state.store.get_flow(&id).ok_or_else(|| not_found("flow", &id))?;
    let description = state.composer.describe_flow(&id);
    Ok(Json(json!({ "flow": flow, "description": description })))
}

#[utoipa::path(
    post,
    path = "/flows/category",
    tag = "Flows",
    request_body = CategoryFlowRequest,
    responses(
        (status = 201, description = "Composed and stored flow", body = Object),
        (status = 400, description = "No categories given", body = ErrorResponse),
        (status = 422, description = "Fewer than two categories resolved", body = ErrorResponse)
    )
)]
pub async fn flows_category(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CategoryFlowRequest>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let categories: Vec<String> = req
        .categories
        .into_iter()
        .map(|c| c.trim().to_string())
        .filter(|c| !c.is_empty())
        .collect();
    if categories.is_empty() {
        return Err(error(StatusCode::BAD_REQUEST, "categories must not be empty"));
    }

    let flow = state.composer.generate_category_flow(&categories).ok_or_else(|| {
        error(
            StatusCode::UNPROCESSABLE_ENTITY,
            format!("could not resolve two keyless APIs from categories: {}", categories.join(", ")),
        )
    })?;
    let description = state.composer.describe_flow(&flow.id);
    Ok((StatusCode::CREATED, Json(json!({ "flow": flow, "description": description }))))
}
