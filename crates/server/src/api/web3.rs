use std::sync::Arc;

use apiloom_exec::{params_from_json, ExecutionResult, FlowExecutionResult, Web3Status, DEMO_ADDRESS};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::state::AppState;

use super::execute::{execution_status, required_field, ExecuteRequest};
use super::{not_found, ApiError, ErrorResponse};

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Web3FlowRequest {
    pub flow_id: Option<String>,
    pub address: Option<String>,
    pub chain: Option<String>,
}

#[derive(Debug, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DemoQuery {
    /// Wallet to inspect; a well-known address when omitted.
    pub address: Option<String>,
    pub chain: Option<String>,
}

#[utoipa::path(
    get,
    path = "/web3/status",
    tag = "Web3",
    responses((status = 200, description = "Providers, configured flags and flows", body = Object))
)]
pub async fn web3_status(State(state): State<Arc<AppState>>) -> Json<Web3Status> {
    Json(state.web3.status())
}

#[utoipa::path(
    get,
    path = "/web3/endpoints",
    tag = "Web3",
    responses((status = 200, description = "Chain-data operations", body = Object))
)]
pub async fn web3_endpoints(State(state): State<Arc<AppState>>) -> Json<Value> {
    let endpoints = state.web3.endpoints();
    Json(json!({ "count": endpoints.len(), "endpoints": endpoints }))
}

#[utoipa::path(
    get,
    path = "/web3/flows",
    tag = "Web3",
    responses((status = 200, description = "Fixed chain-data flows", body = Object))
)]
pub async fn web3_flows(State(state): State<Arc<AppState>>) -> Json<Value> {
    let flows = state.web3.flows();
    Json(json!({ "count": flows.len(), "flows": flows }))
}

#[utoipa::path(
    get,
    path = "/web3/flows/{id}",
    tag = "Web3",
    params(("id" = String, Path, description = "Flow id")),
    responses(
        (status = 200, description = "Flow definition", body = Object),
        (status = 404, description = "Unknown flow", body = ErrorResponse)
    )
)]
pub async fn web3_flows_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let flow = state.web3.flow(&id).ok_or_else(|| not_found("web3 flow", &id))?;
    Ok(Json(json!({ "flow": flow })))
}

#[utoipa::path(
    post,
    path = "/web3/execute",
    tag = "Web3",
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "Execution result, success or failure", body = Object),
        (status = 400, description = "Missing key or missing address", body = ErrorResponse)
    )
)]
pub async fn web3_execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRequest>,
) -> Result<(StatusCode, Json<ExecutionResult>), ApiError> {
    let key = required_field(req.key, "key")?;
    let params = req.params.as_ref().map(params_from_json).unwrap_or_default();
    let result = state.web3.execute_endpoint(&key, &params).await;
    Ok((execution_status(&result), Json(result)))
}

#[utoipa::path(
    post,
    path = "/web3/flow",
    tag = "Web3",
    request_body = Web3FlowRequest,
    responses(
        (status = 200, description = "Parallel flow result", body = Object),
        (status = 400, description = "Missing flowId or address", body = ErrorResponse)
    )
)]
pub async fn web3_flow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<Web3FlowRequest>,
) -> Result<Json<FlowExecutionResult>, ApiError> {
    let flow_id = required_field(req.flow_id, "flowId")?;
    let address = required_field(req.address, "address")?;
    let result = state.web3.execute_flow(&flow_id, &address, req.chain.as_deref()).await;
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/web3/demo",
    tag = "Web3",
    params(DemoQuery),
    responses((status = 200, description = "wallet-overview for the given or default address", body = Object))
)]
pub async fn web3_demo(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DemoQuery>,
) -> Json<FlowExecutionResult> {
    let address = query
        .address
        .filter(|a| !a.trim().is_empty())
        .unwrap_or_else(|| DEMO_ADDRESS.to_string());
    Json(
        state
            .web3
            .execute_flow("wallet-overview", &address, query.chain.as_deref())
            .await,
    )
}
