//! Endpoint and flow execution, plus the no-auth smoke test.

use std::sync::Arc;

use apiloom_exec::{
    params_by_step_from_json, params_from_json, ErrorKind, ExecutionResult, FlowExecutionResult, Params,
};
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::state::AppState;

use super::{error, ApiError, ErrorResponse};

const DEMO_LIMIT: usize = 3;

#[derive(Debug, Deserialize, utoipa::ToSchema)]
pub struct ExecuteRequest {
    pub key: Option<String>,
    /// Flat name → value map; non-string scalars are stringified.
    #[schema(value_type = Object)]
    pub params: Option<Value>,
}

#[derive(Debug, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FlowRequest {
    pub flow_id: Option<String>,
    /// Step index, endpoint key or `*` → params.
    #[schema(value_type = Object)]
    pub params: Option<Value>,
    #[serde(default)]
    pub parallel: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DemoResponse {
    pub count: usize,
    pub succeeded: usize,
    pub results: Vec<ExecutionResult>,
}

pub(crate) fn required_field(value: Option<String>, field: &str) -> Result<String, ApiError> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| error(StatusCode::BAD_REQUEST, format!("missing required field: {field}")))
}

/// Missing required parameters are a caller error; every other failure is
/// reported in the body with 200.
pub(crate) fn execution_status(result: &ExecutionResult) -> StatusCode {
    match result.error_kind() {
        Some(ErrorKind::MissingParameters) => StatusCode::BAD_REQUEST,
        _ => StatusCode::OK,
    }
}

#[utoipa::path(
    post,
    path = "/execute",
    tag = "Execution",
    request_body = ExecuteRequest,
    responses(
        (status = 200, description = "Execution result, success or failure", body = Object),
        (status = 400, description = "Missing key or missing required parameters", body = ErrorResponse)
    )
)]
pub async fn execute(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ExecuteRequest>,
) -> Result<(StatusCode, Json<ExecutionResult>), ApiError> {
    let key = required_field(req.key, "key")?;
    let params = req.params.as_ref().map(params_from_json).unwrap_or_default();
    let result = state.executor.execute_endpoint(&key, &params).await;
    Ok((execution_status(&result), Json(result)))
}

#[utoipa::path(
    post,
    path = "/flow",
    tag = "Execution",
    request_body = FlowRequest,
    responses(
        (status = 200, description = "Flow result; unknown flows report success false", body = Object),
        (status = 400, description = "Missing flowId", body = ErrorResponse)
    )
)]
pub async fn flow(
    State(state): State<Arc<AppState>>,
    Json(req): Json<FlowRequest>,
) -> Result<Json<FlowExecutionResult>, ApiError> {
    let flow_id = required_field(req.flow_id, "flowId")?;
    let by_step = req.params.as_ref().map(params_by_step_from_json).unwrap_or_default();
    let result = if req.parallel {
        state.executor.execute_parallel_flow(&flow_id, &by_step).await
    } else {
        state.executor.execute_flow(&flow_id, &by_step).await
    };
    Ok(Json(result))
}

#[utoipa::path(
    get,
    path = "/demo",
    tag = "Execution",
    responses((status = 200, description = "Up to three keyless endpoints executed", body = Object))
)]
pub async fn demo(State(state): State<Arc<AppState>>) -> Json<DemoResponse> {
    let endpoints = state.executor.demo_endpoints(DEMO_LIMIT);
    let empty = Params::new();
    let results = join_all(
        endpoints
            .iter()
            .map(|ep| state.executor.execute_endpoint(&ep.key, &empty)),
    )
    .await;
    Json(DemoResponse {
        count: results.len(),
        succeeded: results.iter().filter(|r| r.success).count(),
        results,
    })
}
