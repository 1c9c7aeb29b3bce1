//! HTTP handlers grouped by area.
//!
//! Lookups answer 404 for unknown ids. Execute and flow actions answer 200
//! with `success: false` so callers see partial failure in the body.

mod catalog;
pub mod doc;
mod endpoints;
mod execute;
mod flows;
mod health;
mod web3;

use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

// ── Shared types ─────────────────────────────────────────────────

#[derive(Debug, Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

pub(crate) type ApiError = (StatusCode, Json<ErrorResponse>);

pub(crate) fn error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (status, Json(ErrorResponse { error: message.into() }))
}

pub(crate) fn not_found(what: &str, id: &str) -> ApiError {
    error(StatusCode::NOT_FOUND, format!("{what} not found: {id}"))
}

// ── Re-exports ───────────────────────────────────────────────────

pub use catalog::{
    apis_by_category, apis_clear, apis_delete, apis_health_check, apis_list, apis_search, init,
    refresh, sources_list, status,
};
pub use endpoints::{endpoints_get, endpoints_list, endpoints_search};
pub use execute::{demo, execute, flow};
pub use flows::{flows_category, flows_get, flows_list};
pub use health::health;
pub use web3::{
    web3_demo, web3_endpoints, web3_execute, web3_flow, web3_flows, web3_flows_get, web3_status,
};
