//! Route table for the catalog, endpoint, flow, execution and chain-data
//! surfaces. `/docs` serves the Scalar UI over the generated OpenAPI document.

use std::sync::Arc;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::warn;
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::api;
use crate::state::AppState;

/// Build the complete application router with all routes and middleware.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config.server.cors_origin);

    Router::new()
        .route("/health", get(api::health))
        .route("/status", get(api::status))
        .route("/init", post(api::init))
        .route("/refresh", post(api::refresh))
        // Catalog: fixed segments MUST precede /{id}
        .route("/apis", get(api::apis_list).delete(api::apis_clear))
        .route("/apis/search", get(api::apis_search))
        .route("/apis/health-check", post(api::apis_health_check))
        .route("/apis/category/{category}", get(api::apis_by_category))
        .route("/apis/{id}", axum::routing::delete(api::apis_delete))
        .route("/sources", get(api::sources_list))
        // Endpoints
        .route("/endpoints", get(api::endpoints_list))
        .route("/endpoints/search", get(api::endpoints_search))
        .route("/endpoints/{key}", get(api::endpoints_get))
        // Flows
        .route("/flows", get(api::flows_list))
        .route("/flows/category", post(api::flows_category))
        .route("/flows/{id}", get(api::flows_get))
        // Execution
        .route("/execute", post(api::execute))
        .route("/flow", post(api::flow))
        .route("/demo", get(api::demo))
        // Chain data
        .route("/web3/status", get(api::web3_status))
        .route("/web3/endpoints", get(api::web3_endpoints))
        .route("/web3/flows", get(api::web3_flows))
        .route("/web3/flows/{id}", get(api::web3_flows_get))
        .route("/web3/execute", post(api::web3_execute))
        .route("/web3/flow", post(api::web3_flow))
        .route("/web3/demo", get(api::web3_demo))
        .layer(cors)
        .with_state(state)
        .merge(Scalar::with_url("/docs", api::doc::ApiDoc::openapi()))
}

fn cors_layer(origin: &str) -> CorsLayer {
    if origin.trim() == "*" {
        return CorsLayer::permissive();
    }
    match HeaderValue::from_str(origin.trim()) {
        Ok(value) => CorsLayer::permissive().allow_origin(AllowOrigin::exact(value)),
        Err(e) => {
            warn!(origin, error = %e, "invalid CORS_ORIGIN, allowing any origin");
            CorsLayer::permissive()
        }
    }
}

#[cfg(test)]
mod tests;
