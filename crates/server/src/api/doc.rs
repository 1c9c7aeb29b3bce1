//! OpenAPI documentation aggregator.
//!
//! Collects all `#[utoipa::path]`-annotated handlers into a single OpenAPI
//! spec, served via Scalar UI at `/docs`.

use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "apiloom API",
        version = "0.1.0",
        description = "Public API catalog, auto endpoints, flows and chain-data execution.",
    ),
    tags(
        (name = "Health", description = "Process liveness"),
        (name = "Catalog", description = "Status, bootstrap, refresh, catalog browsing and admin"),
        (name = "Endpoints", description = "Auto endpoints derived from the catalog"),
        (name = "Flows", description = "Template and category flows"),
        (name = "Execution", description = "Endpoint and flow execution"),
        (name = "Web3", description = "Chain-data providers and wallet flows"),
    ),
    paths(
        // Health
        crate::api::health::health,
        // Catalog
        crate::api::catalog::status,
        crate::api::catalog::init,
        crate::api::catalog::refresh,
        crate::api::catalog::apis_list,
        crate::api::catalog::apis_search,
        crate::api::catalog::apis_by_category,
        crate::api::catalog::apis_delete,
        crate::api::catalog::apis_clear,
        crate::api::catalog::apis_health_check,
        crate::api::catalog::sources_list,
        // Endpoints
        crate::api::endpoints::endpoints_list,
        crate::api::endpoints::endpoints_search,
        crate::api::endpoints::endpoints_get,
        // Flows
        crate::api::flows::flows_list,
        crate::api::flows::flows_get,
        crate::api::flows::flows_category,
        // Execution
        crate::api::execute::execute,
        crate::api::execute::flow,
        crate::api::execute::demo,
        // Web3
        crate::api::web3::web3_status,
        crate::api::web3::web3_endpoints,
        crate::api::web3::web3_flows,
        crate::api::web3::web3_flows_get,
        crate::api::web3::web3_execute,
        crate::api::web3::web3_flow,
        crate::api::web3::web3_demo,
    ),
    components(schemas(
        crate::api::ErrorResponse,
        crate::api::health::HealthResponse,
        crate::api::flows::CategoryFlowRequest,
        crate::api::execute::ExecuteRequest,
        crate::api::execute::FlowRequest,
        crate::api::web3::Web3FlowRequest,
    ))
)]
pub struct ApiDoc;
