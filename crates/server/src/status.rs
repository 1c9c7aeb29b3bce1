//! Read-only operational view across the catalog, ingestor and executors.

use apiloom_catalog::CatalogStats;
use apiloom_core::{ApiSource, SourceStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSummary {
    pub id: String,
    pub name: String,
    pub status: SourceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub last_fetch: Option<DateTime<Utc>>,
}

impl From<ApiSource> for SourceSummary {
    fn from(source: ApiSource) -> Self {
        Self {
            id: source.id,
            name: source.name,
            status: source.status,
            error: source.error,
            last_fetch: source.last_fetch,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusReport {
    pub initialized: bool,
    pub ingesting: bool,
    pub stats: CatalogStats,
    pub endpoint_count: usize,
    pub flow_count: usize,
    pub web3_flow_count: usize,
    pub sources: Vec<SourceSummary>,
    pub capability_registry: String,
    pub config: serde_json::Value,
}

pub async fn collect(state: &AppState) -> StatusReport {
    let stats = state.store.get_stats();
    StatusReport {
        initialized: state.is_initialized().await,
        ingesting: state.ingestor.is_ingesting(),
        endpoint_count: stats.total_endpoints,
        flow_count: stats.flow_count,
        web3_flow_count: state.web3.flows().len(),
        stats,
        sources: state.store.get_all_sources().into_iter().map(SourceSummary::from).collect(),
        capability_registry: state.capabilities.name().to_string(),
        config: state.config.redacted_summary(),
    }
}
