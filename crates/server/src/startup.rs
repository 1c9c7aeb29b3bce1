//! Catalog bootstrap and remote refresh.
//!
//! `initialize` runs once per process: built-in ingest, flow generation and
//! registry sync. Later calls return the cached summary. `refresh` pulls the
//! remote directory and, when that succeeds, regenerates flows and resyncs.
//! `reset` clears the catalog under the same lock as `initialize`.

use std::time::Instant;

use apiloom_core::IngestResult;
use apiloom_ingest::QuickIngestSummary;
use apiloom_registry::SyncSummary;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};

use crate::state::AppState;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InitSummary {
    /// True when this call returned a summary cached by an earlier one.
    pub cached: bool,
    pub ingest: QuickIngestSummary,
    pub endpoints: usize,
    pub flows_generated: usize,
    pub registry: SyncSummary,
    pub initialized_at: DateTime<Utc>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshSummary {
    pub success: bool,
    /// APIs that were not in the catalog before this refresh.
    pub new_apis: usize,
    pub result: IngestResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flows_generated: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub registry: Option<SyncSummary>,
}

pub async fn initialize(state: &AppState) -> InitSummary {
    if let Some(summary) = cached(state).await {
        return summary;
    }

    let _serialized = state.init_lock.lock().await;
    // A concurrent caller may have finished while we waited.
    if let Some(summary) = cached(state).await {
        return summary;
    }

    let start = Instant::now();
    info!("initializing catalog");

    let ingest = state.ingestor.quick_ingest().await;
    let flows = state.composer.generate_auto_flows();
    let registry = state.registry.sync_all(state.capabilities.as_ref()).await;

    let summary = InitSummary {
        cached: false,
        ingest,
        endpoints: registry.total,
        flows_generated: flows.len(),
        registry,
        initialized_at: Utc::now(),
        duration_ms: start.elapsed().as_millis() as u64,
    };
    info!(
        apis = summary.ingest.total_apis,
        endpoints = summary.endpoints,
        flows = summary.flows_generated,
        duration_ms = summary.duration_ms,
        "catalog initialized"
    );

    *state.init_summary.write().await = Some(summary.clone());
    summary
}

/// Empty the catalog and forget the init summary so the next `initialize`
/// bootstraps again. Serialized with `initialize`. Returns the number of
/// APIs removed.
pub async fn reset(state: &AppState) -> usize {
    let _serialized = state.init_lock.lock().await;
    let removed = state.store.api_count();
    state.store.clear_catalog();
    *state.init_summary.write().await = None;
    removed
}

async fn cached(state: &AppState) -> Option<InitSummary> {
    state.init_summary.read().await.clone().map(|summary| InitSummary {
        cached: true,
        ..summary
    })
}

pub async fn refresh(state: &AppState) -> RefreshSummary {
    let result = state.ingestor.ingest_from_remote().await;
    if !result.success {
        warn!(errors = ?result.errors, "refresh failed");
        return RefreshSummary {
            success: false,
            new_apis: 0,
            result,
            flows_generated: None,
            registry: None,
        };
    }

    let flows = state.composer.generate_auto_flows();
    let registry = state.registry.sync_all(state.capabilities.as_ref()).await;
    info!(
        new_apis = result.apis_added,
        total = state.store.api_count(),
        flows = flows.len(),
        "refresh complete"
    );

    RefreshSummary {
        success: true,
        new_apis: result.apis_added,
        result,
        flows_generated: Some(flows.len()),
        registry: Some(registry),
    }
}
