//! Periodic remote refresh.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::MissedTickBehavior;
use tracing::{info, warn};

use crate::startup;
use crate::state::AppState;

/// Refresh the remote directory every `interval`. The first refresh happens
/// one interval after start; `/init` covers the initial load.
pub async fn run_refresh_loop(state: Arc<AppState>, interval: Duration) {
    info!("refresh loop started (interval: {}s)", interval.as_secs());

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        ticker.tick().await;

        if state.ingestor.is_ingesting() {
            info!("refresh loop: ingestion already running, skipping tick");
            continue;
        }

        let summary = startup::refresh(&state).await;
        if !summary.success {
            warn!(errors = ?summary.result.errors, "refresh loop: remote refresh failed");
        }
    }
}

/// Spawn the refresh loop if the configured interval is non-zero.
pub fn spawn_refresh_loop(state: Arc<AppState>) -> Option<tokio::task::JoinHandle<()>> {
    let secs = state.config.ingest.refresh_interval_secs;
    if secs == 0 {
        return None;
    }
    Some(tokio::spawn(run_refresh_loop(state, Duration::from_secs(secs))))
}
