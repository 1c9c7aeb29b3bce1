use std::sync::Arc;
use std::time::{Duration, Instant};

use apiloom_catalog::CatalogStore;
use apiloom_core::{normalize_id, HealthStatus};
use chrono::Utc;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use tracing::{debug, info};

const DEFAULT_CONCURRENCY: usize = 8;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub checked: usize,
    pub healthy: usize,
    pub degraded: usize,
    pub offline: usize,
    pub duration_ms: u64,
}

/// Probes catalog base URLs and writes the result back to the store.
///
/// 2xx/3xx → healthy, 4xx/5xx → degraded, transport error or timeout → offline.
pub struct HealthChecker {
    client: reqwest::Client,
    timeout: Duration,
    concurrency: usize,
}

impl HealthChecker {
    pub fn new(timeout: Duration, user_agent: &str) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .unwrap_or_default();
        Self {
            client,
            timeout,
            concurrency: DEFAULT_CONCURRENCY,
        }
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub async fn probe(&self, url: &str) -> HealthStatus {
        let request = self.client.get(url).send();
        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(response)) => {
                let status = response.status();
                if status.is_success() || status.is_redirection() {
                    HealthStatus::Healthy
                } else {
                    HealthStatus::Degraded
                }
            }
            Ok(Err(e)) => {
                debug!(url, error = %e, "health probe failed");
                HealthStatus::Offline
            }
            Err(_) => HealthStatus::Offline,
        }
    }

    pub async fn check_all(&self, store: &Arc<CatalogStore>) -> HealthReport {
        let start = Instant::now();
        let targets: Vec<(String, String)> = store
            .get_all_apis()
            .into_iter()
            .map(|e| (normalize_id(&e.name), e.base_url))
            .collect();

        let probed: Vec<(String, HealthStatus)> = stream::iter(targets)
            .map(|(id, url)| async move {
                let status = self.probe(&url).await;
                (id, status)
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let mut report = HealthReport::default();
        let checked_at = Utc::now();
        for (id, status) in probed {
            report.checked += 1;
            match status {
                HealthStatus::Healthy => report.healthy += 1,
                HealthStatus::Degraded => report.degraded += 1,
                _ => report.offline += 1,
            }
            store.update_health(&id, status, checked_at);
        }
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            checked = report.checked,
            healthy = report.healthy,
            degraded = report.degraded,
            offline = report.offline,
            "health check finished"
        );
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use apiloom_core::{AuthMode, CatalogEntry, CorsSupport};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn entry(name: &str, base_url: String) -> CatalogEntry {
        CatalogEntry {
            name: name.into(),
            description: String::new(),
            auth: AuthMode::None,
            https: false,
            cors: CorsSupport::Unknown,
            category: "Testing".into(),
            base_url,
            docs_url: None,
            endpoints: Vec::new(),
            source: "test".into(),
            quality_score: 0.65,
            last_checked: Utc::now() - chrono::Duration::minutes(5),
            health: HealthStatus::Unknown,
        }
    }

    #[tokio::test]
    async fn classifies_probe_outcomes() {
        let base = serve(
            Router::new()
                .route("/up", get(|| async { "ok" }))
                .route("/broken", get(|| async { (StatusCode::SERVICE_UNAVAILABLE, "down") })),
        )
        .await;

        let store = Arc::new(CatalogStore::new());
        store.store_api(entry("Up", format!("{base}/up")));
        store.store_api(entry("Broken", format!("{base}/broken")));
        store.store_api(entry("Gone", "http://127.0.0.1:1".into()));

        let report = HealthChecker::new(Duration::from_secs(2), "apiloom-test")
            .check_all(&store)
            .await;

        assert_eq!(report.checked, 3);
        assert_eq!((report.healthy, report.degraded, report.offline), (1, 1, 1));
        assert_eq!(store.get_api("up").unwrap().health, HealthStatus::Healthy);
        assert_eq!(store.get_api("broken").unwrap().health, HealthStatus::Degraded);
        assert_eq!(store.get_api("gone").unwrap().health, HealthStatus::Offline);
        assert_eq!(store.get_stats().healthy_apis, 1);
    }

    #[tokio::test]
    async fn slow_upstream_counts_as_offline() {
        let base = serve(Router::new().route(
            "/slow",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(500)).await;
                "late"
            }),
        ))
        .await;

        let checker = HealthChecker::new(Duration::from_millis(50), "apiloom-test");
        assert_eq!(checker.probe(&format!("{base}/slow")).await, HealthStatus::Offline);
    }
}
