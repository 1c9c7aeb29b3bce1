//! Ingestion orchestrator: sources → normalize → dedupe → filter → store.
//!
//! Only one full ingestion ([`Ingestor::ingest_all`] or
//! [`Ingestor::ingest_from_remote`]) runs at a time. The in-progress flag is
//! claimed with compare-exchange before the first await and released by a
//! drop guard, so early returns and cancelled futures both clear it.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use apiloom_catalog::{CatalogStore, StoreOutcome};
use apiloom_connector::{RawEntry, SourceConnector};
use apiloom_core::{ApiSource, IngestResult, SourceStatus};
use chrono::Utc;
use futures::future::join_all;
use serde::Serialize;
use tracing::{info, warn};

use crate::normalize::{deduplicate_entries, filter_by_quality, normalize_batch, QualityThresholds};

pub const BUILTIN_SOURCE_ID: &str = "builtin";
pub const REMOTE_SOURCE_ID: &str = "public-apis";

const ALREADY_RUNNING: &str = "ingestion already in progress";

/// Result of the startup ingest of the built-in list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QuickIngestSummary {
    pub apis_added: usize,
    pub apis_updated: usize,
    pub apis_skipped: usize,
    pub total_apis: usize,
    pub duration_ms: u64,
}

pub struct Ingestor {
    store: Arc<CatalogStore>,
    connector: SourceConnector,
    thresholds: QualityThresholds,
    in_progress: AtomicBool,
}

struct InProgress<'a>(&'a AtomicBool);

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Ingestor {
    pub fn new(store: Arc<CatalogStore>, connector: SourceConnector, thresholds: QualityThresholds) -> Self {
        Self {
            store,
            connector,
            thresholds,
            in_progress: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn is_ingesting(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    fn claim(&self) -> Option<InProgress<'_>> {
        self.in_progress
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InProgress(&self.in_progress))
    }

    /// Register the built-in list and the remote directory. Sources that are
    /// already registered keep their status.
    pub fn register_default_sources(&self, remote_url: &str, fetch_interval_secs: u64) {
        if self.store.get_source(BUILTIN_SOURCE_ID).is_none() {
            self.store.store_source(ApiSource::builtin());
        }
        if self.store.get_source(REMOTE_SOURCE_ID).is_none() {
            self.store.store_source(ApiSource::remote_json(
                REMOTE_SOURCE_ID,
                "public-apis directory",
                remote_url,
                fetch_interval_secs,
            ));
        }
    }

    /// Ingest every non-disabled source concurrently.
    pub async fn ingest_all(&self) -> Vec<IngestResult> {
        let Some(_guard) = self.claim() else {
            warn!("ingest_all rejected: another ingestion is running");
            return vec![IngestResult::failed("all", ALREADY_RUNNING)];
        };

        let sources: Vec<ApiSource> = self
            .store
            .get_all_sources()
            .into_iter()
            .filter(|s| s.status != SourceStatus::Disabled)
            .collect();
        info!(sources = sources.len(), "full ingestion started");

        let results = join_all(sources.iter().map(|s| self.ingest_from_source(s))).await;
        self.store.set_last_full_ingest(Utc::now());

        let added: usize = results.iter().map(|r| r.apis_added).sum();
        let failed = results.iter().filter(|r| !r.success).count();
        info!(added, failed, total = self.store.api_count(), "full ingestion finished");
        results
    }

    /// Ingest the built-in list only. No network.
    pub async fn quick_ingest(&self) -> QuickIngestSummary {
        let source = self
            .store
            .get_source(BUILTIN_SOURCE_ID)
            .unwrap_or_else(ApiSource::builtin);
        let result = self.ingest_from_source(&source).await;
        QuickIngestSummary {
            apis_added: result.apis_added,
            apis_updated: result.apis_updated,
            apis_skipped: result.apis_skipped,
            total_apis: self.store.api_count(),
            duration_ms: result.duration_ms,
        }
    }

    /// Soft ingest of one source. A failed remote fetch falls back to the
    /// built-in list; the fetch error is recorded on the source and in
    /// `errors` but the result still succeeds.
    pub async fn ingest_from_source(&self, source: &ApiSource) -> IngestResult {
        let start = Instant::now();
        let (raws, fetch_error) = self.connector.fetch_raw_reporting(source).await;

        let mut errors = Vec::new();
        match fetch_error {
            Some(e) => {
                let msg = format!("fetch failed, used built-in list: {e}");
                self.store.update_source_status(&source.id, SourceStatus::Error, Some(msg.clone()));
                errors.push(msg);
            }
            None => self.store.update_source_status(&source.id, SourceStatus::Active, None),
        }

        let mut result = self.ingest_raws(&source.id, &raws, start);
        result.errors.extend(errors);
        result
    }

    /// Strict ingest of the registered remote directory. Fetch errors fail
    /// the result and mark the source as errored.
    pub async fn ingest_from_remote(&self) -> IngestResult {
        let Some(_guard) = self.claim() else {
            return IngestResult::failed(REMOTE_SOURCE_ID, ALREADY_RUNNING);
        };

        let Some(source) = self
            .store
            .get_all_sources()
            .into_iter()
            .find(|s| s.is_remote() && s.status != SourceStatus::Disabled)
        else {
            return IngestResult::failed(REMOTE_SOURCE_ID, "no remote source registered");
        };

        let start = Instant::now();
        match self.connector.fetch_raw_strict(&source).await {
            Ok(raws) => {
                self.store.update_source_status(&source.id, SourceStatus::Active, None);
                self.ingest_raws(&source.id, &raws, start)
            }
            Err(e) => {
                warn!(source = %source.id, error = %e, "remote refresh failed");
                self.store
                    .update_source_status(&source.id, SourceStatus::Error, Some(e.to_string()));
                IngestResult {
                    duration_ms: start.elapsed().as_millis() as u64,
                    ..IngestResult::failed(&source.id, e.to_string())
                }
            }
        }
    }

    fn ingest_raws(&self, source_id: &str, raws: &[RawEntry], start: Instant) -> IngestResult {
        let (normalized, rejected) = normalize_batch(raws, source_id);
        let normalized_count = normalized.len();
        let kept = filter_by_quality(deduplicate_entries(normalized), &self.thresholds);
        let mut skipped = rejected + (normalized_count - kept.len());

        let mut added = 0;
        let mut updated = 0;
        for mut entry in kept {
            if let Some(existing) = self.store.get_api(&entry.name) {
                entry.health = existing.health;
            }
            match self.store.store_api(entry) {
                StoreOutcome::Inserted => added += 1,
                StoreOutcome::Updated => updated += 1,
                StoreOutcome::Unchanged => skipped += 1,
            }
        }

        let duration_ms = start.elapsed().as_millis() as u64;
        info!(
            source = source_id,
            found = raws.len(),
            added,
            updated,
            skipped,
            duration_ms,
            "source ingested"
        );

        IngestResult {
            source_id: source_id.to_string(),
            success: true,
            apis_found: raws.len(),
            apis_added: added,
            apis_updated: updated,
            apis_skipped: skipped,
            errors: Vec::new(),
            duration_ms,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use apiloom_connector::curated_entries;
    use apiloom_core::{AuthMode, HealthStatus};
    use axum::http::StatusCode;
    use axum::routing::get;
    use axum::Router;

    const DIRECTORY: &str = r#"{"count":3,"entries":[
        {"API":"Kanye.rest","Description":"Random Kanye West quotes","Auth":"","HTTPS":true,"Cors":"yes","Link":"https://kanye.rest","Category":"Personality"},
        {"API":"Brand New API","Description":"Something nobody has seen","Auth":"","HTTPS":true,"Cors":"unknown","Link":"https://brand-new.example.com/docs","Category":"Testing"},
        {"API":"Locked","Description":"Needs a key","Auth":"apiKey","HTTPS":false,"Cors":"no","Link":"http://locked.example.com","Category":"Testing"}
    ]}"#;

    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{addr}")
    }

    fn ingestor() -> Ingestor {
        Ingestor::new(
            Arc::new(CatalogStore::new()),
            SourceConnector::new(1024 * 1024, Duration::from_secs(5)),
            QualityThresholds::default(),
        )
    }

    #[tokio::test]
    async fn quick_ingest_loads_builtin_without_network() {
        let ingestor = ingestor();
        let summary = ingestor.quick_ingest().await;

        assert!(summary.apis_added > 20);
        assert_eq!(summary.total_apis, ingestor.store().api_count());
        assert_eq!(summary.apis_added + summary.apis_skipped, curated_entries().len());

        // http-only keyed APIs miss the strict auth bar
        assert!(ingestor.store().get_api("Weatherstack").is_none());
        assert!(ingestor.store().get_api("OpenWeatherMap").is_some());
        let dog = ingestor.store().get_api("dog ceo").unwrap();
        assert_eq!(dog.auth, AuthMode::None);
        assert_eq!(dog.base_url, "https://dog.ceo/api");
    }

    #[tokio::test]
    async fn ingest_all_covers_every_source_and_stamps_time() {
        let base = serve(Router::new().route("/dir.json", get(|| async { DIRECTORY }))).await;
        let ingestor = ingestor();
        ingestor.register_default_sources(&format!("{base}/dir.json"), 0);

        let results = ingestor.ingest_all().await;
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.success));
        assert!(ingestor.store().last_full_ingest().is_some());
        assert!(ingestor.store().get_api("brand_new_api").is_some());

        let remote = results.iter().find(|r| r.source_id == REMOTE_SOURCE_ID).unwrap();
        assert_eq!(remote.apis_found, 3);
        // "Locked" scores 0.5 and carries auth
        assert!(remote.apis_skipped >= 1);
        assert!(!ingestor.is_ingesting());
    }

    #[tokio::test]
    async fn overlapping_full_ingest_is_rejected() {
        let slow = Router::new().route(
            "/dir.json",
            get(|| async {
                tokio::time::sleep(Duration::from_millis(300)).await;
                DIRECTORY
            }),
        );
        let base = serve(slow).await;
        let ingestor = Arc::new(ingestor());
        ingestor.register_default_sources(&format!("{base}/dir.json"), 0);

        let first = {
            let ingestor = ingestor.clone();
            tokio::spawn(async move { ingestor.ingest_all().await })
        };
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(ingestor.is_ingesting());

        let second = ingestor.ingest_all().await;
        assert_eq!(second.len(), 1);
        assert!(!second[0].success);
        assert!(second[0].errors[0].contains("already in progress"));

        let refresh = ingestor.ingest_from_remote().await;
        assert!(!refresh.success);

        let first = first.await.unwrap();
        assert_eq!(first.len(), 2);
        assert!(!ingestor.is_ingesting());
    }

    #[tokio::test]
    async fn remote_refresh_surfaces_fetch_errors() {
        let base = serve(Router::new().route(
            "/dir.json",
            get(|| async { (StatusCode::BAD_GATEWAY, "upstream down") }),
        ))
        .await;
        let ingestor = ingestor();
        ingestor.register_default_sources(&format!("{base}/dir.json"), 0);

        let result = ingestor.ingest_from_remote().await;
        assert!(!result.success);
        assert!(!result.errors.is_empty());
        assert_eq!(ingestor.store().api_count(), 0);

        let source = ingestor.store().get_source(REMOTE_SOURCE_ID).unwrap();
        assert_eq!(source.status, SourceStatus::Error);
        assert!(source.error.is_some());
        assert!(source.last_fetch.is_some());
    }

    #[tokio::test]
    async fn soft_ingest_marks_source_but_succeeds() {
        let ingestor = ingestor();
        ingestor.register_default_sources("http://127.0.0.1:1/unreachable.json", 0);
        let source = ingestor.store().get_source(REMOTE_SOURCE_ID).unwrap();

        let result = ingestor.ingest_from_source(&source).await;
        assert!(result.success);
        assert_eq!(result.apis_found, curated_entries().len());
        assert_eq!(result.errors.len(), 1);
        assert_eq!(ingestor.store().get_source(REMOTE_SOURCE_ID).unwrap().status, SourceStatus::Error);
    }

    #[tokio::test]
    async fn reingest_keeps_recorded_health() {
        let ingestor = ingestor();
        ingestor.quick_ingest().await;
        ingestor
            .store()
            .update_health("Dog CEO", HealthStatus::Healthy, Utc::now() + chrono::Duration::milliseconds(1));
        tokio::time::sleep(Duration::from_millis(5)).await;

        ingestor.quick_ingest().await;
        assert_eq!(ingestor.store().get_api("Dog CEO").unwrap().health, HealthStatus::Healthy);
    }

    #[tokio::test]
    async fn remote_refresh_without_remote_source_fails() {
        let ingestor = ingestor();
        let result = ingestor.ingest_from_remote().await;
        assert!(!result.success);
        assert!(result.errors[0].contains("no remote source"));
    }
}
