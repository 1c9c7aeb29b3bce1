use std::sync::Arc;
use std::time::Duration;

use apiloom_catalog::CatalogStore;
use apiloom_connector::SourceConnector;
use apiloom_core::Config;
use apiloom_exec::{Executor, Web3Executor};
use apiloom_flow::FlowComposer;
use apiloom_ingest::{HealthChecker, Ingestor, QualityThresholds};
use apiloom_registry::{
    CapabilityRegistry, CategoryTable, HttpCapabilityRegistry, InMemoryCapabilityRegistry, RegistrySync,
};
use tokio::sync::{Mutex, RwLock};
use tracing::info;

use crate::startup::InitSummary;

/// Everything the handlers touch. One catalog store is shared by every
/// component; nothing here is a process global.
pub struct AppState {
    pub config: Config,
    pub store: Arc<CatalogStore>,
    pub ingestor: Ingestor,
    pub registry: Arc<RegistrySync>,
    pub composer: FlowComposer,
    pub executor: Executor,
    pub web3: Web3Executor,
    pub health: HealthChecker,
    pub capabilities: Arc<dyn CapabilityRegistry>,
    /// Cached result of the first successful `/init`.
    pub init_summary: RwLock<Option<InitSummary>>,
    /// Serializes concurrent `/init` calls.
    pub init_lock: Mutex<()>,
}

impl AppState {
    pub fn from_config(config: Config) -> anyhow::Result<Self> {
        let store = Arc::new(CatalogStore::new());

        let ingestor = Ingestor::new(
            store.clone(),
            SourceConnector::from_config(&config.ingest),
            QualityThresholds::from(&config.ingest),
        );
        ingestor.register_default_sources(
            &config.ingest.remote_directory_url,
            config.ingest.refresh_interval_secs,
        );

        let categories = CategoryTable::load(config.registry.categories_path.as_deref());
        let registry = Arc::new(RegistrySync::new(store.clone()).with_categories(categories));
        let composer = FlowComposer::new(store.clone(), registry.clone());
        let executor = Executor::new(store.clone(), registry.clone(), &config.execution)?;
        let web3 = Web3Executor::new(&config.web3, &config.execution)?;

        let request_timeout = Duration::from_millis(config.execution.request_timeout_ms);
        let health = HealthChecker::new(request_timeout, &config.execution.user_agent);

        let capabilities: Arc<dyn CapabilityRegistry> = match config.registry.url.as_deref() {
            Some(url) if !url.is_empty() => {
                info!(url, "publishing capabilities to remote registry");
                Arc::new(HttpCapabilityRegistry::new(url, request_timeout)?)
            }
            _ => Arc::new(InMemoryCapabilityRegistry::new()),
        };

        Ok(Self {
            config,
            store,
            ingestor,
            registry,
            composer,
            executor,
            web3,
            health,
            capabilities,
            init_summary: RwLock::new(None),
            init_lock: Mutex::new(()),
        })
    }

    pub async fn is_initialized(&self) -> bool {
        self.init_summary.read().await.is_some()
    }
}
