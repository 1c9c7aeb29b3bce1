use std::fmt::Write as _;
use std::sync::Arc;

use apiloom_catalog::CatalogStore;
use apiloom_core::{
    endpoint_key, normalize_id, AutoRegisteredEndpoint, CatalogEntry, EndpointDef, PUBLIC_KEY_PREFIX,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::capability::{CapabilityManifest, CapabilityRegistry};
use crate::categories::CategoryTable;
use crate::phrases::sample_phrases;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncSummary {
    pub total: usize,
    pub registered: usize,
    pub failed: usize,
    pub errors: Vec<String>,
}

/// Read-only endpoint view over the catalog.
///
/// Nothing is cached: every call derives endpoints from the current
/// catalog state, so removals and refreshes are visible immediately.
pub struct RegistrySync {
    store: Arc<CatalogStore>,
    categories: Arc<CategoryTable>,
}

impl RegistrySync {
    pub fn new(store: Arc<CatalogStore>) -> Self {
        Self {
            store,
            categories: CategoryTable::builtin(),
        }
    }

    pub fn with_categories(mut self, categories: Arc<CategoryTable>) -> Self {
        self.categories = categories;
        self
    }

    pub fn store(&self) -> &Arc<CatalogStore> {
        &self.store
    }

    pub fn categories(&self) -> &CategoryTable {
        &self.categories
    }

    fn derive(&self, entry: &CatalogEntry, endpoint: &EndpointDef) -> AutoRegisteredEndpoint {
        AutoRegisteredEndpoint {
            key: endpoint_key(&entry.name, &endpoint.name),
            api_name: entry.name.clone(),
            endpoint_name: endpoint.name.clone(),
            description: endpoint.description.clone(),
            category: entry.category.clone(),
            url: join_url(&entry.base_url, &endpoint.path),
            method: endpoint.method,
            auth: entry.auth,
            parameters: endpoint.parameters.clone(),
            sample_phrases: sample_phrases(&entry.name, &endpoint.name, &entry.category, &self.categories),
            quality_score: entry.quality_score,
            health: entry.health,
        }
    }

    /// Every entry × endpoint, sorted by key.
    pub fn all_auto_endpoints(&self) -> Vec<AutoRegisteredEndpoint> {
        let mut all: Vec<AutoRegisteredEndpoint> = self
            .store
            .get_all_apis()
            .iter()
            .flat_map(|entry| entry.endpoints.iter().map(move |ep| (entry, ep)))
            .map(|(entry, ep)| self.derive(entry, ep))
            .collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    pub fn endpoint(&self, key: &str) -> Option<AutoRegisteredEndpoint> {
        let mut parts = key.split('.');
        let (Some(prefix), Some(api_id), Some(ep_id), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };
        if prefix != PUBLIC_KEY_PREFIX {
            return None;
        }
        let entry = self.store.get_api(api_id)?;
        let endpoint = entry.endpoints.iter().find(|ep| normalize_id(&ep.name) == ep_id)?;
        Some(self.derive(&entry, endpoint))
    }

    /// Case-insensitive match over key, API name, description, category and
    /// sample phrases. An empty query returns everything.
    pub fn search(&self, query: &str) -> Vec<AutoRegisteredEndpoint> {
        let q = query.trim().to_lowercase();
        let all = self.all_auto_endpoints();
        if q.is_empty() {
            return all;
        }
        all.into_iter()
            .filter(|ep| {
                ep.key.contains(&q)
                    || ep.api_name.to_lowercase().contains(&q)
                    || ep.description.to_lowercase().contains(&q)
                    || ep.category.to_lowercase().contains(&q)
                    || ep.sample_phrases.iter().any(|p| p.to_lowercase().contains(&q))
            })
            .collect()
    }

    pub fn by_category(&self, category: &str) -> Vec<AutoRegisteredEndpoint> {
        self.all_auto_endpoints()
            .into_iter()
            .filter(|ep| ep.category.eq_ignore_ascii_case(category))
            .collect()
    }

    /// Human-readable description of one endpoint.
    pub fn describe_endpoint(&self, key: &str) -> Option<String> {
        let ep = self.endpoint(key)?;
        let mut out = String::new();
        let _ = writeln!(out, "{} / {} ({})", ep.api_name, ep.endpoint_name, ep.key);
        if !ep.description.is_empty() {
            let _ = writeln!(out, "{}", ep.description);
        }
        let _ = writeln!(out, "{} {}", ep.method, ep.url);
        let _ = writeln!(out, "category: {}, auth: {}, quality: {:.2}", ep.category, ep.auth.as_str(), ep.quality_score);
        if let Some(params) = ep.parameters.as_ref().filter(|p| !p.is_empty()) {
            let _ = writeln!(out, "parameters:");
            for (name, spec) in params {
                let req = if spec.required { "required" } else { "optional" };
                let _ = writeln!(out, "  - {name} ({}, {req}): {}", spec.kind, spec.description);
            }
        }
        if !ep.sample_phrases.is_empty() {
            let _ = writeln!(out, "try: {}", ep.sample_phrases.join(" | "));
        }
        Some(out.trim_end().to_string())
    }

    /// Publish every auto endpoint. Individual failures are collected, not
    /// propagated.
    pub async fn sync_all(&self, registry: &dyn CapabilityRegistry) -> SyncSummary {
        let endpoints = self.all_auto_endpoints();
        let mut summary = SyncSummary {
            total: endpoints.len(),
            ..Default::default()
        };

        for ep in &endpoints {
            let display = self.categories.display_fields(&ep.category).to_vec();
            let manifest = CapabilityManifest::from_endpoint(ep, display);
            match registry.register(manifest).await {
                Ok(()) => summary.registered += 1,
                Err(e) => {
                    warn!(key = %ep.key, error = %e, "capability registration failed");
                    summary.failed += 1;
                    summary.errors.push(format!("{}: {e}", ep.key));
                }
            }
        }

        info!(
            registry = registry.name(),
            total = summary.total,
            registered = summary.registered,
            failed = summary.failed,
            "capability registry synced"
        );
        summary
    }
}

fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{base}{path}")
    } else {
        format!("{base}/{path}")
    }
}
