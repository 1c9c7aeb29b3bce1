use std::collections::BTreeMap;

use apiloom_core::{AuthMode, CatalogEntry, HealthStatus};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Aggregate counts over the catalog. Never cached.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogStats {
    pub total_apis: usize,
    pub total_endpoints: usize,
    /// Keyed by lowercased category so "Animals" and "animals" group together.
    pub by_category: BTreeMap<String, usize>,
    pub by_auth: BTreeMap<String, usize>,
    pub by_source: BTreeMap<String, usize>,
    pub healthy_apis: usize,
    pub no_auth_apis: usize,
    pub last_full_ingest: Option<DateTime<Utc>>,
    pub flow_count: usize,
    pub source_count: usize,
}

impl CatalogStats {
    pub fn compute<'a>(
        entries: impl Iterator<Item = &'a CatalogEntry>,
        flow_count: usize,
        source_count: usize,
        last_full_ingest: Option<DateTime<Utc>>,
    ) -> Self {
        let mut stats = Self {
            total_apis: 0,
            total_endpoints: 0,
            by_category: BTreeMap::new(),
            by_auth: BTreeMap::new(),
            by_source: BTreeMap::new(),
            healthy_apis: 0,
            no_auth_apis: 0,
            last_full_ingest,
            flow_count,
            source_count,
        };

        for entry in entries {
            stats.total_apis += 1;
            stats.total_endpoints += entry.endpoints.len();
            *stats.by_category.entry(entry.category.to_lowercase()).or_default() += 1;
            *stats.by_auth.entry(entry.auth.as_str().to_string()).or_default() += 1;
            *stats.by_source.entry(entry.source.clone()).or_default() += 1;
            if entry.health == HealthStatus::Healthy {
                stats.healthy_apis += 1;
            }
            if entry.auth == AuthMode::None {
                stats.no_auth_apis += 1;
            }
        }

        stats
    }
}
