use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use apiloom_core::{
    normalize_id, ApiSource, AuthMode, AutoFlow, CatalogEntry, FlowProvenance, HealthStatus,
    SourceStatus,
};
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use tracing::{debug, info, warn};

use crate::stats::CatalogStats;

/// What `store_api` did with an incoming entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreOutcome {
    Inserted,
    Updated,
    /// An entry with the same id and an equal or newer `last_checked` exists.
    Unchanged,
}

/// In-memory registry of catalog entries, flows, and sources.
///
/// Created once at process start and shared as `Arc<CatalogStore>`.
/// Every mutation is a single write-locked map operation:
/// ```text
/// entries  normalized id → CatalogEntry   (overwrite only if newer)
/// flows    flow id       → AutoFlow       (auto flows fully replaced)
/// sources  source id     → ApiSource      (upsert)
/// ```
#[derive(Debug, Default)]
pub struct CatalogStore {
    entries: RwLock<BTreeMap<String, CatalogEntry>>,
    flows: RwLock<IndexMap<String, AutoFlow>>,
    sources: RwLock<IndexMap<String, ApiSource>>,
    last_full_ingest: RwLock<Option<DateTime<Utc>>>,
}

// Poisoning only means another thread panicked mid-write of a plain map;
// the map itself is still structurally valid.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(|e| e.into_inner())
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(|e| e.into_inner())
}

impl CatalogStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Entries ─────────────────────────────────────────────────

    /// Store an entry under its normalized id, keeping the freshest copy.
    pub fn store_api(&self, entry: CatalogEntry) -> StoreOutcome {
        let id = normalize_id(&entry.name);
        if id.is_empty() {
            warn!(name = %entry.name, "entry name normalizes to an empty id, not stored");
            return StoreOutcome::Unchanged;
        }

        let mut entries = write(&self.entries);
        match entries.get(&id) {
            Some(existing) if existing.last_checked >= entry.last_checked => StoreOutcome::Unchanged,
            Some(_) => {
                entries.insert(id, entry);
                StoreOutcome::Updated
            }
            None => {
                entries.insert(id, entry);
                StoreOutcome::Inserted
            }
        }
    }

    pub fn get_api(&self, id: &str) -> Option<CatalogEntry> {
        read(&self.entries).get(&normalize_id(id)).cloned()
    }

    pub fn get_all_apis(&self) -> Vec<CatalogEntry> {
        read(&self.entries).values().cloned().collect()
    }

    pub fn api_count(&self) -> usize {
        read(&self.entries).len()
    }

    pub fn by_category(&self, category: &str) -> Vec<CatalogEntry> {
        self.filtered(|e| e.category.eq_ignore_ascii_case(category.trim()))
    }

    pub fn by_source(&self, source_id: &str) -> Vec<CatalogEntry> {
        self.filtered(|e| e.source == source_id)
    }

    pub fn healthy_apis(&self) -> Vec<CatalogEntry> {
        self.filtered(|e| e.health == HealthStatus::Healthy)
    }

    pub fn no_auth_apis(&self) -> Vec<CatalogEntry> {
        self.filtered(|e| e.auth == AuthMode::None)
    }

    /// Case-insensitive substring search over name, description, category.
    pub fn search(&self, query: &str) -> Vec<CatalogEntry> {
        let q = query.trim().to_lowercase();
        if q.is_empty() {
            return self.get_all_apis();
        }
        self.filtered(|e| {
            e.name.to_lowercase().contains(&q)
                || e.description.to_lowercase().contains(&q)
                || e.category.to_lowercase().contains(&q)
        })
    }

    fn filtered(&self, pred: impl Fn(&CatalogEntry) -> bool) -> Vec<CatalogEntry> {
        read(&self.entries).values().filter(|e| pred(e)).cloned().collect()
    }

    /// Record a health probe. Goes through the same freshness guard as
    /// ingestion, so a probe older than the stored entry is ignored.
    pub fn update_health(&self, id: &str, health: HealthStatus, checked_at: DateTime<Utc>) -> StoreOutcome {
        let Some(mut entry) = self.get_api(id) else {
            return StoreOutcome::Unchanged;
        };
        entry.health = health;
        entry.last_checked = checked_at;
        self.store_api(entry)
    }

    /// Admin removal. Returns the removed entry.
    pub fn remove_api(&self, id: &str) -> Option<CatalogEntry> {
        let removed = write(&self.entries).remove(&normalize_id(id));
        if let Some(entry) = &removed {
            info!(api = %entry.name, "catalog entry removed");
        }
        removed
    }

    /// Admin clear of entries and flows. Sources stay registered.
    pub fn clear_catalog(&self) {
        let removed = {
            let mut entries = write(&self.entries);
            let n = entries.len();
            entries.clear();
            n
        };
        write(&self.flows).clear();
        *write(&self.last_full_ingest) = None;
        info!(removed, "catalog cleared");
    }

    // ── Flows ───────────────────────────────────────────────────

    pub fn store_flow(&self, flow: AutoFlow) {
        write(&self.flows).insert(flow.id.clone(), flow);
    }

    /// Replace every auto-provenance flow with `flows`. Manual flows survive.
    pub fn replace_auto_flows(&self, flows: Vec<AutoFlow>) {
        let mut map = write(&self.flows);
        map.retain(|_, f| f.provenance != FlowProvenance::Auto);
        for flow in flows {
            map.insert(flow.id.clone(), flow);
        }
        debug!(total = map.len(), "flows replaced");
    }

    pub fn get_flow(&self, id: &str) -> Option<AutoFlow> {
        read(&self.flows).get(id).cloned()
    }

    pub fn get_all_flows(&self) -> Vec<AutoFlow> {
        read(&self.flows).values().cloned().collect()
    }

    pub fn remove_flow(&self, id: &str) -> Option<AutoFlow> {
        write(&self.flows).shift_remove(id)
    }

    pub fn flow_count(&self) -> usize {
        read(&self.flows).len()
    }

    // ── Sources ─────────────────────────────────────────────────

    pub fn store_source(&self, source: ApiSource) {
        write(&self.sources).insert(source.id.clone(), source);
    }

    pub fn get_source(&self, id: &str) -> Option<ApiSource> {
        read(&self.sources).get(id).cloned()
    }

    pub fn get_all_sources(&self) -> Vec<ApiSource> {
        read(&self.sources).values().cloned().collect()
    }

    /// Record the outcome of a fetch against a registered source.
    pub fn update_source_status(&self, id: &str, status: SourceStatus, error: Option<String>) {
        if let Some(source) = write(&self.sources).get_mut(id) {
            source.status = status;
            source.error = error;
            source.last_fetch = Some(Utc::now());
        }
    }

    // ── Ingest bookkeeping & stats ──────────────────────────────

    pub fn set_last_full_ingest(&self, at: DateTime<Utc>) {
        *write(&self.last_full_ingest) = Some(at);
    }

    pub fn last_full_ingest(&self) -> Option<DateTime<Utc>> {
        *read(&self.last_full_ingest)
    }

    /// Aggregate statistics, recomputed from current state on every call.
    pub fn get_stats(&self) -> CatalogStats {
        let entries = read(&self.entries);
        CatalogStats::compute(
            entries.values(),
            self.flow_count(),
            read(&self.sources).len(),
            self.last_full_ingest(),
        )
    }
}
