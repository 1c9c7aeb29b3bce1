//! Ingestion pipeline: normalize → dedupe → quality filter → catalog store.
//!
//! - [`normalize`]: raw entry classification, scoring, dedupe, filtering
//! - [`curated`]: lookup tables for well-known API hosts and operations
//! - [`orchestrator`]: drives sources into the store, one ingest at a time
//! - [`health`]: probes catalog base URLs and records health status

pub mod curated;
pub mod health;
pub mod normalize;
pub mod orchestrator;

pub use health::{HealthChecker, HealthReport};
pub use normalize::{
    deduplicate_entries, filter_by_quality, normalize, normalize_batch, QualityThresholds,
};
pub use orchestrator::{Ingestor, QuickIngestSummary, BUILTIN_SOURCE_ID, REMOTE_SOURCE_ID};
