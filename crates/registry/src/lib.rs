//! Auto endpoints derived from the catalog, and their publication to an
//! external capability registry.
//!
//! - [`sync`]: the endpoint view over the catalog plus `sync_all`
//! - [`capability`]: manifest type and registry backends
//! - [`categories`]: per-category phrases and display fields, loaded once
//! - [`phrases`]: sample phrase generation

pub mod capability;
pub mod categories;
pub mod error;
pub mod phrases;
pub mod sync;

pub use capability::{
    CapabilityManifest, CapabilityRegistry, HttpCapabilityRegistry, InMemoryCapabilityRegistry,
};
pub use categories::{CategoryProfile, CategoryTable};
pub use error::RegistryError;
pub use phrases::{sample_phrases, MAX_SAMPLE_PHRASES};
pub use sync::{RegistrySync, SyncSummary};
