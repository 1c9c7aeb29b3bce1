pub mod stats;
pub mod store;

pub use stats::CatalogStats;
pub use store::{CatalogStore, StoreOutcome};
