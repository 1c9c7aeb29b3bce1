pub mod config;
pub mod error;
pub mod id;
pub mod model;

pub use config::Config;
pub use error::*;
pub use id::{endpoint_key, normalize_id, PUBLIC_KEY_PREFIX};
pub use model::*;
