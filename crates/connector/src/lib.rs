//! Source connectors: turn heterogeneous API directories into a uniform
//! sequence of [`RawEntry`] values.
//!
//! - [`raw`]: field-casing normalization and payload parsing
//! - [`builtin`]: the curated list compiled into the binary
//! - [`fetch`]: HTTP fetching with soft (fallback) and strict modes

pub mod builtin;
pub mod error;
pub mod fetch;
pub mod raw;

pub use builtin::curated_entries;
pub use error::SourceError;
pub use fetch::SourceConnector;
pub use raw::{parse_directory, RawEntry};
