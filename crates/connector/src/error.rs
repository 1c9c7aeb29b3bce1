use thiserror::Error;

/// Failure reaching or parsing an API directory.
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("directory returned status {status}")]
    Status { status: u16 },
    #[error("payload exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },
    #[error("malformed directory payload: {0}")]
    Malformed(String),
    #[error("fetch timed out after {0}ms")]
    Timeout(u64),
}

impl From<serde_json::Error> for SourceError {
    fn from(e: serde_json::Error) -> Self {
        Self::Malformed(e.to_string())
    }
}
