use std::time::Duration;

use apiloom_core::{ApiSource, SourceKind};
use tracing::{debug, warn};

use crate::builtin::curated_entries;
use crate::error::SourceError;
use crate::raw::{parse_directory, RawEntry};

/// Fetches raw entries for an [`ApiSource`].
///
/// The body of a remote directory is streamed into a bounded buffer, parsed,
/// and dropped before returning; nothing of the response outlives the call.
#[derive(Clone)]
pub struct SourceConnector {
    client: reqwest::Client,
    max_payload_bytes: u64,
    timeout: Duration,
}

impl SourceConnector {
    pub fn new(max_payload_bytes: u64, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            max_payload_bytes,
            timeout,
        }
    }

    pub fn from_config(config: &apiloom_core::config::IngestConfig) -> Self {
        Self::new(config.max_payload_bytes, Duration::from_millis(config.fetch_timeout_ms))
    }

    /// Soft fetch: never fails, never returns an empty list.
    pub async fn fetch_raw(&self, source: &ApiSource) -> Vec<RawEntry> {
        self.fetch_raw_reporting(source).await.0
    }

    /// Soft fetch that also hands back the error that triggered a fallback,
    /// so callers can record it without failing the ingest.
    pub async fn fetch_raw_reporting(&self, source: &ApiSource) -> (Vec<RawEntry>, Option<SourceError>) {
        match self.fetch_raw_strict(source).await {
            Ok(entries) if !entries.is_empty() => (entries, None),
            Ok(_) => {
                warn!(source = %source.id, "directory returned no entries, using curated list");
                (curated_entries(), Some(SourceError::Malformed("directory returned no entries".into())))
            }
            Err(e) => {
                warn!(source = %source.id, error = %e, "directory fetch failed, using curated list");
                (curated_entries(), Some(e))
            }
        }
    }

    /// Strict fetch: surfaces every network, status, size, and parse error.
    pub async fn fetch_raw_strict(&self, source: &ApiSource) -> Result<Vec<RawEntry>, SourceError> {
        match &source.kind {
            SourceKind::Builtin => Ok(curated_entries()),
            SourceKind::RemoteJson { url } => {
                let limit_ms = self.timeout.as_millis() as u64;
                tokio::time::timeout(self.timeout, self.fetch_remote(url))
                    .await
                    .map_err(|_| SourceError::Timeout(limit_ms))?
            }
        }
    }

    async fn fetch_remote(&self, url: &str) -> Result<Vec<RawEntry>, SourceError> {
        debug!("Fetching directory {}", url);
        let mut response = self.client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceError::Status { status: status.as_u16() });
        }

        let limit = self.max_payload_bytes;
        if response.content_length().is_some_and(|len| len > limit) {
            return Err(SourceError::PayloadTooLarge { limit });
        }

        let mut body: Vec<u8> = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            if (body.len() + chunk.len()) as u64 > limit {
                return Err(SourceError::PayloadTooLarge { limit });
            }
            body.extend_from_slice(&chunk);
        }

        let entries = parse_directory(&body)?;
        debug!("Parsed {} entries ({} bytes) from {}", entries.len(), body.len(), url);
        Ok(entries)
    }
}
