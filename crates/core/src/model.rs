use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ApiloomError;

// ── Classification enums ──────────────────────────────────────

/// How an external API authenticates callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AuthMode {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "apiKey")]
    ApiKey,
    #[serde(rename = "oauth")]
    OAuth,
    #[serde(rename = "custom")]
    Custom,
}

impl AuthMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ApiKey => "apiKey",
            Self::OAuth => "oauth",
            Self::Custom => "custom",
        }
    }
}

/// Serialized as `"true"`, `"false"` or `"unknown"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CorsSupport {
    #[serde(rename = "true")]
    Yes,
    #[serde(rename = "false")]
    No,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Offline,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    #[default]
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HttpMethod {
    type Err = ApiloomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GET" => Ok(Self::Get),
            "POST" => Ok(Self::Post),
            "PUT" => Ok(Self::Put),
            "PATCH" => Ok(Self::Patch),
            "DELETE" => Ok(Self::Delete),
            other => Err(ApiloomError::InvalidMethod(other.to_string())),
        }
    }
}

// ── Catalog entries ───────────────────────────────────────────

/// Declared parameter of an endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParamSpec {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
}

impl ParamSpec {
    pub fn required(kind: &str, description: &str) -> Self {
        Self { kind: kind.to_string(), required: true, description: description.to_string() }
    }

    pub fn optional(kind: &str, description: &str) -> Self {
        Self { kind: kind.to_string(), required: false, description: description.to_string() }
    }
}

/// One callable operation of a catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndpointDef {
    pub name: String,
    /// Path template relative to the entry's base URL; may contain `{param}`.
    pub path: String,
    pub method: HttpMethod,
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, ParamSpec>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sample_response: Option<serde_json::Value>,
}

impl EndpointDef {
    /// Names of parameters declared as required.
    pub fn required_params(&self) -> Vec<&str> {
        self.parameters
            .iter()
            .flatten()
            .filter(|(_, spec)| spec.required)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}

/// Normalized description of one external API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogEntry {
    pub name: String,
    pub description: String,
    pub auth: AuthMode,
    pub https: bool,
    pub cors: CorsSupport,
    pub category: String,
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub docs_url: Option<String>,
    pub endpoints: Vec<EndpointDef>,
    pub source: String,
    pub quality_score: f64,
    pub last_checked: DateTime<Utc>,
    #[serde(default)]
    pub health: HealthStatus,
}

// ── Sources ───────────────────────────────────────────────────

/// Where a source's raw entries come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum SourceKind {
    /// A JSON directory file fetched over HTTP.
    RemoteJson { url: String },
    /// The curated list compiled into the binary.
    Builtin,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceStatus {
    Active,
    Error,
    Disabled,
}

/// A directory of APIs the ingestor pulls from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiSource {
    pub id: String,
    pub name: String,
    pub kind: SourceKind,
    pub format: String,
    pub fetch_interval_secs: u64,
    pub last_fetch: Option<DateTime<Utc>>,
    pub status: SourceStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ApiSource {
    pub fn builtin() -> Self {
        Self {
            id: "builtin".to_string(),
            name: "Built-in curated APIs".to_string(),
            kind: SourceKind::Builtin,
            format: "builtin".to_string(),
            fetch_interval_secs: 0,
            last_fetch: None,
            status: SourceStatus::Active,
            error: None,
        }
    }

    pub fn remote_json(id: &str, name: &str, url: &str, fetch_interval_secs: u64) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            kind: SourceKind::RemoteJson { url: url.to_string() },
            format: "json".to_string(),
            fetch_interval_secs,
            last_fetch: None,
            status: SourceStatus::Active,
            error: None,
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self.kind, SourceKind::RemoteJson { .. })
    }
}

// ── Flows ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowProvenance {
    Auto,
    Manual,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFlowStep {
    pub endpoint_key: String,
    pub description: String,
    #[serde(default)]
    pub optional: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<BTreeMap<String, String>>,
}

/// A named, ordered composition of auto endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoFlow {
    pub id: String,
    pub name: String,
    pub description: String,
    pub steps: Vec<AutoFlowStep>,
    pub categories: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub provenance: FlowProvenance,
}

// ── Derived endpoints ─────────────────────────────────────────

/// A callable unit derived from a catalog entry × endpoint definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AutoRegisteredEndpoint {
    pub key: String,
    pub api_name: String,
    pub endpoint_name: String,
    pub description: String,
    pub category: String,
    /// Base URL joined with the (unsubstituted) path template.
    pub url: String,
    pub method: HttpMethod,
    pub auth: AuthMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parameters: Option<BTreeMap<String, ParamSpec>>,
    pub sample_phrases: Vec<String>,
    pub quality_score: f64,
    pub health: HealthStatus,
}

// ── Ingestion ─────────────────────────────────────────────────

/// Outcome of ingesting one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestResult {
    pub source_id: String,
    pub success: bool,
    pub apis_found: usize,
    pub apis_added: usize,
    pub apis_updated: usize,
    pub apis_skipped: usize,
    pub errors: Vec<String>,
    pub duration_ms: u64,
}

impl IngestResult {
    pub fn failed(source_id: &str, error: impl Into<String>) -> Self {
        Self {
            source_id: source_id.to_string(),
            success: false,
            apis_found: 0,
            apis_added: 0,
            apis_updated: 0,
            apis_skipped: 0,
            errors: vec![error.into()],
            duration_ms: 0,
        }
    }
}
