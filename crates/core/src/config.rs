use std::env;

use serde::{Deserialize, Serialize};

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

fn env_opt(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.is_empty())
}

/// Read a profiled env var: tries {PROFILE}_{KEY} first, falls back to {KEY}.
fn profiled_env_opt(profile: &str, key: &str) -> Option<String> {
    if !profile.is_empty() {
        let prefixed = format!("{}_{}", profile, key);
        if let Some(v) = env_opt(&prefixed) {
            return Some(v);
        }
    }
    env_opt(key)
}

fn profiled_env_or(profile: &str, key: &str, default: &str) -> String {
    profiled_env_opt(profile, key).unwrap_or_else(|| default.to_string())
}

fn profiled_env_u16(profile: &str, key: &str, default: u16) -> u16 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_u64(profile: &str, key: &str, default: u64) -> u64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_f64(profile: &str, key: &str, default: f64) -> f64 {
    profiled_env_opt(profile, key)
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn profiled_env_bool(profile: &str, key: &str, default: bool) -> bool {
    match profiled_env_opt(profile, key).as_deref() {
        Some("1") | Some("true") | Some("yes") => true,
        Some("0") | Some("false") | Some("no") => false,
        _ => default,
    }
}

// ── Top-level config ──────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Active profile name (empty = default).
    pub profile: String,
    pub server: ServerConfig,
    pub ingest: IngestConfig,
    pub execution: ExecutionConfig,
    pub registry: RegistryConfig,
    pub web3: Web3Config,
}

impl Config {
    /// Build config from environment variables (call `load_dotenv()` first).
    /// Profile is read from `APILOOM_PROFILE`. When set (e.g. `PROD`),
    /// every key is first looked up as `{PROFILE}_{KEY}`, falling back to `{KEY}`.
    pub fn from_env() -> Self {
        let profile = env_or("APILOOM_PROFILE", "").to_uppercase();
        Self::for_profile(&profile)
    }

    /// Build config for a specific named profile (empty string = default).
    pub fn for_profile(profile: &str) -> Self {
        let p = profile.to_uppercase();
        let p = p.as_str();
        Self {
            profile: p.to_string(),
            server: ServerConfig::from_env_profiled(p),
            ingest: IngestConfig::from_env_profiled(p),
            execution: ExecutionConfig::from_env_profiled(p),
            registry: RegistryConfig::from_env_profiled(p),
            web3: Web3Config::from_env_profiled(p),
        }
    }

    pub fn profile_label(&self) -> &str {
        if self.profile.is_empty() { "default" } else { &self.profile }
    }

    /// Print a redacted summary for startup logs.
    pub fn log_summary(&self) {
        tracing::info!("Config loaded (profile: {}):", self.profile_label());
        tracing::info!("  server:     {}:{}", self.server.host, self.server.port);
        tracing::info!(
            "  ingest:     remote={}, min_quality={}, refresh={}s",
            self.ingest.remote_directory_url,
            self.ingest.min_quality,
            self.ingest.refresh_interval_secs
        );
        tracing::info!(
            "  execution:  timeout={}ms, flow_deadline={}ms",
            self.execution.request_timeout_ms,
            self.execution.flow_deadline_ms
        );
        tracing::info!(
            "  registry:   {}",
            self.registry.url.as_deref().unwrap_or("(in-memory)")
        );
        tracing::info!(
            "  web3:       moralis={}, alchemy={}, etherscan={}",
            self.web3.moralis_api_key.is_some(),
            self.web3.alchemy_api_key.is_some(),
            self.web3.etherscan_api_key.is_some()
        );
    }

    /// Return a redacted view safe for API responses (no secrets).
    pub fn redacted_summary(&self) -> serde_json::Value {
        serde_json::json!({
            "profile": self.profile_label(),
            "server": { "host": self.server.host, "port": self.server.port },
            "ingest": {
                "remote_directory_url": self.ingest.remote_directory_url,
                "min_quality": self.ingest.min_quality,
                "require_https": self.ingest.require_https,
                "strict_auth": self.ingest.strict_auth,
                "refresh_interval_secs": self.ingest.refresh_interval_secs,
            },
            "execution": {
                "request_timeout_ms": self.execution.request_timeout_ms,
                "flow_deadline_ms": self.execution.flow_deadline_ms,
            },
            "registry": { "remote": self.registry.url.is_some() },
            "web3": {
                "default_chain": self.web3.default_chain,
                "moralis": self.web3.moralis_api_key.is_some(),
                "alchemy": self.web3.alchemy_api_key.is_some(),
                "etherscan": self.web3.etherscan_api_key.is_some(),
            },
        })
    }
}

// ── Server ────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors_origin: String,
}

impl ServerConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            host: profiled_env_or(p, "HOST", "0.0.0.0"),
            port: profiled_env_u16(p, "PORT", 3001),
            cors_origin: profiled_env_or(p, "CORS_ORIGIN", "*"),
        }
    }
}

// ── Ingestion ─────────────────────────────────────────────────

pub const DEFAULT_REMOTE_DIRECTORY_URL: &str =
    "https://raw.githubusercontent.com/marcelscruz/public-apis/main/db/resources.json";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestConfig {
    pub remote_directory_url: String,
    pub min_quality: f64,
    pub require_https: bool,
    /// Auth-bearing entries must clear the stricter bar.
    pub strict_auth: bool,
    pub max_payload_bytes: u64,
    pub fetch_timeout_ms: u64,
    /// 0 disables the background refresh loop.
    pub refresh_interval_secs: u64,
}

impl IngestConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            remote_directory_url: profiled_env_or(p, "REMOTE_DIRECTORY_URL", DEFAULT_REMOTE_DIRECTORY_URL),
            min_quality: profiled_env_f64(p, "INGEST_MIN_QUALITY", 0.4),
            require_https: profiled_env_bool(p, "INGEST_REQUIRE_HTTPS", false),
            strict_auth: profiled_env_bool(p, "INGEST_STRICT_AUTH", true),
            max_payload_bytes: profiled_env_u64(p, "INGEST_MAX_PAYLOAD_BYTES", 8 * 1024 * 1024),
            fetch_timeout_ms: profiled_env_u64(p, "INGEST_FETCH_TIMEOUT_MS", 15_000),
            refresh_interval_secs: profiled_env_u64(p, "INGEST_REFRESH_INTERVAL_SECS", 0),
        }
    }
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            remote_directory_url: DEFAULT_REMOTE_DIRECTORY_URL.to_string(),
            min_quality: 0.4,
            require_https: false,
            strict_auth: true,
            max_payload_bytes: 8 * 1024 * 1024,
            fetch_timeout_ms: 15_000,
            refresh_interval_secs: 0,
        }
    }
}

// ── Execution ─────────────────────────────────────────────────

pub const DEFAULT_USER_AGENT: &str = "apiloom/0.1 (+meta-adapter)";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionConfig {
    pub request_timeout_ms: u64,
    /// Aggregate budget for one flow run, sequential or parallel.
    pub flow_deadline_ms: u64,
    pub user_agent: String,
}

impl ExecutionConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            request_timeout_ms: profiled_env_u64(p, "EXEC_TIMEOUT_MS", 10_000),
            flow_deadline_ms: profiled_env_u64(p, "FLOW_DEADLINE_MS", 30_000),
            user_agent: profiled_env_or(p, "EXEC_USER_AGENT", DEFAULT_USER_AGENT),
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            flow_deadline_ms: 30_000,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

// ── Capability registry ───────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Remote capability registry; in-memory registry when unset.
    pub url: Option<String>,
    /// Replacement for the embedded category table.
    pub categories_path: Option<String>,
}

impl RegistryConfig {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            url: profiled_env_opt(p, "CAPABILITY_REGISTRY_URL"),
            categories_path: profiled_env_opt(p, "REGISTRY_CATEGORIES_PATH"),
        }
    }
}

// ── Chain-data providers ──────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Web3Config {
    pub moralis_api_key: Option<String>,
    pub alchemy_api_key: Option<String>,
    pub etherscan_api_key: Option<String>,
    pub default_chain: String,
}

impl Web3Config {
    fn from_env_profiled(p: &str) -> Self {
        Self {
            moralis_api_key: profiled_env_opt(p, "MORALIS_API_KEY"),
            alchemy_api_key: profiled_env_opt(p, "ALCHEMY_API_KEY"),
            etherscan_api_key: profiled_env_opt(p, "ETHERSCAN_API_KEY"),
            default_chain: profiled_env_or(p, "WEB3_DEFAULT_CHAIN", "eth"),
        }
    }
}

impl Default for Web3Config {
    fn default() -> Self {
        Self {
            moralis_api_key: None,
            alchemy_api_key: None,
            etherscan_api_key: None,
            default_chain: "eth".to_string(),
        }
    }
}
