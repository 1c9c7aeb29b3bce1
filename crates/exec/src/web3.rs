//! Chain-data provider extension.
//!
//! A fixed table of operations keyed `web3.<provider>.<operation>`, each
//! shaped the way its provider expects:
//!
//! | provider  | credential              | request shape                         |
//! |-----------|-------------------------|---------------------------------------|
//! | moralis   | `X-API-Key` header      | REST GET                              |
//! | alchemy   | key in the URL path     | JSON-RPC POST, NFT calls as REST GET  |
//! | etherscan | `apikey` query argument | REST GET with `module`/`action`       |
//!
//! A provider without a configured key yields a `missingCredential` result,
//! so flows that mix providers still report the steps that worked.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use apiloom_core::config::{ExecutionConfig, Web3Config};
use apiloom_core::{AutoFlow, AutoFlowStep, FlowProvenance, HttpMethod};
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::engine::elapsed_ms;
use crate::error::ExecutionError;
use crate::http::{build_client, send, Reply};
use crate::params::{substitute_path, Params, ParamsByStep, ALL_STEPS};
use crate::result::{ExecutionResult, FlowExecutionResult};
use crate::runner::run_flow;

pub const WEB3_KEY_PREFIX: &str = "web3";

/// Address used by the demo route when the caller gives none.
pub const DEMO_ADDRESS: &str = "0xd8dA6BF26964aF9D7eEd9e03E53415D37aA96045";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Web3Provider {
    Moralis,
    Alchemy,
    Etherscan,
}

impl Web3Provider {
    pub const ALL: [Web3Provider; 3] = [Self::Moralis, Self::Alchemy, Self::Etherscan];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Moralis => "moralis",
            Self::Alchemy => "alchemy",
            Self::Etherscan => "etherscan",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Moralis => "Moralis",
            Self::Alchemy => "Alchemy",
            Self::Etherscan => "Etherscan",
        }
    }

    pub fn env_var(&self) -> &'static str {
        match self {
            Self::Moralis => "MORALIS_API_KEY",
            Self::Alchemy => "ALCHEMY_API_KEY",
            Self::Etherscan => "ETHERSCAN_API_KEY",
        }
    }

    /// Alchemy's base holds a `{network}` placeholder.
    fn default_base(&self) -> &'static str {
        match self {
            Self::Moralis => "https://deep-index.moralis.io/api/v2.2",
            Self::Alchemy => "https://{network}.g.alchemy.com",
            Self::Etherscan => "https://api.etherscan.io/v2/api",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for Web3Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ── Operation table ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
enum Call {
    /// GET `{base}{path}`; `{address}`, `{chain}`, `{chainid}` and `{key}`
    /// are filled in path and query values.
    Get {
        path: &'static str,
        query: &'static [(&'static str, &'static str)],
    },
    /// JSON-RPC POST to `{base}/v2/{key}`.
    Rpc { method: &'static str, params: RpcParams },
}

#[derive(Debug, Clone, Copy)]
enum RpcParams {
    AddressAtLatest,
    Erc20Balances,
    IncomingTransfers,
}

#[derive(Debug, Clone, Copy)]
struct Operation {
    provider: Web3Provider,
    name: &'static str,
    description: &'static str,
    call: Call,
}

impl Operation {
    fn key(&self) -> String {
        format!("{WEB3_KEY_PREFIX}.{}.{}", self.provider, self.name)
    }

    fn requires_address(&self) -> bool {
        match self.call {
            Call::Rpc { .. } => true,
            Call::Get { path, query } => {
                path.contains("{address}") || query.iter().any(|(_, v)| v.contains("{address}"))
            }
        }
    }
}

const fn get(
    provider: Web3Provider,
    name: &'static str,
    description: &'static str,
    path: &'static str,
    query: &'static [(&'static str, &'static str)],
) -> Operation {
    Operation { provider, name, description, call: Call::Get { path, query } }
}

const fn rpc(name: &'static str, description: &'static str, method: &'static str, params: RpcParams) -> Operation {
    Operation {
        provider: Web3Provider::Alchemy,
        name,
        description,
        call: Call::Rpc { method, params },
    }
}

use Web3Provider::{Alchemy, Etherscan, Moralis};

const OPERATIONS: &[Operation] = &[
    get(Moralis, "wallet_balance", "Native token balance of a wallet", "/{address}/balance", &[("chain", "{chain}")]),
    get(Moralis, "wallet_tokens", "ERC-20 balances of a wallet", "/{address}/erc20", &[("chain", "{chain}")]),
    get(Moralis, "wallet_nfts", "NFTs held by a wallet", "/{address}/nft", &[("chain", "{chain}"), ("format", "decimal")]),
    get(Moralis, "wallet_transactions", "Native transactions of a wallet", "/{address}", &[("chain", "{chain}")]),
    rpc("get_balance", "Native balance via eth_getBalance", "eth_getBalance", RpcParams::AddressAtLatest),
    rpc("token_balances", "ERC-20 balances via alchemy_getTokenBalances", "alchemy_getTokenBalances", RpcParams::Erc20Balances),
    rpc("asset_transfers", "Incoming transfers via alchemy_getAssetTransfers", "alchemy_getAssetTransfers", RpcParams::IncomingTransfers),
    get(Alchemy, "nfts", "NFTs owned by an address", "/nft/v3/{key}/getNFTsForOwner", &[("owner", "{address}"), ("withMetadata", "false")]),
    get(Etherscan, "balance", "Native balance", "", &[("chainid", "{chainid}"), ("module", "account"), ("action", "balance"), ("address", "{address}"), ("tag", "latest")]),
    get(Etherscan, "transactions", "Recent normal transactions", "", &[("chainid", "{chainid}"), ("module", "account"), ("action", "txlist"), ("address", "{address}"), ("page", "1"), ("offset", "20"), ("sort", "desc")]),
    get(Etherscan, "token_transfers", "Recent ERC-20 transfers", "", &[("chainid", "{chainid}"), ("module", "account"), ("action", "tokentx"), ("address", "{address}"), ("page", "1"), ("offset", "20"), ("sort", "desc")]),
    get(Etherscan, "gas_oracle", "Current gas price suggestions", "", &[("chainid", "{chainid}"), ("module", "gastracker"), ("action", "gasoracle")]),
];

struct FlowDef {
    id: &'static str,
    name: &'static str,
    description: &'static str,
    steps: &'static [(&'static str, bool)],
}

const WEB3_FLOWS: &[FlowDef] = &[
    FlowDef {
        id: "wallet-overview",
        name: "Wallet Overview",
        description: "Native balance, tokens, NFTs and recent transactions of one address",
        steps: &[
            ("web3.moralis.wallet_balance", false),
            ("web3.moralis.wallet_tokens", true),
            ("web3.alchemy.nfts", true),
            ("web3.etherscan.transactions", true),
        ],
    },
    FlowDef {
        id: "wallet-activity",
        name: "Wallet Activity",
        description: "Transactions and transfers touching one address",
        steps: &[
            ("web3.etherscan.transactions", false),
            ("web3.etherscan.token_transfers", true),
            ("web3.alchemy.asset_transfers", true),
        ],
    },
    FlowDef {
        id: "token-holdings",
        name: "Token Holdings",
        description: "ERC-20 holdings from two providers",
        steps: &[("web3.alchemy.token_balances", false), ("web3.moralis.wallet_tokens", true)],
    },
];

fn chain_id(chain: &str) -> Option<&'static str> {
    Some(match chain {
        "eth" | "ethereum" | "mainnet" => "1",
        "sepolia" => "11155111",
        "polygon" => "137",
        "bsc" => "56",
        "arbitrum" => "42161",
        "optimism" => "10",
        "base" => "8453",
        _ => return None,
    })
}

fn alchemy_network(chain: &str) -> Option<&'static str> {
    Some(match chain {
        "eth" | "ethereum" | "mainnet" => "eth-mainnet",
        "sepolia" => "eth-sepolia",
        "polygon" => "polygon-mainnet",
        "arbitrum" => "arb-mainnet",
        "optimism" => "opt-mainnet",
        "base" => "base-mainnet",
        _ => return None,
    })
}

// ── Public views ────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderStatus {
    pub provider: Web3Provider,
    pub configured: bool,
    pub env_var: &'static str,
    pub operations: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3Status {
    pub default_chain: String,
    pub providers: Vec<ProviderStatus>,
    pub flows: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Web3EndpointInfo {
    pub key: String,
    pub provider: Web3Provider,
    pub operation: &'static str,
    pub description: &'static str,
    pub requires_address: bool,
    pub configured: bool,
}

// ── Executor ────────────────────────────────────────────────────

pub struct Web3Executor {
    client: reqwest::Client,
    keys: HashMap<Web3Provider, String>,
    bases: HashMap<Web3Provider, String>,
    default_chain: String,
    request_timeout: Duration,
    flow_deadline: Duration,
}

struct Prepared {
    request: reqwest::RequestBuilder,
    /// URL with the credential masked.
    display_url: String,
    method: HttpMethod,
    rpc: bool,
}

impl Web3Executor {
    pub fn new(web3: &Web3Config, exec: &ExecutionConfig) -> Result<Self, ExecutionError> {
        let keys = [
            (Moralis, &web3.moralis_api_key),
            (Alchemy, &web3.alchemy_api_key),
            (Etherscan, &web3.etherscan_api_key),
        ]
        .into_iter()
        .filter_map(|(p, k)| k.clone().filter(|k| !k.is_empty()).map(|k| (p, k)))
        .collect();

        Ok(Self {
            client: build_client(exec)?,
            keys,
            bases: Web3Provider::ALL
                .into_iter()
                .map(|p| (p, p.default_base().to_string()))
                .collect(),
            default_chain: web3.default_chain.clone(),
            request_timeout: Duration::from_millis(exec.request_timeout_ms),
            flow_deadline: Duration::from_millis(exec.flow_deadline_ms),
        })
    }

    /// Point a provider at another base URL.
    pub fn with_base_url(mut self, provider: Web3Provider, base: &str) -> Self {
        self.bases.insert(provider, base.trim_end_matches('/').to_string());
        self
    }

    pub fn is_configured(&self, provider: Web3Provider) -> bool {
        self.keys.contains_key(&provider)
    }

    pub fn status(&self) -> Web3Status {
        Web3Status {
            default_chain: self.default_chain.clone(),
            providers: Web3Provider::ALL
                .into_iter()
                .map(|p| ProviderStatus {
                    provider: p,
                    configured: self.is_configured(p),
                    env_var: p.env_var(),
                    operations: OPERATIONS.iter().filter(|op| op.provider == p).map(|op| op.key()).collect(),
                })
                .collect(),
            flows: WEB3_FLOWS.iter().map(|f| f.id.to_string()).collect(),
        }
    }

    pub fn endpoints(&self) -> Vec<Web3EndpointInfo> {
        OPERATIONS
            .iter()
            .map(|op| Web3EndpointInfo {
                key: op.key(),
                provider: op.provider,
                operation: op.name,
                description: op.description,
                requires_address: op.requires_address(),
                configured: self.is_configured(op.provider),
            })
            .collect()
    }

    pub fn flows(&self) -> Vec<AutoFlow> {
        WEB3_FLOWS.iter().map(to_flow).collect()
    }

    pub fn flow(&self, id: &str) -> Option<AutoFlow> {
        WEB3_FLOWS.iter().find(|f| f.id == id).map(to_flow)
    }

    fn operation(key: &str) -> Option<&'static Operation> {
        let mut parts = key.split('.');
        let (Some(WEB3_KEY_PREFIX), Some(provider), Some(name), None) =
            (parts.next(), parts.next(), parts.next(), parts.next())
        else {
            return None;
        };
        let provider = Web3Provider::parse(provider)?;
        OPERATIONS.iter().find(|op| op.provider == provider && op.name == name)
    }

    pub async fn execute_endpoint(&self, key: &str, params: &Params) -> ExecutionResult {
        let start = Instant::now();
        let Some(op) = Self::operation(key) else {
            return ExecutionResult::failure(key, &ExecutionError::UnknownEndpoint(key.to_string()), 0);
        };

        let labelled = |mut r: ExecutionResult| {
            r.api_name = op.provider.display_name().to_string();
            r.endpoint_name = op.name.to_string();
            r.provider = Some(op.provider.as_str().to_string());
            r
        };

        let prepared = match self.prepare(op, params) {
            Ok(p) => p,
            Err(e) => {
                debug!(key, error = %e, "web3 call not dispatched");
                return labelled(ExecutionResult::failure(key, &e, elapsed_ms(start)));
            }
        };

        let rpc = prepared.rpc;
        let outcome = send(prepared.request, self.request_timeout)
            .await
            .map_err(|e| (e, None))
            .and_then(|reply| check_reply(reply, rpc));
        let duration_ms = elapsed_ms(start);

        let mut result = match outcome {
            Ok(reply) => ExecutionResult {
                success: true,
                key: key.to_string(),
                api_name: String::new(),
                endpoint_name: String::new(),
                url: String::new(),
                method: HttpMethod::Get,
                status: Some(reply.status),
                data: Some(reply.data),
                error: None,
                error_kind: None,
                provider: None,
                duration_ms,
            },
            Err((e, reply)) => {
                warn!(key, provider = %op.provider, error = %e, "web3 call failed");
                let mut r = ExecutionResult::failure(key, &e, duration_ms);
                if let Some(reply) = reply {
                    r.status = Some(reply.status);
                    r.data = Some(reply.data);
                }
                r
            }
        };
        result.url = prepared.display_url;
        result.method = prepared.method;
        labelled(result)
    }

    fn prepare(&self, op: &Operation, params: &Params) -> Result<Prepared, ExecutionError> {
        let key = self.keys.get(&op.provider).ok_or_else(|| ExecutionError::MissingCredential {
            provider: op.provider.as_str().to_string(),
            env_var: op.provider.env_var().to_string(),
        })?;

        let address = params.get("address").map(|a| a.trim()).filter(|a| !a.is_empty());
        if op.requires_address() && address.is_none() {
            return Err(ExecutionError::MissingParameters(vec!["address".to_string()]));
        }
        let chain = params
            .get("chain")
            .map(|c| c.trim().to_lowercase())
            .filter(|c| !c.is_empty())
            .unwrap_or_else(|| self.default_chain.clone());

        let mut ctx = Params::new();
        ctx.insert("address".into(), address.unwrap_or_default().to_string());
        ctx.insert("chain".into(), chain.clone());
        ctx.insert("key".into(), key.clone());
        if op.provider == Etherscan {
            let id = chain_id(&chain)
                .ok_or_else(|| ExecutionError::InvalidRequest(format!("unsupported chain for etherscan: {chain}")))?;
            ctx.insert("chainid".into(), id.to_string());
        }

        let mut base = self.bases.get(&op.provider).cloned().unwrap_or_default();
        if base.contains("{network}") {
            let network = alchemy_network(&chain)
                .ok_or_else(|| ExecutionError::InvalidRequest(format!("unsupported chain for alchemy: {chain}")))?;
            base = base.replace("{network}", network);
        }

        let prepared = match op.call {
            Call::Get { path, query } => {
                let (path, _) = substitute_path(path, &ctx);
                let url = format!("{base}{path}");
                let mut pairs: Vec<(String, String)> = query
                    .iter()
                    .map(|(k, v)| (k.to_string(), fill(v, &ctx)))
                    .collect();
                let mut request = self.client.get(&url);
                match op.provider {
                    Moralis => request = request.header("X-API-Key", key),
                    Etherscan => pairs.push(("apikey".to_string(), key.clone())),
                    Alchemy => {}
                }
                let shown: Vec<String> = pairs
                    .iter()
                    .filter(|(k, _)| k != "apikey")
                    .map(|(k, v)| format!("{k}={v}"))
                    .collect();
                Prepared {
                    request: request.query(&pairs),
                    display_url: mask(&join_query(&url, &shown), key),
                    method: HttpMethod::Get,
                    rpc: false,
                }
            }
            Call::Rpc { method, params: shape } => {
                let url = format!("{base}/v2/{key}");
                let address = address.unwrap_or_default();
                let rpc_params = match shape {
                    RpcParams::AddressAtLatest => json!([address, "latest"]),
                    RpcParams::Erc20Balances => json!([address, "erc20"]),
                    RpcParams::IncomingTransfers => json!([{
                        "fromBlock": "0x0",
                        "toAddress": address,
                        "category": ["external", "erc20", "erc721"],
                        "order": "desc",
                        "maxCount": "0x14",
                    }]),
                };
                let envelope = json!({ "jsonrpc": "2.0", "id": 1, "method": method, "params": rpc_params });
                Prepared {
                    request: self.client.post(&url).json(&envelope),
                    display_url: mask(&url, key),
                    method: HttpMethod::Post,
                    rpc: true,
                }
            }
        };
        Ok(prepared)
    }

    /// Run a chain-data flow with every step in flight. `address` is
    /// required; `chain` falls back to the configured default.
    pub async fn execute_flow(&self, flow_id: &str, address: &str, chain: Option<&str>) -> FlowExecutionResult {
        let Some(flow) = self.flow(flow_id) else {
            return FlowExecutionResult::failure(flow_id, true, &ExecutionError::UnknownFlow(flow_id.to_string()));
        };
        if address.trim().is_empty() {
            return FlowExecutionResult::failure(
                flow_id,
                true,
                &ExecutionError::MissingParameters(vec!["address".to_string()]),
            );
        }

        let mut shared = Params::new();
        shared.insert("address".into(), address.trim().to_string());
        if let Some(chain) = chain.filter(|c| !c.trim().is_empty()) {
            shared.insert("chain".into(), chain.to_string());
        }
        let mut by_step = ParamsByStep::new();
        by_step.insert(ALL_STEPS.to_string(), shared);

        run_flow(&flow, &by_step, true, self.flow_deadline, |step: &AutoFlowStep, params| {
            let key = step.endpoint_key.clone();
            async move { self.execute_endpoint(&key, &params).await }
        })
        .await
    }
}

fn to_flow(def: &FlowDef) -> AutoFlow {
    AutoFlow {
        id: def.id.to_string(),
        name: def.name.to_string(),
        description: def.description.to_string(),
        steps: def
            .steps
            .iter()
            .map(|(key, optional)| AutoFlowStep {
                endpoint_key: key.to_string(),
                description: Web3Executor::operation(key)
                    .map(|op| op.description.to_string())
                    .unwrap_or_default(),
                optional: *optional,
                params: None,
            })
            .collect(),
        categories: vec!["Blockchain".to_string()],
        created_at: Utc::now(),
        provenance: FlowProvenance::Auto,
    }
}

fn fill(template: &str, ctx: &Params) -> String {
    ctx.iter()
        .fold(template.to_string(), |acc, (k, v)| acc.replace(&format!("{{{k}}}"), v))
}

fn join_query(url: &str, pairs: &[String]) -> String {
    if pairs.is_empty() {
        url.to_string()
    } else {
        format!("{url}?{}", pairs.join("&"))
    }
}

/// Hide the key in both its raw and URL-encoded forms.
fn mask(url: &str, key: &str) -> String {
    if key.is_empty() {
        return url.to_string();
    }
    let encoded = urlencoding::encode(key);
    url.replace(encoded.as_ref(), "***").replace(key, "***")
}

/// Provider-level errors that arrive with a 2xx status.
fn check_reply(reply: Reply, rpc: bool) -> Result<Reply, (ExecutionError, Option<Reply>)> {
    if !(200..300).contains(&reply.status) {
        let status = reply.status;
        return Err((ExecutionError::UpstreamStatus { status }, Some(reply)));
    }
    if rpc {
        if let Some(err) = reply.data.get("error") {
            let msg = err.get("message").and_then(Value::as_str).unwrap_or("JSON-RPC error").to_string();
            return Err((ExecutionError::UpstreamError(msg), Some(reply)));
        }
    } else if reply.data.get("status").and_then(Value::as_str) == Some("0")
        && reply
            .data
            .get("message")
            .and_then(Value::as_str)
            .is_some_and(|m| m.starts_with("NOTOK"))
    {
        let msg = reply.data.get("result").and_then(Value::as_str).unwrap_or("NOTOK").to_string();
        return Err((ExecutionError::UpstreamError(msg), Some(reply)));
    }
    Ok(reply)
}
