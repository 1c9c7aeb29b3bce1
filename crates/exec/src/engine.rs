use std::sync::Arc;
use std::time::{Duration, Instant};

use apiloom_catalog::CatalogStore;
use apiloom_core::config::ExecutionConfig;
use apiloom_core::{AuthMode, AutoFlowStep, AutoRegisteredEndpoint, HttpMethod};
use apiloom_registry::RegistrySync;
use reqwest::Method;
use tracing::{debug, warn};

use crate::error::ExecutionError;
use crate::http::{build_client, send};
use crate::params::{missing_required, substitute_path, Params, ParamsByStep};
use crate::result::{ExecutionResult, FlowExecutionResult};
use crate::runner::run_flow;

/// Executes auto endpoints and stored flows against live upstreams.
pub struct Executor {
    store: Arc<CatalogStore>,
    registry: Arc<RegistrySync>,
    client: reqwest::Client,
    request_timeout: Duration,
    flow_deadline: Duration,
}

impl Executor {
    pub fn new(
        store: Arc<CatalogStore>,
        registry: Arc<RegistrySync>,
        config: &ExecutionConfig,
    ) -> Result<Self, ExecutionError> {
        Ok(Self {
            store,
            registry,
            client: build_client(config)?,
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            flow_deadline: Duration::from_millis(config.flow_deadline_ms),
        })
    }

    pub fn flow_deadline(&self) -> Duration {
        self.flow_deadline
    }

    pub async fn execute_endpoint(&self, key: &str, params: &Params) -> ExecutionResult {
        let start = Instant::now();
        let Some(endpoint) = self.registry.endpoint(key) else {
            return ExecutionResult::failure(key, &ExecutionError::UnknownEndpoint(key.to_string()), 0);
        };

        let missing = missing_required(&endpoint, params);
        if !missing.is_empty() {
            debug!(key, ?missing, "rejected before dispatch");
            return ExecutionResult::failure(key, &ExecutionError::MissingParameters(missing), elapsed_ms(start))
                .for_endpoint(&endpoint);
        }

        let (url, used) = substitute_path(&endpoint.url, params);
        let rest: Vec<(&String, &String)> = params.iter().filter(|(k, _)| !used.contains(*k)).collect();
        let method = to_reqwest(endpoint.method);
        let request = match endpoint.method {
            HttpMethod::Get | HttpMethod::Delete => self.client.request(method, &url).query(&rest),
            _ => {
                let body: serde_json::Map<String, serde_json::Value> = rest
                    .iter()
                    .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
                    .collect();
                self.client.request(method, &url).json(&body)
            }
        };

        let outcome = send(request, self.request_timeout).await;
        let result = finish(key, &endpoint, url, outcome, elapsed_ms(start));
        if !result.success {
            warn!(key, error = ?result.error, duration_ms = result.duration_ms, "endpoint call failed");
        }
        result
    }

    /// Run a stored flow one step at a time.
    pub async fn execute_flow(&self, flow_id: &str, by_step: &ParamsByStep) -> FlowExecutionResult {
        self.run(flow_id, by_step, false).await
    }

    /// Run a stored flow with every step in flight at once.
    pub async fn execute_parallel_flow(&self, flow_id: &str, by_step: &ParamsByStep) -> FlowExecutionResult {
        self.run(flow_id, by_step, true).await
    }

    async fn run(&self, flow_id: &str, by_step: &ParamsByStep, parallel: bool) -> FlowExecutionResult {
        let Some(flow) = self.store.get_flow(flow_id) else {
            return FlowExecutionResult::failure(
                flow_id,
                parallel,
                &ExecutionError::UnknownFlow(flow_id.to_string()),
            );
        };
        run_flow(&flow, by_step, parallel, self.flow_deadline, |step: &AutoFlowStep, params| {
            let key = step.endpoint_key.clone();
            async move { self.execute_endpoint(&key, &params).await }
        })
        .await
    }

    /// Up to `limit` keyless endpoints that need no parameters, best first.
    pub fn demo_endpoints(&self, limit: usize) -> Vec<AutoRegisteredEndpoint> {
        let mut candidates: Vec<AutoRegisteredEndpoint> = self
            .registry
            .all_auto_endpoints()
            .into_iter()
            .filter(|ep| ep.auth == AuthMode::None)
            .filter(|ep| ep.parameters.iter().flatten().all(|(_, spec)| !spec.required))
            .collect();
        candidates.sort_by(|a, b| b.quality_score.total_cmp(&a.quality_score).then_with(|| a.key.cmp(&b.key)));

        let mut seen_apis = Vec::new();
        candidates
            .into_iter()
            .filter(|ep| {
                if seen_apis.contains(&ep.api_name) {
                    false
                } else {
                    seen_apis.push(ep.api_name.clone());
                    true
                }
            })
            .take(limit)
            .collect()
    }
}

pub(crate) fn to_reqwest(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

pub(crate) fn elapsed_ms(start: Instant) -> u64 {
    start.elapsed().as_millis() as u64
}

fn finish(
    key: &str,
    endpoint: &AutoRegisteredEndpoint,
    url: String,
    outcome: Result<crate::http::Reply, ExecutionError>,
    duration_ms: u64,
) -> ExecutionResult {
    let mut result = match outcome {
        Ok(reply) if (200..300).contains(&reply.status) => ExecutionResult {
            success: true,
            key: key.to_string(),
            api_name: String::new(),
            endpoint_name: String::new(),
            url: String::new(),
            method: endpoint.method,
            status: Some(reply.status),
            data: Some(reply.data),
            error: None,
            error_kind: None,
            provider: None,
            duration_ms,
        },
        Ok(reply) => {
            let error = ExecutionError::UpstreamStatus { status: reply.status };
            let mut r = ExecutionResult::failure(key, &error, duration_ms);
            r.status = Some(reply.status);
            r.data = Some(reply.data);
            r
        }
        Err(error) => ExecutionResult::failure(key, &error, duration_ms),
    }
    .for_endpoint(endpoint);
    result.url = url;
    result
}
