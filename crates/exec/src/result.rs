use apiloom_core::{AutoRegisteredEndpoint, HttpMethod};
use serde::Serialize;
use serde_json::Value;

use crate::error::{ErrorKind, ExecutionError};

/// Outcome of one endpoint call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub key: String,
    pub api_name: String,
    pub endpoint_name: String,
    /// The URL actually requested, empty when no call was made.
    pub url: String,
    pub method: HttpMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    /// Set for chain-data calls.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// A failed result for `key` with nothing resolved yet.
    pub fn failure(key: &str, error: &ExecutionError, duration_ms: u64) -> Self {
        Self {
            success: false,
            key: key.to_string(),
            api_name: String::new(),
            endpoint_name: String::new(),
            url: String::new(),
            method: HttpMethod::Get,
            status: None,
            data: None,
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            provider: None,
            duration_ms,
        }
    }

    /// Attach the identity of a resolved endpoint.
    pub(crate) fn for_endpoint(mut self, ep: &AutoRegisteredEndpoint) -> Self {
        self.api_name = ep.api_name.clone();
        self.endpoint_name = ep.endpoint_name.clone();
        self.method = ep.method;
        self
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error_kind
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowStepResult {
    pub index: usize,
    pub optional: bool,
    #[serde(flatten)]
    pub result: ExecutionResult,
}

/// Outcome of a flow run. `steps` is always in step order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FlowExecutionResult {
    pub flow_id: String,
    pub flow_name: String,
    pub parallel: bool,
    /// True iff every executed step succeeded.
    pub success: bool,
    pub total_steps: usize,
    /// Steps that succeeded; partial success is visible here.
    pub succeeded_steps: usize,
    pub steps: Vec<FlowStepResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub duration_ms: u64,
}

impl FlowExecutionResult {
    pub fn failure(flow_id: &str, parallel: bool, error: &ExecutionError) -> Self {
        Self {
            flow_id: flow_id.to_string(),
            flow_name: String::new(),
            parallel,
            success: false,
            total_steps: 0,
            succeeded_steps: 0,
            steps: Vec::new(),
            error: Some(error.to_string()),
            error_kind: Some(error.kind()),
            duration_ms: 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_result_flattens_execution_fields() {
        let step = FlowStepResult {
            index: 2,
            optional: true,
            result: ExecutionResult::failure("public.x.y", &ExecutionError::Timeout(10), 10),
        };
        let json = serde_json::to_value(&step).unwrap();
        assert_eq!(json["index"], 2);
        assert_eq!(json["key"], "public.x.y");
        assert_eq!(json["errorKind"], "timeout");
        assert_eq!(json["durationMs"], 10);
        assert!(json.get("data").is_none());
    }
}
