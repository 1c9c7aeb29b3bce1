use std::time::Duration;

use apiloom_core::config::ExecutionConfig;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, RequestBuilder};
use serde_json::{json, Value};

use crate::error::ExecutionError;

pub(crate) struct Reply {
    pub status: u16,
    pub data: Value,
}

pub(crate) fn build_client(config: &ExecutionConfig) -> Result<Client, ExecutionError> {
    Ok(Client::builder()
        .user_agent(config.user_agent.clone())
        .timeout(Duration::from_millis(config.request_timeout_ms))
        .build()?)
}

/// Send with a hard timeout and decode the body by content type. Non-2xx
/// replies are returned, not raised, so the caller keeps status and body.
pub(crate) async fn send(request: RequestBuilder, timeout: Duration) -> Result<Reply, ExecutionError> {
    let limit_ms = timeout.as_millis() as u64;
    tokio::time::timeout(timeout, async {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_lowercase();
        let body = response.bytes().await?;
        Ok::<_, ExecutionError>(Reply {
            status,
            data: decode_body(&content_type, &body),
        })
    })
    .await
    .map_err(|_| ExecutionError::Timeout(limit_ms))?
}

/// JSON for `*json*` types, text for `text/*`, otherwise a descriptor.
pub(crate) fn decode_body(content_type: &str, body: &[u8]) -> Value {
    if content_type.contains("json") {
        if let Ok(value) = serde_json::from_slice(body) {
            return value;
        }
        return Value::String(String::from_utf8_lossy(body).into_owned());
    }
    if content_type.starts_with("text/") {
        return Value::String(String::from_utf8_lossy(body).into_owned());
    }
    json!({
        "contentType": if content_type.is_empty() { "unknown" } else { content_type },
        "bytes": body.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_by_content_type() {
        assert_eq!(decode_body("application/json; charset=utf-8", br#"{"a":1}"#), json!({"a": 1}));
        assert_eq!(decode_body("application/json", b"not json"), json!("not json"));
        assert_eq!(decode_body("text/plain", b"42 is the answer"), json!("42 is the answer"));
        assert_eq!(
            decode_body("image/png", &[0u8; 16]),
            json!({"contentType": "image/png", "bytes": 16})
        );
        assert_eq!(decode_body("", b"x"), json!({"contentType": "unknown", "bytes": 1}));
    }
}
