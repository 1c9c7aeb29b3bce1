use serde::{Deserialize, Serialize};

/// Machine-readable failure class carried on results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ErrorKind {
    UnknownEndpoint,
    UnknownFlow,
    MissingParameters,
    MissingCredential,
    Timeout,
    DeadlineExceeded,
    UpstreamStatus,
    UpstreamError,
    Transport,
    InvalidRequest,
}

#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    #[error("unknown endpoint: {0}")]
    UnknownEndpoint(String),

    #[error("unknown flow: {0}")]
    UnknownFlow(String),

    #[error("missing required parameters: {}", .0.join(", "))]
    MissingParameters(Vec<String>),

    #[error("{provider} API key not configured (set {env_var})")]
    MissingCredential { provider: String, env_var: String },

    #[error("request timed out after {0} ms")]
    Timeout(u64),

    #[error("flow deadline of {0} ms exceeded")]
    DeadlineExceeded(u64),

    #[error("upstream returned status {status}")]
    UpstreamStatus { status: u16 },

    #[error("upstream error: {0}")]
    UpstreamError(String),

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ExecutionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::UnknownEndpoint(_) => ErrorKind::UnknownEndpoint,
            Self::UnknownFlow(_) => ErrorKind::UnknownFlow,
            Self::MissingParameters(_) => ErrorKind::MissingParameters,
            Self::MissingCredential { .. } => ErrorKind::MissingCredential,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::DeadlineExceeded(_) => ErrorKind::DeadlineExceeded,
            Self::UpstreamStatus { .. } => ErrorKind::UpstreamStatus,
            Self::UpstreamError(_) => ErrorKind::UpstreamError,
            Self::Transport(_) => ErrorKind::Transport,
            Self::InvalidRequest(_) => ErrorKind::InvalidRequest,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn credential_error_mentions_api_key() {
        let e = ExecutionError::MissingCredential {
            provider: "moralis".into(),
            env_var: "MORALIS_API_KEY".into(),
        };
        assert!(e.to_string().contains("API key"));
        assert_eq!(e.kind(), ErrorKind::MissingCredential);
        assert_eq!(serde_json::to_value(e.kind()).unwrap(), "missingCredential");
    }

    #[test]
    fn missing_parameters_lists_names() {
        let e = ExecutionError::MissingParameters(vec!["latitude".into(), "longitude".into()]);
        assert_eq!(e.to_string(), "missing required parameters: latitude, longitude");
    }
}
