use serde_json::Value;
use thiserror::Error;

use crate::{
    model::{ErrorEnvelope, RelayResponse, RelayStatus},
    provider::ProviderId,
};

/// A single outbound call failed before a JSON body could be obtained.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("upstream request timed out")]
    Timeout,

    #[error("{0}")]
    Request(String),

    #[error("upstream response is not valid JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            return TransportError::Timeout;
        }
        // The request URL carries the API key in its query string.
        TransportError::Request(error_chain(&err.without_url()))
    }
}

fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let cause_msg = cause.to_string();
        if !message.contains(&cause_msg) {
            message.push_str(": ");
            message.push_str(&cause_msg);
        }
        source = cause.source();
    }
    message
}

/// Everything a relay can fail with. Each variant maps to one status class.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("City is required")]
    MissingCity,

    /// The upstream answered, but its body carries a top-level `error` key.
    #[error("upstream reported an error")]
    UpstreamReported(Value),

    #[error("{context}: {source}")]
    Transport {
        context: &'static str,
        #[source]
        source: TransportError,
    },
}

impl RelayError {
    pub fn status(&self) -> RelayStatus {
        match self {
            RelayError::MissingCity | RelayError::UpstreamReported(_) => RelayStatus::BadRequest,
            RelayError::Transport { .. } => RelayStatus::InternalError,
        }
    }
}

impl From<RelayError> for RelayResponse {
    fn from(err: RelayError) -> Self {
        let status = err.status();
        let body = match err {
            RelayError::UpstreamReported(body) => body,
            other => ErrorEnvelope::new(other.to_string()).to_value(),
        };
        RelayResponse { status, body }
    }
}

/// Startup configuration problems. All of them are fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(
        "No API key configured for provider '{provider}'.\n\
         Hint: set {env_var} or run `weather-server configure {provider}`."
    )]
    MissingApiKey {
        provider: ProviderId,
        env_var: &'static str,
    },

    #[error("Invalid value for {name}: {value:?}")]
    InvalidEnv { name: &'static str, value: String },

    #[error("Upstream timeout must be at least one second")]
    ZeroTimeout,

    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
