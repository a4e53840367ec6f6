use serde::Serialize;
use serde_json::Value;

/// Forecast length used when the caller does not pass `days`.
pub const DEFAULT_FORECAST_DAYS: &str = "3";

/// A validated request handed to an upstream provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WeatherRequest {
    pub city: String,
    /// Forwarded verbatim; only the forecast provider reads it.
    pub days: Option<String>,
}

/// Locally synthesized failure body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorEnvelope {
    pub error: String,
}

impl ErrorEnvelope {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }

    pub fn to_value(&self) -> Value {
        serde_json::json!({ "error": self.error })
    }
}

/// Status classes a relay can answer with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelayStatus {
    Ok,
    BadRequest,
    InternalError,
}

impl RelayStatus {
    pub const fn as_u16(self) -> u16 {
        match self {
            RelayStatus::Ok => 200,
            RelayStatus::BadRequest => 400,
            RelayStatus::InternalError => 500,
        }
    }
}

/// What a relay hands back to the HTTP layer: exactly one JSON body plus a status.
#[derive(Debug, Clone, PartialEq)]
pub struct RelayResponse {
    pub status: RelayStatus,
    pub body: Value,
}

impl RelayResponse {
    pub fn ok(body: Value) -> Self {
        Self { status: RelayStatus::Ok, body }
    }
}
