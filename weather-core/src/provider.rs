use crate::{
    RelaySettings, WeatherRequest,
    error::TransportError,
    provider::{openweather::OpenWeatherProvider, weatherapi::WeatherApiProvider},
};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use std::{fmt::Debug, sync::Arc, time::Duration};
use tracing::debug;

pub mod openweather;
pub mod weatherapi;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderId {
    WeatherApi,
    OpenWeather,
}

impl ProviderId {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "weatherapi",
            ProviderId::OpenWeather => "openweather",
        }
    }

    pub const fn all() -> &'static [ProviderId] {
        &[ProviderId::WeatherApi, ProviderId::OpenWeather]
    }

    /// Environment variable that carries this provider's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => "WEATHER_API_KEY",
            ProviderId::OpenWeather => "OPENWEATHER_API_KEY",
        }
    }

    /// Public endpoint root used when the config does not override it.
    pub fn default_base_url(&self) -> &'static str {
        match self {
            ProviderId::WeatherApi => weatherapi::DEFAULT_BASE_URL,
            ProviderId::OpenWeather => openweather::DEFAULT_BASE_URL,
        }
    }
}

impl std::fmt::Display for ProviderId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<&str> for ProviderId {
    type Error = anyhow::Error;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        let lower = value.to_lowercase();

        match lower.as_str() {
            "weatherapi" => Ok(ProviderId::WeatherApi),
            "openweather" => Ok(ProviderId::OpenWeather),
            _ => Err(anyhow::anyhow!(
                "Unknown provider '{value}'. Supported providers: weatherapi, openweather."
            )),
        }
    }
}

/// One upstream weather API. Implementations return the decoded body untouched.
#[async_trait]
pub trait WeatherProvider: Send + Sync + Debug {
    fn id(&self) -> ProviderId;

    async fn fetch(&self, request: &WeatherRequest) -> Result<Value, TransportError>;
}

/// Build the HTTP client shared by both providers. Every call is bounded by `timeout`.
pub fn http_client(timeout: Duration) -> Result<Client, reqwest::Error> {
    Client::builder()
        .timeout(timeout)
        .user_agent(concat!("weather-relay/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Construct a provider from validated settings.
pub fn provider_from_settings(
    id: ProviderId,
    settings: &RelaySettings,
    http: Client,
) -> Arc<dyn WeatherProvider> {
    let provider = settings.provider(id);
    let api_key = provider.api_key.clone();
    let base_url = provider.base_url.clone();

    match id {
        ProviderId::WeatherApi => Arc::new(WeatherApiProvider::new(api_key, base_url, http)),
        ProviderId::OpenWeather => Arc::new(OpenWeatherProvider::new(api_key, base_url, http)),
    }
}

/// Send a prepared GET and decode whatever comes back as JSON.
///
/// The upstream status code is logged but not acted on; the body alone decides.
pub(crate) async fn get_json(request: RequestBuilder) -> Result<Value, TransportError> {
    let res = request.send().await?;
    let status = res.status();
    let body = res.text().await?;
    debug!(%status, bytes = body.len(), "upstream responded");

    serde_json::from_str(&body).map_err(|err| {
        debug!(body = %truncate_body(&body), "upstream body is not JSON");
        TransportError::from(err)
    })
}

pub(crate) fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((idx, _)) => format!("{}...", &body[..idx]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;

    #[test]
    fn provider_id_as_str_roundtrip() {
        for id in ProviderId::all() {
            let s = id.as_str();
            let parsed = ProviderId::try_from(s).expect("roundtrip should succeed");
            assert_eq!(*id, parsed);
        }
    }

    #[test]
    fn provider_id_is_case_insensitive() {
        let parsed = ProviderId::try_from("WeatherAPI").expect("mixed case should parse");
        assert_eq!(parsed, ProviderId::WeatherApi);
    }

    #[test]
    fn unknown_provider_error() {
        let err = ProviderId::try_from("doesnotexist").unwrap_err();
        assert!(err.to_string().contains("Unknown provider"));
    }

    #[test]
    fn env_vars_are_distinct() {
        assert_eq!(ProviderId::WeatherApi.env_var(), "WEATHER_API_KEY");
        assert_eq!(ProviderId::OpenWeather.env_var(), "OPENWEATHER_API_KEY");
    }

    #[test]
    fn provider_from_settings_builds_matching_id() {
        let mut cfg = Config::default();
        cfg.upsert_provider_api_key(ProviderId::WeatherApi, "WA".to_string());
        cfg.upsert_provider_api_key(ProviderId::OpenWeather, "OW".to_string());
        let settings = cfg.relay_settings().expect("both keys configured");
        let http = http_client(settings.upstream_timeout).expect("client builds");

        for id in ProviderId::all() {
            let provider = provider_from_settings(*id, &settings, http.clone());
            assert_eq!(provider.id(), *id);
        }
    }

    #[test]
    fn endpoint_joins_without_double_slash() {
        assert_eq!(endpoint("http://h/v1/", "forecast.json"), "http://h/v1/forecast.json");
        assert_eq!(endpoint("http://h/v1", "forecast.json"), "http://h/v1/forecast.json");
    }

    #[test]
    fn truncate_body_respects_char_boundaries() {
        let long = "é".repeat(300);
        let truncated = truncate_body(&long);
        assert!(truncated.ends_with("..."));
        assert_eq!(truncated.chars().count(), 203);
        assert_eq!(truncate_body("short"), "short");
    }
}
