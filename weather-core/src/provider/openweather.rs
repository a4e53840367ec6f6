use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::{
    error::TransportError,
    model::WeatherRequest,
    provider::{ProviderId, endpoint, get_json},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5";

/// OpenWeather current-conditions client. Always asks for metric units.
#[derive(Clone)]
pub struct OpenWeatherProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl OpenWeatherProvider {
    pub fn new(api_key: String, base_url: String, http: Client) -> Self {
        Self { api_key, base_url, http }
    }
}

impl std::fmt::Debug for OpenWeatherProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenWeatherProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherProvider for OpenWeatherProvider {
    fn id(&self) -> ProviderId {
        ProviderId::OpenWeather
    }

    #[instrument(skip(self), fields(provider = "openweather"))]
    async fn fetch(&self, request: &WeatherRequest) -> Result<Value, TransportError> {
        let url = endpoint(&self.base_url, "weather");

        let req = self.http.get(url).query(&[
            ("q", request.city.as_str()),
            ("appid", self.api_key.as_str()),
            ("units", "metric"),
        ]);

        get_json(req).await
    }
}
