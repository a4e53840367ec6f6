use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use tracing::instrument;

use crate::{
    error::TransportError,
    model::{DEFAULT_FORECAST_DAYS, WeatherRequest},
    provider::{ProviderId, endpoint, get_json},
};

use super::WeatherProvider;

pub const DEFAULT_BASE_URL: &str = "https://api.weatherapi.com/v1";

/// WeatherAPI.com multi-day forecast client.
#[derive(Clone)]
pub struct WeatherApiProvider {
    api_key: String,
    base_url: String,
    http: Client,
}

impl WeatherApiProvider {
    pub fn new(api_key: String, base_url: String, http: Client) -> Self {
        Self { api_key, base_url, http }
    }
}

impl std::fmt::Debug for WeatherApiProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherApiProvider")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WeatherProvider for WeatherApiProvider {
    fn id(&self) -> ProviderId {
        ProviderId::WeatherApi
    }

    #[instrument(skip(self), fields(provider = "weatherapi"))]
    async fn fetch(&self, request: &WeatherRequest) -> Result<Value, TransportError> {
        let url = endpoint(&self.base_url, "forecast.json");
        let days = request.days.as_deref().unwrap_or(DEFAULT_FORECAST_DAYS);

        let req = self.http.get(url).query(&[
            ("key", self.api_key.as_str()),
            ("q", request.city.as_str()),
            ("days", days),
            ("aqi", "no"),
            ("alerts", "no"),
        ]);

        get_json(req).await
    }
}
