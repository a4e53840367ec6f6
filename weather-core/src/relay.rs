//! The forecast and current-weather relays.
//!
//! A relay validates the query, makes exactly one upstream call and maps the
//! outcome onto a [`RelayResponse`]. Every path ends in a JSON body.

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::{
    config::RelaySettings,
    error::{ConfigError, RelayError},
    model::{DEFAULT_FORECAST_DAYS, RelayResponse, WeatherRequest},
    provider::{ProviderId, WeatherProvider, http_client, provider_from_settings},
};

const FORECAST_CONTEXT: &str = "Forecast API failed";
const WEATHER_CONTEXT: &str = "Weather API failed";

/// The two relays, each bound to its upstream provider at construction time.
#[derive(Debug, Clone)]
pub struct Relays {
    forecast: Arc<dyn WeatherProvider>,
    current: Arc<dyn WeatherProvider>,
}

impl Relays {
    pub fn new(forecast: Arc<dyn WeatherProvider>, current: Arc<dyn WeatherProvider>) -> Self {
        Self { forecast, current }
    }

    /// Wire WeatherAPI.com for forecasts and OpenWeather for current conditions.
    pub fn from_settings(settings: &RelaySettings) -> Result<Self, ConfigError> {
        let http = http_client(settings.upstream_timeout)?;

        Ok(Self::new(
            provider_from_settings(ProviderId::WeatherApi, settings, http.clone()),
            provider_from_settings(ProviderId::OpenWeather, settings, http),
        ))
    }

    /// `GET /forecast`: `days` defaults to 3 and is forwarded as given.
    #[instrument(skip(self))]
    pub async fn get_forecast(&self, city: Option<&str>, days: Option<&str>) -> RelayResponse {
        let days = days.unwrap_or(DEFAULT_FORECAST_DAYS);
        self.relay(self.forecast.as_ref(), FORECAST_CONTEXT, city, Some(days))
            .await
            .unwrap_or_else(RelayResponse::from)
    }

    /// `GET /weather`.
    #[instrument(skip(self))]
    pub async fn get_weather(&self, city: Option<&str>) -> RelayResponse {
        self.relay(self.current.as_ref(), WEATHER_CONTEXT, city, None)
            .await
            .unwrap_or_else(RelayResponse::from)
    }

    async fn relay(
        &self,
        provider: &dyn WeatherProvider,
        context: &'static str,
        city: Option<&str>,
        days: Option<&str>,
    ) -> Result<RelayResponse, RelayError> {
        let city = require_city(city)?;
        let request = WeatherRequest {
            city: city.to_string(),
            days: days.map(str::to_string),
        };

        let body = provider.fetch(&request).await.map_err(|source| {
            warn!(provider = %provider.id(), error = %source, "upstream call failed");
            RelayError::Transport { context, source }
        })?;

        if reports_error(&body) {
            debug!(provider = %provider.id(), "upstream reported an error");
            return Err(RelayError::UpstreamReported(body));
        }

        Ok(RelayResponse::ok(body))
    }
}

fn require_city(city: Option<&str>) -> Result<&str, RelayError> {
    match city {
        Some(city) if !city.is_empty() => Ok(city),
        _ => {
            debug!("rejecting request without city");
            Err(RelayError::MissingCity)
        }
    }
}

/// An upstream signals failure with a top-level `error` key.
fn reports_error(body: &Value) -> bool {
    body.as_object().is_some_and(|map| map.contains_key("error"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{error::TransportError, model::RelayStatus};
    use async_trait::async_trait;
    use rstest::rstest;
    use serde_json::json;
    use std::sync::Mutex;

    /// Records every request and answers with a canned result.
    #[derive(Debug)]
    struct FakeProvider {
        id: ProviderId,
        reply: fn() -> Result<Value, TransportError>,
        seen: Mutex<Vec<WeatherRequest>>,
    }

    impl FakeProvider {
        fn new(id: ProviderId, reply: fn() -> Result<Value, TransportError>) -> Arc<Self> {
            Arc::new(Self { id, reply, seen: Mutex::new(Vec::new()) })
        }

        fn requests(&self) -> Vec<WeatherRequest> {
            self.seen.lock().expect("lock").clone()
        }
    }

    #[async_trait]
    impl WeatherProvider for FakeProvider {
        fn id(&self) -> ProviderId {
            self.id
        }

        async fn fetch(&self, request: &WeatherRequest) -> Result<Value, TransportError> {
            self.seen.lock().expect("lock").push(request.clone());
            (self.reply)()
        }
    }

    fn forecast_body() -> Result<Value, TransportError> {
        Ok(json!({ "location": { "name": "Paris" }, "forecast": { "forecastday": [] } }))
    }

    fn no_location() -> Result<Value, TransportError> {
        Ok(json!({ "error": { "code": 1006, "message": "No matching location found." } }))
    }

    fn timed_out() -> Result<Value, TransportError> {
        Err(TransportError::Timeout)
    }

    fn dns_failure() -> Result<Value, TransportError> {
        Err(TransportError::Request("dns error: failed to lookup address information".into()))
    }

    fn relays(
        forecast: fn() -> Result<Value, TransportError>,
        current: fn() -> Result<Value, TransportError>,
    ) -> (Relays, Arc<FakeProvider>, Arc<FakeProvider>) {
        let f = FakeProvider::new(ProviderId::WeatherApi, forecast);
        let c = FakeProvider::new(ProviderId::OpenWeather, current);
        (Relays::new(f.clone(), c.clone()), f, c)
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[tokio::test]
    async fn forecast_without_city_never_calls_upstream(#[case] city: Option<&str>) {
        let (relays, forecast, current) = relays(forecast_body, forecast_body);

        let response = relays.get_forecast(city, Some("5")).await;

        assert_eq!(response.status, RelayStatus::BadRequest);
        assert_eq!(response.body, json!({ "error": "City is required" }));
        assert!(forecast.requests().is_empty());
        assert!(current.requests().is_empty());
    }

    #[rstest]
    #[case(None)]
    #[case(Some(""))]
    #[tokio::test]
    async fn weather_without_city_never_calls_upstream(#[case] city: Option<&str>) {
        let (relays, _, current) = relays(forecast_body, forecast_body);

        let response = relays.get_weather(city).await;

        assert_eq!(response.status, RelayStatus::BadRequest);
        assert_eq!(response.body, json!({ "error": "City is required" }));
        assert!(current.requests().is_empty());
    }

    #[tokio::test]
    async fn forecast_success_is_verbatim() {
        let (relays, forecast, _) = relays(forecast_body, forecast_body);

        let response = relays.get_forecast(Some("Paris"), None).await;

        assert_eq!(response.status, RelayStatus::Ok);
        assert_eq!(response.body, forecast_body().expect("canned body"));
        assert_eq!(
            forecast.requests(),
            vec![WeatherRequest { city: "Paris".into(), days: Some("3".into()) }]
        );
    }

    #[rstest]
    #[case("5")]
    #[case("abc")]
    #[tokio::test]
    async fn forecast_days_forwarded_verbatim(#[case] days: &str) {
        let (relays, forecast, _) = relays(forecast_body, forecast_body);

        relays.get_forecast(Some("Paris"), Some(days)).await;

        assert_eq!(forecast.requests()[0].days.as_deref(), Some(days));
    }

    #[tokio::test]
    async fn forecast_upstream_error_is_bad_request_with_same_body() {
        let (relays, _, _) = relays(no_location, forecast_body);

        let response = relays.get_forecast(Some("Atlantis"), None).await;

        assert_eq!(response.status, RelayStatus::BadRequest);
        assert_eq!(response.body, no_location().expect("canned body"));
    }

    #[tokio::test]
    async fn weather_upstream_error_is_bad_request_with_same_body() {
        let (relays, _, _) = relays(forecast_body, no_location);

        let response = relays.get_weather(Some("Atlantis")).await;

        assert_eq!(response.status, RelayStatus::BadRequest);
        assert_eq!(response.body, no_location().expect("canned body"));
    }

    #[tokio::test]
    async fn weather_success_does_not_forward_days() {
        let (relays, forecast, current) = relays(forecast_body, forecast_body);

        let response = relays.get_weather(Some("Oslo")).await;

        assert_eq!(response.status, RelayStatus::Ok);
        assert!(forecast.requests().is_empty());
        assert_eq!(current.requests(), vec![WeatherRequest { city: "Oslo".into(), days: None }]);
    }

    #[tokio::test]
    async fn weather_transport_failure_is_internal_error() {
        let (relays, _, _) = relays(forecast_body, dns_failure);

        let response = relays.get_weather(Some("Oslo")).await;

        assert_eq!(response.status, RelayStatus::InternalError);
        assert_eq!(
            response.body,
            json!({ "error": "Weather API failed: dns error: failed to lookup address information" })
        );
    }

    #[tokio::test]
    async fn forecast_timeout_is_internal_error() {
        let (relays, _, _) = relays(timed_out, forecast_body);

        let response = relays.get_forecast(Some("Oslo"), None).await;

        assert_eq!(response.status, RelayStatus::InternalError);
        assert_eq!(response.body, json!({ "error": "Forecast API failed: upstream request timed out" }));
    }

    #[rstest]
    #[case(json!({ "error": null }), true)]
    #[case(json!({ "cod": "404", "message": "city not found" }), false)]
    #[case(json!([{ "error": 1 }]), false)]
    #[case(json!("error"), false)]
    fn only_top_level_error_key_counts(#[case] body: Value, #[case] expected: bool) {
        assert_eq!(reports_error(&body), expected);
    }
}
