use anyhow::Context;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;

use crate::{
    error::FetchError,
    model::{Coordinate, WeatherSnapshot},
};

/// OpenWeatherMap current-weather endpoint.
pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/weather";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Turns a coordinate into exactly one `WeatherSnapshot` or a typed failure.
#[derive(Debug, Clone)]
pub struct WeatherFetcher {
    api_key: String,
    base_url: Url,
    http: Client,
}

impl WeatherFetcher {
    pub fn new(api_key: String) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, DEFAULT_BASE_URL)
    }

    /// Point the fetcher at a different endpoint, e.g. a mock server.
    ///
    /// The base URL is validated here: a malformed endpoint is a
    /// configuration mistake surfaced at startup, never a fetch-time error.
    pub fn with_base_url(api_key: String, base_url: &str) -> anyhow::Result<Self> {
        let base_url = Url::parse(base_url)
            .with_context(|| format!("Invalid weather endpoint URL: {base_url}"))?;

        let http = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self { api_key, base_url, http })
    }

    /// Request URL for one coordinate: `lat` and `lon` as plain decimals
    /// (`f64` Display never renders scientific notation), `units` fixed to
    /// metric, the key as `appid`.
    pub fn request_url(&self, coordinate: Coordinate) -> Url {
        let mut url = self.base_url.clone();
        url.query_pairs_mut()
            .append_pair("lat", &coordinate.lat.to_string())
            .append_pair("lon", &coordinate.lon.to_string())
            .append_pair("units", "metric")
            .append_pair("appid", &self.api_key);
        url
    }

    /// Perform exactly one request for the given coordinate. No retries: a
    /// failed attempt surfaces immediately to the caller.
    pub async fn fetch_weather(
        &self,
        coordinate: Coordinate,
    ) -> Result<WeatherSnapshot, FetchError> {
        debug!("requesting current weather for ({}, {})", coordinate.lat, coordinate.lon);

        let res = self
            .http
            .get(self.request_url(coordinate))
            .send()
            .await
            .map_err(FetchError::Transport)?;

        let status = res.status();
        let body = res.text().await.map_err(FetchError::Transport)?;

        if !status.is_success() {
            return Err(FetchError::Status { status, body: truncate_body(&body) });
        }

        decode_payload(&body)
    }
}

/// Raw shape of the provider's JSON payload. Never leaves this module.
#[derive(Debug, Deserialize)]
struct CurrentPayload {
    name: String,
    main: MainReadings,
    weather: Vec<ConditionEntry>,
    dt: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct MainReadings {
    temp: f64,
}

#[derive(Debug, Deserialize)]
struct ConditionEntry {
    description: String,
}

fn decode_payload(body: &str) -> Result<WeatherSnapshot, FetchError> {
    let parsed: CurrentPayload = serde_json::from_str(body).map_err(|err| {
        debug!("undecodable weather payload: {err}");
        FetchError::Decode(err)
    })?;

    let observed_at =
        parsed.dt.and_then(|ts| DateTime::from_timestamp(ts, 0)).unwrap_or_else(Utc::now);

    let condition = parsed.weather.first().map(|w| w.description.clone()).unwrap_or_default();

    Ok(WeatherSnapshot {
        location_name: parsed.name,
        temperature_c: parsed.main.temp,
        condition,
        observed_at,
    })
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        format!("{}...", &body[..MAX])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fetcher() -> WeatherFetcher {
        WeatherFetcher::new("KEY".to_string()).expect("default endpoint is valid")
    }

    #[test]
    fn request_url_carries_exact_decimal_coordinates() {
        let url = fetcher().request_url(Coordinate::new(-6.2, 106.8));

        assert!(url.as_str().starts_with(DEFAULT_BASE_URL));
        assert_eq!(
            url.query(),
            Some("lat=-6.2&lon=106.8&units=metric&appid=KEY"),
        );
    }

    #[test]
    fn request_url_never_uses_scientific_notation() {
        let url = fetcher().request_url(Coordinate::new(0.000001, -0.000052));

        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["lat"], "0.000001");
        assert_eq!(pairs["lon"], "-0.000052");
    }

    #[test]
    fn malformed_base_url_is_rejected_at_construction() {
        let err = WeatherFetcher::with_base_url("KEY".to_string(), "not a url").unwrap_err();
        assert!(err.to_string().contains("Invalid weather endpoint URL"));
    }

    #[test]
    fn decode_maps_name_temp_and_first_condition() {
        let snapshot = decode_payload(
            r#"{"name":"Jakarta","main":{"temp":31.5},"weather":[{"description":"haze"},{"description":"smoke"}]}"#,
        )
        .expect("payload decodes");

        assert_eq!(snapshot.location_name, "Jakarta");
        assert_eq!(snapshot.temperature_c, 31.5);
        assert_eq!(snapshot.condition, "haze");
    }

    #[test]
    fn decode_defaults_condition_to_empty_when_no_entries() {
        let snapshot =
            decode_payload(r#"{"name":"Nowhere","main":{"temp":10.0},"weather":[]}"#)
                .expect("payload decodes");

        assert_eq!(snapshot.condition, "");
    }

    #[test]
    fn decode_uses_provider_timestamp_when_present() {
        let snapshot = decode_payload(
            r#"{"name":"Jakarta","main":{"temp":31.5},"weather":[],"dt":1704067200}"#,
        )
        .expect("payload decodes");

        assert_eq!(snapshot.observed_at, DateTime::from_timestamp(1_704_067_200, 0).unwrap());
    }

    #[test]
    fn missing_temperature_is_a_decode_error() {
        let err = decode_payload(r#"{"name":"Jakarta","main":{},"weather":[]}"#).unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
        assert!(!err.is_network());
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let err = decode_payload("<html>gateway timeout</html>").unwrap_err();
        assert!(matches!(err, FetchError::Decode(_)));
    }

    #[test]
    fn long_error_bodies_are_truncated() {
        let body = "x".repeat(500);
        let truncated = truncate_body(&body);
        assert_eq!(truncated.len(), 203);
        assert!(truncated.ends_with("..."));
    }
}
