use anyhow::Context;
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, trace};

use crate::{
    error::{WeatherError, WeatherResult},
    model::{CurrentWeatherReport, ForecastReport},
};

use super::{QueryPath, WeatherSource};

pub const DEFAULT_BASE_URL: &str = "https://api.openweathermap.org/data/2.5/";

/// HTTP client for the OpenWeather 2.5 REST API.
#[derive(Debug, Clone)]
pub struct OpenWeatherClient {
    base_url: String,
    http: Client,
}

impl OpenWeatherClient {
    pub fn new() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            http: Client::new(),
        }
    }

    /// Client against another base URL, e.g. a mirror or a mock server.
    pub fn with_base_url(base_url: &str) -> anyhow::Result<Self> {
        reqwest::Url::parse(base_url)
            .with_context(|| format!("Invalid provider base URL: {base_url}"))?;

        // Query paths are relative, so the base must end with a slash.
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };

        Ok(Self {
            base_url,
            http: Client::new(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get(&self, what: &'static str, path: &QueryPath) -> WeatherResult<String> {
        let url = format!("{}{}", self.base_url, path.as_str());

        debug!(endpoint = what, path = %path.redacted(), "GET");

        let res = self.http.get(url).send().await?;

        let status = res.status();
        let body = res.text().await?;

        trace!(endpoint = what, %status, bytes = body.len(), "response");

        if !status.is_success() {
            return Err(WeatherError::Http {
                status,
                body: truncate_body(&body),
            });
        }

        Ok(body)
    }
}

impl Default for OpenWeatherClient {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl WeatherSource for OpenWeatherClient {
    async fn fetch_current(&self, path: &QueryPath) -> WeatherResult<CurrentWeatherReport> {
        let body = self.get("current weather", path).await?;
        CurrentWeatherReport::from_json(&body)
    }

    async fn fetch_forecast(&self, path: &QueryPath) -> WeatherResult<ForecastReport> {
        let body = self.get("forecast", path).await?;
        ForecastReport::from_json(&body)
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX {
        let mut end = MAX;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        format!("{}...", &body[..end])
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;
    use reqwest::StatusCode;

    use super::*;
    use crate::model::{
        Coordinates, Units,
        fixtures::{CURRENT_LONDON, FORECAST_LONDON},
    };

    fn client_for(server: &MockServer) -> OpenWeatherClient {
        OpenWeatherClient::with_base_url(&server.url("/data/2.5")).expect("mock url is valid")
    }

    fn london() -> Coordinates {
        Coordinates::new(51.5, -0.12)
    }

    #[test]
    fn default_base_url_is_openweather() {
        assert_eq!(OpenWeatherClient::new().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn base_url_gets_a_trailing_slash() {
        let client = OpenWeatherClient::with_base_url("http://localhost:1234/data/2.5")
            .expect("valid url");
        assert_eq!(client.base_url(), "http://localhost:1234/data/2.5/");

        assert!(OpenWeatherClient::with_base_url("not a url").is_err());
    }

    #[tokio::test]
    async fn fetch_current_sends_query_and_decodes() {
        let server = MockServer::start_async().await;
        let m = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/data/2.5/weather")
                    .query_param("lat", "51.5")
                    .query_param("lon", "-0.12")
                    .query_param("appid", "KEY")
                    .query_param("units", "metric");
                then.status(200)
                    .header("content-type", "application/json")
                    .body(CURRENT_LONDON);
            })
            .await;

        let client = client_for(&server);
        let report = client
            .fetch_current(&QueryPath::current(london(), "KEY", Units::Metric))
            .await
            .expect("fetch should succeed");

        m.assert_async().await;
        assert_eq!(report.name.as_deref(), Some("London"));
    }

    #[tokio::test]
    async fn fetch_forecast_decodes_list() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/2.5/forecast");
                then.status(200).body(FORECAST_LONDON);
            })
            .await;

        let report = client_for(&server)
            .fetch_forecast(&QueryPath::forecast(london(), "KEY", Units::Metric))
            .await
            .expect("fetch should succeed");

        assert_eq!(report.list.len(), 2);
    }

    #[tokio::test]
    async fn unauthorized_is_an_http_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/2.5/weather");
                then.status(401)
                    .body(r#"{"cod":401,"message":"Invalid API key."}"#);
            })
            .await;

        let err = client_for(&server)
            .fetch_current(&QueryPath::current(london(), "BAD", Units::Metric))
            .await
            .unwrap_err();

        assert_eq!(err.status(), Some(StatusCode::UNAUTHORIZED));
        assert!(err.to_string().contains("Invalid API key"));
    }

    #[tokio::test]
    async fn malformed_body_is_a_decode_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/data/2.5/forecast");
                then.status(200).body("{\"city\": ");
            })
            .await;

        let err = client_for(&server)
            .fetch_forecast(&QueryPath::forecast(london(), "KEY", Units::Metric))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::Decode { .. }));
    }

    #[tokio::test]
    async fn unreachable_host_is_a_network_error() {
        // Port 9 (discard) is closed on test machines.
        let client = OpenWeatherClient::with_base_url("http://127.0.0.1:9/").expect("valid url");
        let err = client
            .fetch_current(&QueryPath::current(london(), "KEY", Units::Metric))
            .await
            .unwrap_err();

        assert!(matches!(err, WeatherError::Network(_)));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(500);
        let t = truncate_body(&body);
        assert_eq!(t.len(), 203);
        assert!(t.ends_with("..."));

        let multibyte = "é".repeat(150);
        assert!(truncate_body(&multibyte).ends_with("..."));
    }
}
