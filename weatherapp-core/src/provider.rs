use async_trait::async_trait;
use std::fmt::{self, Debug};

use crate::{
    Config,
    error::WeatherResult,
    model::{Coordinates, CurrentWeatherReport, ForecastReport, Units},
};

pub mod openweather;

pub use openweather::OpenWeatherClient;

/// Provider endpoints the reducer needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Current,
    Forecast,
}

impl Endpoint {
    pub fn as_str(&self) -> &'static str {
        match self {
            Endpoint::Current => "weather",
            Endpoint::Forecast => "forecast",
        }
    }
}

/// Relative path and query string, appended to the provider's base URL.
///
/// Carries the coordinates, the API key and the unit system.
#[derive(Clone, PartialEq, Eq)]
pub struct QueryPath(String);

impl QueryPath {
    pub fn new(endpoint: Endpoint, at: Coordinates, api_key: &str, units: Units) -> Self {
        Self(format!(
            "{}?lat={}&lon={}&appid={}&units={}",
            endpoint.as_str(),
            at.latitude,
            at.longitude,
            api_key,
            units.as_str(),
        ))
    }

    pub fn current(at: Coordinates, api_key: &str, units: Units) -> Self {
        Self::new(Endpoint::Current, at, api_key, units)
    }

    pub fn forecast(at: Coordinates, api_key: &str, units: Units) -> Self {
        Self::new(Endpoint::Forecast, at, api_key, units)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The path with the `appid` value masked, for logs.
    pub fn redacted(&self) -> String {
        redact_appid(&self.0)
    }
}

impl From<&str> for QueryPath {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// Keeps the API key out of `{:?}` output.
impl Debug for QueryPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("QueryPath").field(&self.redacted()).finish()
    }
}

pub(crate) fn redact_appid(s: &str) -> String {
    match s.find("appid=") {
        Some(start) => {
            let value_start = start + "appid=".len();
            let value_end = s[value_start..]
                .find('&')
                .map(|i| value_start + i)
                .unwrap_or(s.len());
            format!("{}***{}", &s[..value_start], &s[value_end..])
        }
        None => s.to_string(),
    }
}

/// Source of current and forecast reports.
///
/// A thin pass-through: no retry, no caching. The reducer owns any policy.
#[async_trait]
pub trait WeatherSource: Send + Sync + Debug {
    async fn fetch_current(&self, path: &QueryPath) -> WeatherResult<CurrentWeatherReport>;

    async fn fetch_forecast(&self, path: &QueryPath) -> WeatherResult<ForecastReport>;
}

/// Build the OpenWeather client described by `config`.
pub fn source_from_config(config: &Config) -> anyhow::Result<OpenWeatherClient> {
    OpenWeatherClient::with_base_url(config.base_url())
}
