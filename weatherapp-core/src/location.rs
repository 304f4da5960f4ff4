use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::model::Coordinates;

/// Best-effort, single-shot source of the device location.
///
/// `None` covers both "permission denied" and "no fix available"; callers must
/// cope with never getting a location.
#[async_trait]
pub trait LocationProvider: Send + Sync {
    async fn last_known_location(&self) -> Option<Coordinates>;
}

/// A location chosen up front (command line or config file).
#[derive(Debug, Clone, Copy)]
pub struct FixedLocation(pub Option<Coordinates>);

#[async_trait]
impl LocationProvider for FixedLocation {
    async fn last_known_location(&self) -> Option<Coordinates> {
        self.0
    }
}

pub const IP_API_URL: &str = "http://ip-api.com/json/?fields=status,message,city,country,lat,lon";

/// Coarse location from the public IP address, via ip-api.com.
#[derive(Debug, Clone)]
pub struct IpApiLocation {
    url: String,
    http: Client,
}

#[derive(Debug, Deserialize)]
struct IpApiResponse {
    status: String,
    message: Option<String>,
    city: Option<String>,
    country: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl IpApiLocation {
    pub fn new() -> Self {
        Self::with_url(IP_API_URL)
    }

    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            http: Client::new(),
        }
    }

    async fn lookup(&self) -> anyhow::Result<Option<Coordinates>> {
        let res: IpApiResponse = self
            .http
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if res.status != "success" {
            warn!(
                "IP geolocation refused: {}",
                res.message.as_deref().unwrap_or("no reason given")
            );
            return Ok(None);
        }

        debug!(city = ?res.city, country = ?res.country, "IP geolocation");

        Ok(res.lat.zip(res.lon).map(|(lat, lon)| Coordinates::new(lat, lon)))
    }
}

impl Default for IpApiLocation {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LocationProvider for IpApiLocation {
    async fn last_known_location(&self) -> Option<Coordinates> {
        match self.lookup().await {
            Ok(found) => found,
            Err(e) => {
                warn!("IP geolocation failed: {e:#}");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    #[tokio::test]
    async fn fixed_location_returns_what_it_was_given() {
        let at = Coordinates::new(48.85, 2.35);
        assert_eq!(FixedLocation(Some(at)).last_known_location().await, Some(at));
        assert_eq!(FixedLocation(None).last_known_location().await, None);
    }

    #[tokio::test]
    async fn ip_api_success_yields_coordinates() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json/");
                then.status(200).body(
                    r#"{"status":"success","city":"Lyon","country":"France","lat":45.75,"lon":4.85}"#,
                );
            })
            .await;

        let provider = IpApiLocation::with_url(server.url("/json/"));
        assert_eq!(
            provider.last_known_location().await,
            Some(Coordinates::new(45.75, 4.85))
        );
    }

    #[tokio::test]
    async fn ip_api_failure_yields_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json/");
                then.status(200)
                    .body(r#"{"status":"fail","message":"reserved range"}"#);
            })
            .await;

        let provider = IpApiLocation::with_url(server.url("/json/"));
        assert_eq!(provider.last_known_location().await, None);
    }

    #[tokio::test]
    async fn ip_api_server_error_yields_none() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/json/");
                then.status(503);
            })
            .await;

        let provider = IpApiLocation::with_url(server.url("/json/"));
        assert_eq!(provider.last_known_location().await, None);
    }
}
