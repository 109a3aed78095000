//! BRouter HTTP client.

use anyhow::{Context, Result};
use reqwest::Client;
use std::time::Duration;
use velo_core::{LegRoute, Point, Profile, RouteError, RoutingGateway};

use crate::response::parse_route_response;

/// Local BRouter server default.
pub const DEFAULT_BASE_URL: &str = "http://localhost:17777";

/// HTTP client for a BRouter instance.
#[derive(Debug, Clone)]
pub struct BRouterClient {
    client: Client,
    base_url: String,
}

impl BRouterClient {
    /// Create a client for `base_url` with a per-request timeout.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Request URL for one leg. BRouter takes `lng,lat` pairs.
    pub fn route_url(&self, start: Point, end: Point, profile: Profile) -> String {
        format!(
            "{}/brouter?lonlats={},{}|{},{}&profile={}&format=geojson",
            self.base_url,
            start.lng,
            start.lat,
            end.lng,
            end.lat,
            profile.id()
        )
    }

    /// Fetch the routed path between `start` and `end`.
    pub async fn fetch_route(&self, start: Point, end: Point, profile: Profile) -> Result<LegRoute, RouteError> {
        let url = self.route_url(start, end, profile);
        tracing::debug!("Requesting leg {} -> {} ({})", start, end, profile);

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| RouteError::FetchFailure(format!("request to {} failed: {}", self.base_url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RouteError::FetchFailure(format!(
                "routing service returned {}: {}",
                status,
                body.trim()
            )));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| RouteError::FetchFailure(format!("failed to read route response: {}", e)))?;
        parse_route_response(&body)
    }
}

impl RoutingGateway for BRouterClient {
    async fn fetch_leg(&self, start: Point, end: Point, profile: Profile) -> Result<LegRoute, RouteError> {
        self.fetch_route(start, end, profile).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_url_uses_lng_lat_order() {
        let client = BRouterClient::new("http://localhost:17777/", Duration::from_secs(5)).unwrap();
        let url = client.route_url(Point::new(48.1, 9.2), Point::new(48.3, 9.4), Profile::FastbikeLowTraffic);
        assert_eq!(
            url,
            "http://localhost:17777/brouter?lonlats=9.2,48.1|9.4,48.3&profile=fastbike-verylowtraffic&format=geojson"
        );
    }
}
