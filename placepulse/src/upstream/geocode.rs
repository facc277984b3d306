use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::config::GeocodingConfig;
use crate::error::{PulseError, Result};
use crate::models::Coordinates;
use crate::upstream::GeocodingApi;

/// Substituted when a location name cannot be resolved. Callers that fall
/// back to this constant must surface a `used_default_location` flag so the
/// substitution is never silent. Points at lower Manhattan.
pub const DEFAULT_COORDINATES: Coordinates = Coordinates {
    lat: 40.7128,
    lng: -74.0060,
};

#[derive(Debug, Deserialize)]
struct GeocodeHit {
    lat: String,
    lon: String,
}

#[derive(Clone)]
pub struct GeocodingClient {
    client: Client,
    base_url: String,
}

impl GeocodingClient {
    pub fn new(config: &GeocodingConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent("placepulse/0.1")
            .build()
            .map_err(|e| PulseError::Geocoding(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }
}

#[async_trait]
impl GeocodingApi for GeocodingClient {
    async fn coordinates(&self, location: &str) -> Result<Coordinates> {
        let url = format!("{}/search", self.base_url);

        let resp = self
            .client
            .get(&url)
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(PulseError::Geocoding(format!(
                "Geocoding error {status}: {body}"
            )));
        }

        let hits: Vec<GeocodeHit> = resp
            .json()
            .await
            .map_err(|e| PulseError::Geocoding(format!("Failed to parse geocode response: {e}")))?;

        let hit = hits
            .into_iter()
            .next()
            .ok_or_else(|| PulseError::Geocoding(format!("No results for '{location}'")))?;

        let lat = hit
            .lat
            .parse()
            .map_err(|e| PulseError::Geocoding(format!("Invalid latitude '{}': {e}", hit.lat)))?;
        let lng = hit
            .lon
            .parse()
            .map_err(|e| PulseError::Geocoding(format!("Invalid longitude '{}': {e}", hit.lon)))?;

        Ok(Coordinates { lat, lng })
    }
}
