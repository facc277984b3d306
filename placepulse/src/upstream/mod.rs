mod geocode;
mod insights;

pub use geocode::{GeocodingClient, DEFAULT_COORDINATES};
pub use insights::InsightsClient;

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Coordinates, DemographicProfile, HeatmapPoint, SearchResult};

#[derive(Debug, Clone)]
pub struct SearchParams {
    pub query: String,
    pub lat: f64,
    pub lng: f64,
    pub radius: f64,
    pub page: u32,
    pub take: u32,
    pub popularity: f64,
}

#[derive(Debug, Clone, Default)]
pub struct HeatmapParams {
    pub lat: f64,
    pub lng: f64,
    pub radius: Option<f64>,
    pub age: Option<String>,
    pub income: Option<String>,
}

/// The location-intelligence upstream. One HTTP call per method, parsed JSON
/// out, transport errors surfaced as `PulseError`; rate limiting is a
/// distinguishable error so callers can apply their own retry policy.
#[async_trait]
pub trait InsightsApi: Send + Sync {
    async fn search(&self, params: &SearchParams) -> Result<Vec<SearchResult>>;

    /// `Ok(None)` means upstream has no demographic data for this entity;
    /// it is not an error.
    async fn demographics(&self, entity_id: &str) -> Result<Option<DemographicProfile>>;

    async fn heatmap(&self, params: &HeatmapParams) -> Result<Vec<HeatmapPoint>>;
}

#[async_trait]
pub trait GeocodingApi: Send + Sync {
    async fn coordinates(&self, location: &str) -> Result<Coordinates>;
}
