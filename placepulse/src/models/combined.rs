use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::Coordinates;

/// A normalized point record for visualization. `synthetic` marks records
/// injected by the fallback generator rather than returned by a live source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CombinedPoint {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
    pub score: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default)]
    pub synthetic: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CombinedDataset {
    /// High-scoring places (score > 0.7).
    pub popularity: Vec<CombinedPoint>,
    /// Everything else near the user's location.
    pub user_location: Vec<CombinedPoint>,
    /// Heatmap-derived demographic signal points.
    pub demographics: Vec<CombinedPoint>,
    /// One bucket per originating search category.
    pub categories: HashMap<String, Vec<CombinedPoint>>,
    pub center: Coordinates,
    /// True when geocoding failed and the documented default coordinates
    /// were substituted for the requested location.
    pub used_default_location: bool,
}
