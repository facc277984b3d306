use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapLocation {
    pub lat: f64,
    pub lng: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub geohash: Option<String>,
}

/// Upstream-provided normalized signals (0-1). Any of them may be absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct HeatmapSignal {
    #[serde(default)]
    pub affinity: Option<f64>,
    #[serde(default)]
    pub affinity_rank: Option<f64>,
    #[serde(default)]
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeatmapPoint {
    pub location: HeatmapLocation,
    #[serde(default)]
    pub query: HeatmapSignal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Derived composite score; never upstream-provided.
    #[serde(default)]
    pub intensity: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapSummary {
    pub point_count: usize,
    pub mean_intensity: f64,
    pub top_category: Option<String>,
    /// Coarse planar bounding-box estimate (1 degree ~ 111 km), in km^2.
    pub area_km2: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredHeatmap {
    pub points: Vec<HeatmapPoint>,
    pub summary: HeatmapSummary,
}
