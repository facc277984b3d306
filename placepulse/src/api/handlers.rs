use axum::{extract::State, Json};
use serde_json::{json, Value};

use crate::api::AppState;
use crate::error::Result;
use crate::models::{
    CombinedDataset, CombinedRequest, EnrichRequest, EnrichmentResponse, HeatmapRequest,
    ScoredHeatmap,
};

pub async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

/// `POST /api/v1/insights/enrich`
///
/// Runs a place search, attaches demographic profiles (cache-or-fetch), and
/// returns the enriched items alongside aggregated age/gender scores.
pub async fn enrich(
    State(state): State<AppState>,
    Json(req): Json<EnrichRequest>,
) -> Result<Json<EnrichmentResponse>> {
    Ok(Json(state.enrichment.enrich_and_aggregate(req).await?))
}

/// `POST /api/v1/insights/combined`
pub async fn combined_data(
    State(state): State<AppState>,
    Json(req): Json<CombinedRequest>,
) -> Result<Json<CombinedDataset>> {
    Ok(Json(state.combined.combine(req).await?))
}

/// `POST /api/v1/insights/heatmap`
pub async fn scored_heatmap(
    State(state): State<AppState>,
    Json(req): Json<HeatmapRequest>,
) -> Result<Json<ScoredHeatmap>> {
    Ok(Json(state.heatmap.scored_heatmap(req).await?))
}
