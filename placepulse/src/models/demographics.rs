use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use super::EnrichedResult;

/// Per-bucket affinity scores as delivered by upstream. Values stay as raw
/// JSON because upstream occasionally ships non-numeric entries, which the
/// aggregator must skip without counting them as observations.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DemographicQuery {
    #[serde(default)]
    pub age: HashMap<String, Value>,
    #[serde(default)]
    pub gender: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemographicProfile {
    pub entity_id: String,
    #[serde(default)]
    pub query: DemographicQuery,
}

/// One record of the persisted cache document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheEntry {
    pub data: DemographicProfile,
    pub timestamp: DateTime<Utc>,
    pub session_id: String,
}

/// Arithmetic mean per bucket over the profiles that actually supplied a
/// numeric value for that bucket. Buckets with zero observations are absent.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateScores {
    pub age: HashMap<String, f64>,
    pub gender: HashMap<String, f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnrichmentResponse {
    pub items: Vec<EnrichedResult>,
    pub aggregated_age_scores: HashMap<String, f64>,
    pub aggregated_gender_scores: HashMap<String, f64>,
}
