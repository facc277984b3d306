use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::DemographicProfile;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// One place record from the upstream search API. Immutable once received;
/// unrecognized upstream fields ride along in `raw`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub entity_id: String,
    pub name: String,
    pub location: Coordinates,
    #[serde(default)]
    pub popularity: f64,
    #[serde(flatten)]
    pub raw: Map<String, Value>,
}

/// A search result with its demographic profile attached. `None` means the
/// lookup for this entity failed or upstream had no data; it is not an error
/// for the batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnrichedResult {
    #[serde(flatten)]
    pub result: SearchResult,
    pub demographics: Option<DemographicProfile>,
}
