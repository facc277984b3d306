use serde::Deserialize;

/// Parameters for the enrich-and-aggregate operation. `query`, `lat` and
/// `lng` are required; validation happens before any I/O.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EnrichRequest {
    pub query: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub page: Option<u32>,
    pub take: Option<u32>,
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct HeatmapRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub age: Option<String>,
    pub income: Option<String>,
}

/// Parameters for the combined-data operation. Either explicit coordinates
/// or a geocodable location name must be supplied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CombinedRequest {
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lng: Option<f64>,
    pub radius: Option<f64>,
    pub popularity: Option<f64>,
    pub age: Option<String>,
    pub income: Option<String>,
}
