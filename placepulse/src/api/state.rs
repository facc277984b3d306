use std::sync::Arc;

use crate::cache::DemographicCache;
use crate::config::Config;
use crate::services::{CombinedDataService, EnrichmentService, FetchPolicy, HeatmapService};
use crate::upstream::{GeocodingApi, InsightsApi};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub enrichment: EnrichmentService,
    pub heatmap: HeatmapService,
    pub combined: Arc<CombinedDataService>,
}

impl AppState {
    pub fn new(
        config: Config,
        insights: Arc<dyn InsightsApi>,
        geocoder: Arc<dyn GeocodingApi>,
        cache: DemographicCache,
    ) -> Self {
        let policy = FetchPolicy::from_config(&config.insights);
        let enrichment = EnrichmentService::new(insights.clone(), cache, policy);
        let heatmap = HeatmapService::new(insights.clone());
        let combined = Arc::new(CombinedDataService::new(insights, geocoder));

        Self {
            config: Arc::new(config),
            enrichment,
            heatmap,
            combined,
        }
    }
}
