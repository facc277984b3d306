use std::sync::Arc;
use std::time::Duration;

use futures::future;

use crate::cache::DemographicCache;
use crate::config::InsightsConfig;
use crate::error::{PulseError, Result};
use crate::models::{
    DemographicProfile, EnrichRequest, EnrichedResult, EnrichmentResponse, SearchResult,
};
use crate::services::aggregate;
use crate::upstream::{InsightsApi, SearchParams};

const DEFAULT_RADIUS: f64 = 10.0;
const DEFAULT_TAKE: u32 = 10;
const DEFAULT_POPULARITY: f64 = 0.3;

/// Timing knobs for demographic lookups, injectable so tests run fast.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    /// Blanket throttle before every demographics call, hit or miss.
    pub pre_call_delay: Duration,
    /// Wait before the single retry after a rate-limit signal.
    pub rate_limit_backoff: Duration,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            pre_call_delay: Duration::from_millis(100),
            rate_limit_backoff: Duration::from_secs(2),
        }
    }
}

impl FetchPolicy {
    pub fn from_config(config: &InsightsConfig) -> Self {
        Self {
            pre_call_delay: Duration::from_millis(config.pre_call_delay_ms),
            rate_limit_backoff: Duration::from_millis(config.rate_limit_backoff_ms),
        }
    }
}

#[derive(Clone)]
pub struct EnrichmentService {
    insights: Arc<dyn InsightsApi>,
    cache: DemographicCache,
    policy: FetchPolicy,
}

impl EnrichmentService {
    pub fn new(
        insights: Arc<dyn InsightsApi>,
        cache: DemographicCache,
        policy: FetchPolicy,
    ) -> Self {
        Self {
            insights,
            cache,
            policy,
        }
    }

    /// One upstream demographics call with the rate-limit policy applied:
    /// throttle, call, and on a rate-limit signal wait once and retry once.
    /// A failed retry degrades to `Ok(None)`; any other transport or auth
    /// failure propagates.
    pub async fn fetch_demographics(&self, entity_id: &str) -> Result<Option<DemographicProfile>> {
        tokio::time::sleep(self.policy.pre_call_delay).await;

        match self.insights.demographics(entity_id).await {
            Ok(profile) => Ok(profile),
            Err(PulseError::RateLimited { retry_after }) => {
                tracing::debug!(
                    entity_id,
                    ?retry_after,
                    "Rate limited, retrying once after backoff"
                );
                tokio::time::sleep(self.policy.rate_limit_backoff).await;

                match self.insights.demographics(entity_id).await {
                    Ok(profile) => Ok(profile),
                    Err(e) => {
                        tracing::warn!(
                            entity_id,
                            error = %e,
                            "Demographics retry failed, returning no data"
                        );
                        Ok(None)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Cache-or-fetch for one entity. Never fails: cache read errors fall
    /// through to the fetch, fetch errors degrade to `None` for this slot.
    async fn lookup(&self, entity_id: &str) -> Option<DemographicProfile> {
        match self.cache.get(entity_id).await {
            Ok(Some(profile)) => return Some(profile),
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(entity_id, error = %e, "Cache read failed, fetching instead");
            }
        }

        match self.fetch_demographics(entity_id).await {
            Ok(Some(profile)) => {
                if let Err(e) = self.cache.put(entity_id, profile.clone()).await {
                    tracing::warn!(entity_id, error = %e, "Cache write failed");
                }
                Some(profile)
            }
            Ok(None) => None,
            Err(e) => {
                tracing::warn!(entity_id, error = %e, "Demographic lookup degraded to null");
                None
            }
        }
    }

    /// Attaches demographic profiles to a batch of search results. All
    /// lookups run concurrently; the output is index-aligned with the input
    /// and a single lookup's failure never aborts the batch. Duplicate
    /// entity ids are looked up independently, one per position.
    pub async fn enrich(&self, results: Vec<SearchResult>) -> Vec<EnrichedResult> {
        let lookups = results.iter().map(|result| self.lookup(&result.entity_id));
        let profiles = future::join_all(lookups).await;

        results
            .into_iter()
            .zip(profiles)
            .map(|(result, demographics)| EnrichedResult {
                result,
                demographics,
            })
            .collect()
    }

    pub async fn enrich_and_aggregate(&self, req: EnrichRequest) -> Result<EnrichmentResponse> {
        let query = req.query.as_deref().map(str::trim).unwrap_or_default();
        if query.is_empty() {
            return Err(PulseError::Validation("query is required".to_string()));
        }

        let (lat, lng) = match (req.lat, req.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            _ => {
                return Err(PulseError::Validation(
                    "lat and lng coordinates are required".to_string(),
                ))
            }
        };

        let params = SearchParams {
            query: query.to_string(),
            lat,
            lng,
            radius: req.radius.unwrap_or(DEFAULT_RADIUS),
            page: req.page.unwrap_or(1),
            take: req.take.unwrap_or(DEFAULT_TAKE),
            popularity: req.popularity.unwrap_or(DEFAULT_POPULARITY),
        };

        let results = self.insights.search(&params).await?;
        tracing::debug!(count = results.len(), query, "Enriching search results");

        let items = self.enrich(results).await;
        let profiles: Vec<Option<DemographicProfile>> =
            items.iter().map(|item| item.demographics.clone()).collect();
        let scores = aggregate(&profiles);

        Ok(EnrichmentResponse {
            items,
            aggregated_age_scores: scores.age,
            aggregated_gender_scores: scores.gender,
        })
    }
}
