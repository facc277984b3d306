use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::{PulseError, Result};
use crate::models::{
    CombinedDataset, CombinedPoint, CombinedRequest, Coordinates, HeatmapPoint, SearchResult,
};
use crate::services::heatmap;
use crate::upstream::{GeocodingApi, HeatmapParams, InsightsApi, SearchParams, DEFAULT_COORDINATES};

/// Fixed category terms queried on every combine, each as its own search.
const SEARCH_CATEGORIES: [&str; 5] = ["restaurant", "cafe", "coffee shop", "hotel", "shopping"];

/// Places scoring above this land in the `popularity` bucket; the rest in
/// `user_location`.
const POPULARITY_SPLIT: f64 = 0.7;

/// Category searches run with the requested popularity threshold scaled down
/// to widen recall, floored so the upstream still filters junk.
const RECALL_WIDENING_FACTOR: f64 = 0.5;
const MIN_CATEGORY_POPULARITY: f64 = 0.1;

const DEFAULT_POPULARITY: f64 = 0.3;
const DEFAULT_RADIUS: f64 = 10.0;
const CATEGORY_TAKE: u32 = 10;

/// Synthetic fallback points are jittered within this many degrees of the
/// resolved center.
const SYNTHETIC_JITTER_DEGREES: f64 = 0.01;
const SYNTHETIC_LABELS: [&str; 5] = [
    "Neighborhood favorite",
    "Local hotspot",
    "Quiet corner",
    "Busy junction",
    "Hidden gem",
];

/// Builds the composite search + heatmap + synthetic-fallback dataset for
/// visualization. Category and heatmap slices degrade to empty on failure;
/// only missing input parameters fail the whole operation.
pub struct CombinedDataService {
    insights: Arc<dyn InsightsApi>,
    geocoder: Arc<dyn GeocodingApi>,
    rng: Mutex<StdRng>,
}

impl CombinedDataService {
    pub fn new(insights: Arc<dyn InsightsApi>, geocoder: Arc<dyn GeocodingApi>) -> Self {
        Self::with_rng(insights, geocoder, StdRng::from_entropy())
    }

    /// Injectable RNG so tests can assert on the fallback deterministically.
    pub fn with_rng(
        insights: Arc<dyn InsightsApi>,
        geocoder: Arc<dyn GeocodingApi>,
        rng: StdRng,
    ) -> Self {
        Self {
            insights,
            geocoder,
            rng: Mutex::new(rng),
        }
    }

    pub async fn combine(&self, req: CombinedRequest) -> Result<CombinedDataset> {
        let (center, used_default_location) = self.resolve_center(&req).await?;

        let popularity_floor = (req.popularity.unwrap_or(DEFAULT_POPULARITY)
            * RECALL_WIDENING_FACTOR)
            .max(MIN_CATEGORY_POPULARITY);
        let radius = req.radius.unwrap_or(DEFAULT_RADIUS);

        let searches = future::join_all(SEARCH_CATEGORIES.iter().map(|category| {
            let params = SearchParams {
                query: category.to_string(),
                lat: center.lat,
                lng: center.lng,
                radius,
                page: 1,
                take: CATEGORY_TAKE,
                popularity: popularity_floor,
            };
            async move {
                match self.insights.search(&params).await {
                    Ok(results) => (*category, results),
                    Err(e) => {
                        tracing::warn!(category, error = %e, "Category search failed, using empty slice");
                        (*category, Vec::new())
                    }
                }
            }
        }));

        let heatmap_slice = async {
            let params = HeatmapParams {
                lat: center.lat,
                lng: center.lng,
                radius: Some(radius),
                age: req.age.clone(),
                income: req.income.clone(),
            };
            match self.insights.heatmap(&params).await {
                Ok(points) => points,
                Err(e) => {
                    tracing::warn!(error = %e, "Heatmap query failed, using empty slice");
                    Vec::new()
                }
            }
        };

        let (category_results, heatmap_points) = tokio::join!(searches, heatmap_slice);

        let mut dataset = CombinedDataset {
            popularity: Vec::new(),
            user_location: Vec::new(),
            demographics: heatmap_points.iter().map(signal_point).collect(),
            categories: HashMap::new(),
            center,
            used_default_location,
        };

        for (category, results) in category_results {
            for place in results {
                let point = place_point(&place, category);
                dataset
                    .categories
                    .entry(category.to_string())
                    .or_default()
                    .push(point.clone());
                bucket(&mut dataset, point);
            }
        }

        if dataset.popularity.is_empty() && dataset.user_location.is_empty() {
            tracing::warn!(
                lat = center.lat,
                lng = center.lng,
                "No live places returned, injecting synthetic fallback data"
            );
            for point in self.synthetic_points(center) {
                bucket(&mut dataset, point);
            }
        }

        Ok(dataset)
    }

    /// Explicit coordinates win; otherwise the location name is geocoded.
    /// Geocoding failure substitutes `DEFAULT_COORDINATES` and flags the
    /// dataset, so the fallback is never silent. A request with neither
    /// coordinates nor a location name is rejected before any I/O.
    async fn resolve_center(&self, req: &CombinedRequest) -> Result<(Coordinates, bool)> {
        if let (Some(lat), Some(lng)) = (req.lat, req.lng) {
            if lat.is_finite() && lng.is_finite() {
                return Ok((Coordinates { lat, lng }, false));
            }
        }

        let location = req
            .location
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                PulseError::Validation(
                    "a location name or lat/lng coordinates are required".to_string(),
                )
            })?;

        match self.geocoder.coordinates(location).await {
            Ok(coords) => Ok((coords, false)),
            Err(e) => {
                tracing::warn!(location, error = %e, "Geocoding failed, using default coordinates");
                Ok((DEFAULT_COORDINATES, true))
            }
        }
    }

    fn synthetic_points(&self, center: Coordinates) -> Vec<CombinedPoint> {
        let mut rng = self.rng.lock().unwrap();

        SYNTHETIC_LABELS
            .iter()
            .map(|label| CombinedPoint {
                name: label.to_string(),
                lat: center.lat
                    + rng.gen_range(-SYNTHETIC_JITTER_DEGREES..=SYNTHETIC_JITTER_DEGREES),
                lng: center.lng
                    + rng.gen_range(-SYNTHETIC_JITTER_DEGREES..=SYNTHETIC_JITTER_DEGREES),
                score: rng.gen_range(0.45..0.95),
                category: None,
                synthetic: true,
            })
            .collect()
    }
}

fn bucket(dataset: &mut CombinedDataset, point: CombinedPoint) {
    if point.score > POPULARITY_SPLIT {
        dataset.popularity.push(point);
    } else {
        dataset.user_location.push(point);
    }
}

fn place_point(place: &SearchResult, category: &str) -> CombinedPoint {
    CombinedPoint {
        name: place.name.clone(),
        lat: place.location.lat,
        lng: place.location.lng,
        score: place.popularity,
        category: Some(category.to_string()),
        synthetic: false,
    }
}

fn signal_point(point: &HeatmapPoint) -> CombinedPoint {
    CombinedPoint {
        name: point
            .location
            .geohash
            .clone()
            .unwrap_or_else(|| "signal".to_string()),
        lat: point.location.lat,
        lng: point.location.lng,
        score: heatmap::intensity(&point.query),
        category: point.category.clone(),
        synthetic: false,
    }
}
