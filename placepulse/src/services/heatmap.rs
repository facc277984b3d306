use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{PulseError, Result};
use crate::models::{HeatmapPoint, HeatmapRequest, HeatmapSignal, HeatmapSummary, ScoredHeatmap};
use crate::upstream::{HeatmapParams, InsightsApi};

const AFFINITY_WEIGHT: f64 = 0.4;
const AFFINITY_RANK_WEIGHT: f64 = 0.3;
const POPULARITY_WEIGHT: f64 = 0.3;
/// Substituted for any missing signal, in both the intensity formula and the
/// quality filter.
const DEFAULT_SIGNAL: f64 = 0.5;

const MIN_AFFINITY: f64 = 0.85;
const MIN_POPULARITY: f64 = 0.2;

/// 1 degree of latitude or longitude ~ 111 km. Planar approximation; the
/// resulting area is a rough figure, not geodesically exact.
const KM_PER_DEGREE: f64 = 111.0;

/// Composite intensity: fixed weighted sum of the three upstream signals.
pub fn intensity(signal: &HeatmapSignal) -> f64 {
    let affinity = signal.affinity.unwrap_or(DEFAULT_SIGNAL);
    let affinity_rank = signal.affinity_rank.unwrap_or(DEFAULT_SIGNAL);
    let popularity = signal.popularity.unwrap_or(DEFAULT_SIGNAL);

    AFFINITY_WEIGHT * affinity
        + AFFINITY_RANK_WEIGHT * affinity_rank
        + POPULARITY_WEIGHT * popularity
}

/// Scores every point and drops those failing the quality thresholds.
/// Filtering happens before any summary statistic is computed.
pub fn score_points(points: Vec<HeatmapPoint>) -> Vec<HeatmapPoint> {
    points
        .into_iter()
        .filter_map(|mut point| {
            point.intensity = intensity(&point.query);

            let affinity = point.query.affinity.unwrap_or(DEFAULT_SIGNAL);
            let popularity = point.query.popularity.unwrap_or(DEFAULT_SIGNAL);
            (affinity > MIN_AFFINITY && popularity > MIN_POPULARITY).then_some(point)
        })
        .collect()
}

/// Summary statistics over an already-filtered point set.
pub fn summarize(points: &[HeatmapPoint]) -> HeatmapSummary {
    let point_count = points.len();

    let mean_intensity = if point_count == 0 {
        0.0
    } else {
        points.iter().map(|p| p.intensity).sum::<f64>() / point_count as f64
    };

    let mut category_counts: HashMap<&str, usize> = HashMap::new();
    for point in points {
        if let Some(ref category) = point.category {
            *category_counts.entry(category.as_str()).or_default() += 1;
        }
    }
    let top_category = category_counts
        .into_iter()
        .max_by_key(|(category, count)| (*count, std::cmp::Reverse(*category)))
        .map(|(category, _)| category.to_string());

    let area_km2 = if point_count == 0 {
        0.0
    } else {
        let lats = points.iter().map(|p| p.location.lat);
        let lngs = points.iter().map(|p| p.location.lng);
        let lat_range = lats.clone().fold(f64::MIN, f64::max) - lats.fold(f64::MAX, f64::min);
        let lng_range = lngs.clone().fold(f64::MIN, f64::max) - lngs.fold(f64::MAX, f64::min);
        lat_range * lng_range * KM_PER_DEGREE * KM_PER_DEGREE
    };

    HeatmapSummary {
        point_count,
        mean_intensity,
        top_category,
        area_km2,
    }
}

#[derive(Clone)]
pub struct HeatmapService {
    insights: Arc<dyn InsightsApi>,
}

impl HeatmapService {
    pub fn new(insights: Arc<dyn InsightsApi>) -> Self {
        Self { insights }
    }

    /// Fetches the raw heatmap for a point, then scores, filters and
    /// summarizes it. The heatmap call is the single prerequisite here, so
    /// its failure fails the operation.
    pub async fn scored_heatmap(&self, req: HeatmapRequest) -> Result<ScoredHeatmap> {
        let (lat, lng) = match (req.lat, req.lng) {
            (Some(lat), Some(lng)) if lat.is_finite() && lng.is_finite() => (lat, lng),
            _ => {
                return Err(PulseError::Validation(
                    "lat and lng coordinates are required".to_string(),
                ))
            }
        };

        let raw = self
            .insights
            .heatmap(&HeatmapParams {
                lat,
                lng,
                radius: req.radius,
                age: req.age,
                income: req.income,
            })
            .await?;

        let points = score_points(raw);
        let summary = summarize(&points);
        tracing::debug!(
            retained = summary.point_count,
            mean_intensity = summary.mean_intensity,
            "Scored heatmap"
        );

        Ok(ScoredHeatmap { points, summary })
    }
}
