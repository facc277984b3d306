use std::collections::HashMap;

use serde_json::Value;

use crate::models::{AggregateScores, DemographicProfile, DemographicQuery};

/// Reduces a batch of demographic profiles into averaged per-bucket scores.
///
/// Null profiles are skipped. For every bucket key seen in any profile, the
/// mean is taken over the profiles that actually supplied a numeric value
/// for that key -- the denominator is the observation count, never the batch
/// size. Non-numeric values do not contribute to sum or denominator.
pub fn aggregate(profiles: &[Option<DemographicProfile>]) -> AggregateScores {
    AggregateScores {
        age: mean_by_bucket(profiles, |query| &query.age),
        gender: mean_by_bucket(profiles, |query| &query.gender),
    }
}

fn mean_by_bucket<F>(
    profiles: &[Option<DemographicProfile>],
    select: F,
) -> HashMap<String, f64>
where
    F: for<'a> Fn(&'a DemographicQuery) -> &'a HashMap<String, Value>,
{
    let mut sums: HashMap<String, (f64, u32)> = HashMap::new();

    for profile in profiles.iter().flatten() {
        for (bucket, value) in select(&profile.query) {
            if let Some(score) = value.as_f64() {
                let slot = sums.entry(bucket.clone()).or_insert((0.0, 0));
                slot.0 += score;
                slot.1 += 1;
            }
        }
    }

    sums.into_iter()
        .map(|(bucket, (sum, count))| (bucket, sum / count as f64))
        .collect()
}
