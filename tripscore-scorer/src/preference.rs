//! Preference match: overlap between destination tags and tag weights.

use std::collections::BTreeMap;

use serde_json::Value;
use tripscore_core::{Destination, Details, FeatureScore};

use crate::fallback::{Fallback, fail_open};

/// Score how well the destination's tags match `tag_weights`.
///
/// Only strictly positive weights count; avoidance is handled by tag
/// filters before scoring, so negative weights are inert here.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use tripscore_core::{Destination, GeoPoint};
/// use tripscore_scorer::score_preference;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let dest = Destination::new("a", "Museum", GeoPoint::new(25.0, 121.5)?, ["culture", "food"])?;
/// let weights = BTreeMap::from([("culture".to_owned(), 0.8), ("food".to_owned(), -0.5)]);
/// let scored = score_preference(&dest, &weights, 0.5, 6);
/// assert!((scored.score - 1.0).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn score_preference(
    destination: &Destination,
    tag_weights: &BTreeMap<String, f64>,
    neutral: f64,
    max_reason_tags: usize,
) -> FeatureScore {
    let positive: BTreeMap<&str, f64> = tag_weights
        .iter()
        .filter(|(_, w)| w.is_finite() && **w > 0.0)
        .map(|(tag, w)| (tag.as_str(), *w))
        .collect();
    let possible: f64 = positive.values().sum();
    let matched: Vec<&str> = destination
        .tags
        .iter()
        .map(String::as_str)
        .filter(|tag| positive.contains_key(tag))
        .collect();
    let matched_weight: f64 = matched
        .iter()
        .filter_map(|tag| positive.get(tag))
        .sum();

    let mut details = Details::new();
    details.insert(
        "matched_tags".to_owned(),
        Value::from(matched.iter().map(|t| Value::from(*t)).collect::<Vec<_>>()),
    );
    details.insert(
        "tag_weights_used".to_owned(),
        Value::Object(
            positive
                .iter()
                .map(|(tag, w)| ((*tag).to_owned(), Value::from(*w)))
                .collect(),
        ),
    );

    if possible <= 0.0 {
        return fail_open(
            neutral,
            Fallback::NoSignal("No positive tag weights"),
            details,
            Vec::new(),
        );
    }

    let reason = if matched.is_empty() {
        "No strong tag match".to_owned()
    } else {
        let shown: Vec<&str> = matched.iter().copied().take(max_reason_tags.max(1)).collect();
        format!("Matches: {}", shown.join(", "))
    };
    FeatureScore::new(matched_weight / possible, vec![reason], details)
}
