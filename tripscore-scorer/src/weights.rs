//! Weight renormalisation shared by every blend in the scorers.

use std::collections::BTreeMap;

/// Rescale weights so they sum to one.
///
/// Negative or non-finite weights count as zero. When nothing positive
/// remains the weights are split equally, so the result always sums to one
/// for a non-empty input.
///
/// # Examples
/// ```
/// use std::collections::BTreeMap;
/// use tripscore_scorer::normalise_weights;
///
/// let raw = BTreeMap::from([("a", 3.0), ("b", 1.0), ("c", -2.0)]);
/// let norm = normalise_weights(&raw);
/// assert!((norm[&"a"] - 0.75).abs() < 1e-9);
/// assert!(norm[&"c"].abs() < 1e-9);
/// ```
#[must_use]
pub fn normalise_weights<K: Ord + Clone>(weights: &BTreeMap<K, f64>) -> BTreeMap<K, f64> {
    let cleaned: BTreeMap<K, f64> = weights
        .iter()
        .map(|(k, w)| (k.clone(), sanitise_weight(*w)))
        .collect();
    let total: f64 = cleaned.values().sum();
    if total > 0.0 {
        return cleaned.into_iter().map(|(k, w)| (k, w / total)).collect();
    }
    let count = u32::try_from(cleaned.len()).unwrap_or(u32::MAX);
    if count == 0 {
        return cleaned;
    }
    let share = 1.0 / f64::from(count);
    cleaned.into_keys().map(|k| (k, share)).collect()
}

/// Clamp a weight to a finite, non-negative value.
#[must_use]
pub fn sanitise_weight(weight: f64) -> f64 {
    if weight.is_finite() { weight.max(0.0) } else { 0.0 }
}

/// Weighted mean of `(weight, score)` pairs.
///
/// Returns `None` when the positive weights sum to zero or less, which the
/// scorers treat as misconfigured weights.
#[must_use]
pub fn weighted_mean(parts: &[(f64, f64)]) -> Option<f64> {
    let (numerator, denominator) = parts.iter().fold((0.0, 0.0), |(num, den), (w, s)| {
        let weight = sanitise_weight(*w);
        (num + weight * s, den + weight)
    });
    (denominator > 0.0).then(|| numerator / denominator)
}
