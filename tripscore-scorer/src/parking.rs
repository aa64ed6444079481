//! Parking availability near a destination, used as a congestion proxy by
//! the context scorer.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tripscore_core::settings::ParkingSettings;
use tripscore_core::{Details, FeatureScore, Metric};

use crate::accessibility::capped_ratio;
use crate::metrics::ParkingMetrics;
use crate::weights::normalise_weights;
use crate::{detail, format_distance};

/// Score car-park supply around a destination.
///
/// When free-space counts are unavailable the availability weight drops to
/// zero and the lot count carries the whole score.
#[must_use]
pub fn score_parking(metrics: &ParkingMetrics, settings: &ParkingSettings) -> FeatureScore {
    let lot_score = capped_ratio(f64::from(metrics.lots), settings.lot_cap);
    let available_score = metrics
        .available_spaces
        .map(|n| capped_ratio(f64::from(n), settings.available_spaces_cap));
    let raw: BTreeMap<&str, f64> = [
        ("lots", settings.weights.lots),
        (
            "available_spaces",
            if available_score.is_available() {
                settings.weights.available_spaces
            } else {
                0.0
            },
        ),
    ]
    .into_iter()
    .collect();
    let weights = normalise_weights(&raw);
    let weight = |key: &str| weights.get(key).copied().unwrap_or(0.0);
    let score = weight("lots") * lot_score
        + weight("available_spaces") * available_score.into_option().unwrap_or(0.0);

    let mut reasons = vec![format!(
        "{} parking lots within {:.0}m",
        metrics.lots, settings.radius_m
    )];
    reasons.push(match metrics.available_spaces {
        Metric::Value(n) => format!("Available spaces nearby: {n}"),
        Metric::Unavailable => "Parking availability unavailable".to_owned(),
    });
    if metrics.nearest_m.is_finite() {
        reasons.push(format!(
            "Nearest parking lot ~{}",
            format_distance(metrics.nearest_m)
        ));
    }

    let mut details = Details::new();
    details.insert("metrics".to_owned(), detail(metrics));
    details.insert("lot_score".to_owned(), Value::from(lot_score));
    details.insert("available_score".to_owned(), detail(&available_score));
    details.insert(
        "weights".to_owned(),
        json!({ "lots": weight("lots"), "available_spaces": weight("available_spaces") }),
    );
    FeatureScore::new(score, reasons, details)
}
