//! Accessibility: local transit around the destination blended with
//! proximity to the trip origin.

use std::collections::BTreeMap;

use serde_json::{Value, json};
use tripscore_core::settings::{AccessibilitySettings, BikeSignalSettings, TransitSignalSettings};
use tripscore_core::{Details, FeatureScore, Metric, Settings, clamp01};

use crate::fallback::{Fallback, fail_open};
use crate::metrics::{AccessibilityMetrics, BikeSignal, StopSignal};
use crate::weights::{normalise_weights, weighted_mean};
use crate::{detail, format_distance};

/// Caps below this are treated as this.
const CAP_FLOOR: f64 = 1.0;

/// `min(value, cap) / cap` with the cap floored.
pub(crate) fn capped_ratio(value: f64, cap: f64) -> f64 {
    let floored = cap.max(CAP_FLOOR);
    clamp01(value.min(floored) / floored)
}

/// Wording for a stop-based signal.
struct StopKind {
    name: &'static str,
    label: &'static str,
    noun: &'static str,
    plural: &'static str,
}

const BUS: StopKind = StopKind {
    name: "bus",
    label: "Bus stop",
    noun: "bus stop",
    plural: "bus stops",
};

const METRO: StopKind = StopKind {
    name: "metro",
    label: "Metro station",
    noun: "metro station",
    plural: "metro stations",
};

/// One local transit signal after scoring.
struct SignalOutcome {
    name: &'static str,
    /// `None` when the dataset was unavailable.
    score: Option<f64>,
    reasons: Vec<String>,
    details: Value,
}

impl SignalOutcome {
    fn unavailable(name: &'static str, label: &str) -> Self {
        Self {
            name,
            score: None,
            reasons: vec![format!("{label} data unavailable; signal excluded")],
            details: json!({ "available": false }),
        }
    }
}

fn stop_outcome(
    kind: &StopKind,
    signal: Metric<StopSignal>,
    cfg: &TransitSignalSettings,
    neutral: f64,
) -> SignalOutcome {
    let Some(stop) = signal.into_option() else {
        return SignalOutcome::unavailable(kind.name, kind.label);
    };
    let count_score = capped_ratio(f64::from(stop.count), cfg.count_cap);
    let distance_score = 1.0 - capped_ratio(stop.nearest_m, cfg.distance_cap_m);
    let nearest = if stop.nearest_m.is_finite() {
        format!("Nearest {} ~{}", kind.noun, format_distance(stop.nearest_m))
    } else {
        format!("No {} found nearby", kind.noun)
    };
    let (score, reasons) = match weighted_mean(&[
        (cfg.weights.count, count_score),
        (cfg.weights.distance, distance_score),
    ]) {
        Some(mean) => (
            clamp01(mean),
            vec![
                format!("{} {} within {:.0}m", stop.count, kind.plural, cfg.radius_m),
                nearest,
            ],
        ),
        None => (neutral, vec![Fallback::Misconfigured(kind.label).reason()]),
    };
    SignalOutcome {
        name: kind.name,
        score: Some(score),
        reasons,
        details: json!({
            "available": true,
            "within_radius": stop.count,
            "nearest_m": detail(&stop.nearest_m),
            "radius_m": cfg.radius_m,
            "count_score": count_score,
            "distance_score": distance_score,
            "score": score,
        }),
    }
}

fn bike_outcome(signal: Metric<BikeSignal>, cfg: &BikeSignalSettings, neutral: f64) -> SignalOutcome {
    let Some(bike) = signal.into_option() else {
        return SignalOutcome::unavailable("bike", "Bike station");
    };
    let station_score = capped_ratio(f64::from(bike.stations), cfg.station_cap);
    let distance_score = 1.0 - capped_ratio(bike.nearest_m, cfg.distance_cap_m);
    let availability_score = bike
        .available_bikes
        .map(|n| capped_ratio(f64::from(n), cfg.available_bikes_cap));
    let availability_weight = if availability_score.is_available() {
        cfg.weights.available_bikes
    } else {
        0.0
    };
    let availability_reason = match bike.available_bikes {
        Metric::Value(n) => format!("Available bikes nearby: {n}"),
        Metric::Unavailable => "Bike availability unavailable".to_owned(),
    };
    let (score, reasons) = match weighted_mean(&[
        (cfg.weights.stations, station_score),
        (cfg.weights.distance, distance_score),
        (
            availability_weight,
            availability_score.into_option().unwrap_or(0.0),
        ),
    ]) {
        Some(mean) => (
            clamp01(mean),
            vec![
                format!("{} bike stations within {:.0}m", bike.stations, cfg.radius_m),
                availability_reason,
            ],
        ),
        None => (neutral, vec![Fallback::Misconfigured("Bike station").reason()]),
    };
    SignalOutcome {
        name: "bike",
        score: Some(score),
        reasons,
        details: json!({
            "available": true,
            "within_radius": bike.stations,
            "nearest_m": detail(&bike.nearest_m),
            "radius_m": cfg.radius_m,
            "station_score": station_score,
            "distance_score": distance_score,
            "availability_score": detail(&availability_score),
            "available_rent_bikes": detail(&bike.available_bikes),
            "available_return_bikes": detail(&bike.available_docks),
            "score": score,
        }),
    }
}

/// Combine available signals; `None` when every signal is unavailable.
fn local_transit(
    outcomes: &[SignalOutcome],
    cfg: &AccessibilitySettings,
) -> (Option<f64>, Vec<String>, Details) {
    let configured = |name: &str| match name {
        "bus" => cfg.signal_weights.bus,
        "metro" => cfg.signal_weights.metro,
        _ => cfg.signal_weights.bike,
    };
    let raw: BTreeMap<&str, f64> = outcomes
        .iter()
        .map(|o| {
            let weight = if o.score.is_some() { configured(o.name) } else { 0.0 };
            (o.name, weight)
        })
        .collect();
    let normalised = normalise_weights(&raw);
    // Unavailable signals sort after every available one.
    let weight_of = |o: &SignalOutcome| match o.score {
        Some(_) => normalised.get(o.name).copied().unwrap_or(0.0),
        None => -1.0,
    };
    let parts: Vec<(f64, f64)> = outcomes
        .iter()
        .filter_map(|o| o.score.map(|s| (weight_of(o), s)))
        .collect();
    let any_available = !parts.is_empty();
    let score = if any_available {
        Some(clamp01(weighted_mean(&parts).unwrap_or(0.0)))
    } else {
        None
    };

    let mut ordered: Vec<&SignalOutcome> = outcomes.iter().collect();
    ordered.sort_by(|a, b| weight_of(b).total_cmp(&weight_of(a)));
    let mut reasons: Vec<String> = Vec::new();
    for outcome in ordered {
        for reason in outcome.reasons.iter().take(2) {
            if !reasons.contains(reason) {
                reasons.push(reason.clone());
            }
        }
    }
    if !any_available {
        reasons.push("Local transit data unavailable; using origin proximity only".to_owned());
    }

    let mut details = Details::new();
    for outcome in outcomes {
        details.insert(outcome.name.to_owned(), outcome.details.clone());
    }
    let weights_used: Details = if any_available {
        normalised
            .iter()
            .map(|(name, w)| ((*name).to_owned(), Value::from(*w)))
            .collect()
    } else {
        outcomes
            .iter()
            .map(|o| (o.name.to_owned(), Value::from(0.0)))
            .collect()
    };
    details.insert("signal_weights".to_owned(), Value::Object(weights_used));
    (score, reasons, details)
}

/// Score how easy the destination is to reach.
///
/// Unavailable transit datasets are excluded from the blend rather than
/// scored as zero. With no transit data at all the score rests on origin
/// proximity alone.
///
/// # Examples
/// ```
/// use tripscore_core::{Metric, Settings};
/// use tripscore_scorer::{AccessibilityMetrics, score_accessibility};
///
/// let metrics = AccessibilityMetrics {
///     origin_distance_m: 0.0,
///     bus: Metric::Unavailable,
///     metro: Metric::Unavailable,
///     bike: Metric::Unavailable,
/// };
/// let scored = score_accessibility(&metrics, &Settings::default());
/// assert!((scored.score - 1.0).abs() < 1e-9);
/// ```
#[must_use]
pub fn score_accessibility(metrics: &AccessibilityMetrics, settings: &Settings) -> FeatureScore {
    let cfg = &settings.accessibility;
    let neutral = settings.scoring.neutral_score;

    let origin_score = 1.0 - capped_ratio(metrics.origin_distance_m, cfg.origin_distance_cap_m);
    let origin_reason = format!(
        "~{:.1} km from origin",
        metrics.origin_distance_m / 1_000.0
    );

    let outcomes = [
        stop_outcome(&BUS, metrics.bus, &cfg.bus, neutral),
        stop_outcome(&METRO, metrics.metro, &cfg.metro, neutral),
        bike_outcome(metrics.bike, &cfg.bike, neutral),
    ];
    let (local_score, local_reasons, mut details) = local_transit(&outcomes, cfg);

    let local_weight = if local_score.is_some() {
        cfg.blend.local_transit
    } else {
        0.0
    };
    details.insert(
        "origin_distance_m".to_owned(),
        Value::from(metrics.origin_distance_m),
    );
    details.insert(
        "origin_distance_cap_m".to_owned(),
        Value::from(cfg.origin_distance_cap_m),
    );
    details.insert("origin_proximity_score".to_owned(), Value::from(origin_score));
    details.insert("local_transit_score".to_owned(), detail(&local_score));
    details.insert(
        "blend_weights".to_owned(),
        json!({
            "local_transit": local_weight,
            "origin_proximity": cfg.blend.origin_proximity,
        }),
    );

    let blended = weighted_mean(&[
        (local_weight, local_score.unwrap_or(0.0)),
        (cfg.blend.origin_proximity, origin_score),
    ]);
    match blended {
        Some(score) => {
            let mut reasons = Vec::with_capacity(local_reasons.len() + 1);
            reasons.push(origin_reason);
            reasons.extend(local_reasons);
            FeatureScore::new(score, reasons, details)
        }
        None => fail_open(
            neutral,
            Fallback::Misconfigured("Accessibility blend"),
            details,
            local_reasons,
        ),
    }
}
