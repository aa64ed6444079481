//! Context: predicted crowding and family suitability for the visit.
//!
//! Crowd risk starts from the district baseline, is scaled by weekend and
//! peak-hour multipliers, shifted by per-tag adjustments, and optionally
//! blended with parking scarcity. The final score mixes low crowding with
//! family suitability according to the traveller's importances.

use std::cmp::Ordering;

use chrono::{DateTime, Datelike, FixedOffset, Timelike, Weekday};
use serde_json::{Value, json};
use tripscore_core::settings::{CrowdSettings, PeakWindow};
use tripscore_core::{
    Destination, Details, DistrictFactors, FeatureScore, Settings, ZonedTimeWindow, clamp01,
};

use crate::fallback::{Fallback, fail_open};
use crate::weights::weighted_mean;

const HOURS_PER_DAY: u32 = 24;
const LOW_RISK_BELOW: f64 = 0.33;
const HIGH_RISK_FROM: f64 = 0.66;

/// Inputs to the context scorer beyond the destination itself.
#[derive(Debug, Clone, Copy)]
pub struct ContextInputs<'a> {
    /// Visit window in a fixed offset.
    pub window: &'a ZonedTimeWindow,
    /// Importance of avoiding crowds, `[0, 1]`.
    pub avoid_crowds_importance: f64,
    /// Importance of family suitability, `[0, 1]`.
    pub family_friendly_importance: f64,
    /// District baselines.
    pub factors: &'a DistrictFactors,
    /// Parking availability score, when the parking dataset was available.
    pub parking: Option<&'a FeatureScore>,
}

/// Coarse label for a crowd-risk value.
#[must_use]
pub const fn crowd_label(risk: f64) -> &'static str {
    if risk < LOW_RISK_BELOW {
        "low"
    } else if risk < HIGH_RISK_FROM {
        "moderate"
    } else {
        "high"
    }
}

/// Congestion wording for a parking-derived risk; both bounds are exclusive.
const fn congestion_label(risk: f64) -> &'static str {
    if risk < LOW_RISK_BELOW {
        "low"
    } else if risk > HIGH_RISK_FROM {
        "high"
    } else {
        "moderate"
    }
}

/// Half-open hour ranges covered by `[start, end)`, splitting at midnight.
/// An empty window (`start == end`) covers nothing.
fn hour_ranges(start: u32, end: u32) -> Vec<(u32, u32)> {
    match end.cmp(&start) {
        Ordering::Greater => vec![(start, end)],
        Ordering::Equal => Vec::new(),
        Ordering::Less => vec![(start, HOURS_PER_DAY), (0, end)],
    }
}

fn overlaps(a: &[(u32, u32)], b: &[(u32, u32)]) -> bool {
    a.iter()
        .any(|(a0, a1)| b.iter().any(|(b0, b1)| a0.max(b0) < a1.min(b1)))
}

/// Hours touched by the visit, with a partial final hour rounded up.
fn visit_hours(window: &ZonedTimeWindow) -> Vec<(u32, u32)> {
    if window.end - window.start >= chrono::Duration::hours(24) {
        return vec![(0, HOURS_PER_DAY)];
    }
    let start = window.start.hour();
    let mut end = window.end.hour();
    if window.end.minute() > 0 || window.end.second() > 0 {
        end = (end + 1).min(HOURS_PER_DAY);
    }
    // Same start and end hour on different days wraps almost a full day.
    if start == end {
        return vec![(0, HOURS_PER_DAY)];
    }
    hour_ranges(start, end)
}

fn is_weekend(start: &DateTime<FixedOffset>) -> bool {
    matches!(start.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The largest multiplier among peak windows overlapping the visit.
fn peak_multiplier(windows: &[PeakWindow], visit: &[(u32, u32)]) -> f64 {
    windows
        .iter()
        .filter(|w| overlaps(&hour_ranges(w.start_hour, w.end_hour), visit))
        .map(|w| w.multiplier)
        .fold(1.0, f64::max)
}

fn tag_adjustment(destination: &Destination, crowd: &CrowdSettings) -> f64 {
    crowd
        .tag_risk_adjustments
        .iter()
        .filter(|(tag, _)| destination.has_tag(tag))
        .map(|(_, adjustment)| adjustment)
        .sum()
}

/// Score crowd and family suitability for one destination.
#[must_use]
pub fn score_context(
    destination: &Destination,
    inputs: &ContextInputs<'_>,
    settings: &Settings,
) -> FeatureScore {
    let cfg = &settings.context;
    let crowd = &cfg.crowd;
    let mut reasons = Vec::new();

    let factor = inputs
        .factors
        .lookup(destination.city.as_deref(), destination.district.as_deref());
    let base_risk = factor.map_or(crowd.default_risk, |f| f.crowd_risk);
    let district_reason = factor.is_none().then(|| {
        "No district crowd baseline; using default risk".to_owned()
    });

    let weekend = if is_weekend(&inputs.window.start) {
        crowd.weekend_multiplier
    } else {
        1.0
    };
    let peak = peak_multiplier(&crowd.peak_hours, &visit_hours(inputs.window));
    let adjustment = tag_adjustment(destination, crowd);
    let baseline_risk = clamp01(base_risk * weekend * peak + adjustment);

    let parking_score = inputs.parking.map(|p| clamp01(p.score));
    let parking_risk = parking_score.map(|s| 1.0 - s);
    let predicted_risk = parking_risk.map_or(baseline_risk, |risk| {
        let w = clamp01(crowd.parking_risk_weight);
        clamp01((1.0 - w) * baseline_risk + w * risk)
    });
    let crowd_score = 1.0 - predicted_risk;

    let family_tagged = destination.has_tag(&cfg.family.tag);
    let base_family = factor
        .and_then(|f| f.family_friendliness)
        .unwrap_or(cfg.family.default_score);
    let family_bonus = if family_tagged {
        cfg.family.tag_bonus
    } else {
        0.0
    };
    let family_score = clamp01(base_family + family_bonus);

    let label = crowd_label(predicted_risk);
    reasons.push(format!("Predicted crowd risk {label} ({predicted_risk:.2})"));
    if let Some(risk) = parking_risk {
        reasons.push(format!(
            "Parking availability suggests {} congestion",
            congestion_label(risk)
        ));
    }
    if family_tagged {
        reasons.push("Family-friendly destination".to_owned());
    }
    if let Some(reason) = district_reason {
        reasons.push(reason);
    }

    let mut details = Details::new();
    details.insert("city".to_owned(), json!(destination.city));
    details.insert("district".to_owned(), json!(destination.district));
    details.insert("district_factor_found".to_owned(), Value::from(factor.is_some()));
    details.insert("base_crowd_risk".to_owned(), Value::from(base_risk));
    details.insert("weekend_multiplier".to_owned(), Value::from(weekend));
    details.insert("peak_multiplier".to_owned(), Value::from(peak));
    details.insert("tag_risk_adjustment".to_owned(), Value::from(adjustment));
    details.insert("baseline_crowd_risk".to_owned(), Value::from(baseline_risk));
    details.insert("parking_availability_score".to_owned(), json!(parking_score));
    details.insert("parking_crowd_risk".to_owned(), json!(parking_risk));
    details.insert(
        "parking_risk_weight".to_owned(),
        Value::from(crowd.parking_risk_weight),
    );
    details.insert("predicted_crowd_risk".to_owned(), Value::from(predicted_risk));
    details.insert("crowd_label".to_owned(), Value::from(label));
    details.insert("crowd_suitability_score".to_owned(), Value::from(crowd_score));
    details.insert("base_family_score".to_owned(), Value::from(base_family));
    details.insert("family_tag_bonus".to_owned(), Value::from(family_bonus));
    details.insert(
        "family_friendliness_score".to_owned(),
        Value::from(family_score),
    );
    details.insert(
        "importances".to_owned(),
        json!({
            "crowd": inputs.avoid_crowds_importance,
            "family": inputs.family_friendly_importance,
        }),
    );
    if let Some(parking) = inputs.parking {
        details.insert("parking".to_owned(), Value::Object(parking.details.clone()));
    }

    match weighted_mean(&[
        (inputs.avoid_crowds_importance, crowd_score),
        (inputs.family_friendly_importance, family_score),
    ]) {
        Some(score) => FeatureScore::new(score, reasons, details),
        None => fail_open(
            settings.scoring.neutral_score,
            Fallback::Misconfigured("Context importance"),
            details,
            reasons,
        ),
    }
}
