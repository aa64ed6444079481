//! Scoring one destination against a fully resolved request.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::Value;
use tripscore_core::{
    ComponentName, ComponentWeights, Destination, DistrictFactors, FeatureScore, GeoPoint, Metric,
    ScoreBreakdown, Settings, SignalStatus, TransitStop, WeatherForecast, ZonedTimeWindow,
};

use crate::composite::{ScoredFeature, compose};
use crate::context::{ContextInputs, score_context};
use crate::metrics::{CityDatasets, measure_accessibility, measure_parking};
use crate::spatial::StationIndex;
use crate::{score_accessibility, score_parking, score_preference, score_weather};

/// Per-request inputs shared by every destination.
///
/// Built once by the orchestrator after overrides, presets and defaults
/// are resolved; never mutated while destinations are scored.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringPlan {
    /// Effective settings for this request.
    pub settings: Settings,
    /// Trip origin.
    pub origin: GeoPoint,
    /// Visit window in a fixed offset.
    pub window: ZonedTimeWindow,
    /// Renormalised component weights.
    pub weights: ComponentWeights,
    /// Effective tag weights for the preference scorer.
    pub tag_weights: BTreeMap<String, f64>,
    /// Rain importance, when the request or preset sets one.
    pub rain_importance: Option<f64>,
    /// Effective avoid-crowds importance.
    pub avoid_crowds_importance: f64,
    /// Effective family-friendly importance.
    pub family_friendly_importance: f64,
}

/// Every dataset fetched for a request.
#[derive(Debug, Default)]
pub struct Datasets {
    /// City datasets keyed by lowercase city.
    pub cities: BTreeMap<String, CityDatasets>,
    /// Metro stations, shared by every city.
    pub metro: Metric<StationIndex<TransitStop>>,
    /// Forecasts keyed by destination id.
    pub weather: Metric<WeatherForecast>,
    /// District baselines, shared across requests.
    pub district_factors: Arc<DistrictFactors>,
}

impl Datasets {
    fn city(&self, key: &str) -> Option<&CityDatasets> {
        self.cities.get(key)
    }
}

/// Status from a feature's fallback flag and its partial-input issues.
fn status_of(feature: &mut FeatureScore, issues: Vec<&str>) -> SignalStatus {
    let status = if feature.details.contains_key("fallback") {
        SignalStatus::Degraded
    } else if issues.is_empty() {
        SignalStatus::Ok
    } else {
        SignalStatus::Partial
    };
    if !issues.is_empty() {
        feature.details.insert(
            "issues".to_owned(),
            Value::from(issues.into_iter().map(Value::from).collect::<Vec<_>>()),
        );
    }
    status
}

impl ScoringPlan {
    /// Score one destination.
    ///
    /// Pure with respect to its inputs: scoring the same destination twice
    /// yields identical breakdowns.
    #[must_use]
    pub fn score(&self, destination: &Destination, datasets: &Datasets) -> ScoreBreakdown {
        let settings = &self.settings;
        let empty = CityDatasets::default();
        let city = datasets
            .city(&destination.city_key(&settings.sources.default_city))
            .unwrap_or(&empty);

        let access_metrics = measure_accessibility(
            destination,
            self.origin,
            city,
            &datasets.metro,
            &settings.accessibility,
        );
        let mut accessibility = score_accessibility(&access_metrics, settings);
        let missing_transit: Vec<&str> = [
            ("bus", access_metrics.bus.is_unavailable()),
            ("metro", access_metrics.metro.is_unavailable()),
            ("bike", access_metrics.bike.is_unavailable()),
        ]
        .into_iter()
        .filter_map(|(name, missing)| missing.then_some(name))
        .collect();
        let no_transit = missing_transit.len() == 3;
        let mut access_status = status_of(&mut accessibility, missing_transit);
        if no_transit {
            access_status = SignalStatus::Degraded;
        }

        let summary = match &datasets.weather {
            Metric::Value(forecast) => Metric::from(forecast.get(&destination.id)),
            Metric::Unavailable => Metric::Unavailable,
        };
        let mut weather_issues = Vec::new();
        match summary {
            Metric::Value(s) => {
                if s.max_precipitation_probability.is_none() {
                    weather_issues.push("rain_probability");
                }
                if s.mean_temperature_c.is_none() {
                    weather_issues.push("temperature");
                }
            }
            Metric::Unavailable => weather_issues.push("forecast"),
        }
        let mut weather = score_weather(summary, destination, self.rain_importance, settings);
        let weather_status = status_of(&mut weather, weather_issues);

        let mut preference = score_preference(
            destination,
            &self.tag_weights,
            settings.scoring.neutral_score,
            settings.preference.max_reason_tags,
        );
        let preference_status = status_of(&mut preference, Vec::new());

        let parking = measure_parking(destination, city, &settings.parking)
            .map(|m| score_parking(&m, &settings.parking));
        let inputs = ContextInputs {
            window: &self.window,
            avoid_crowds_importance: self.avoid_crowds_importance,
            family_friendly_importance: self.family_friendly_importance,
            factors: &datasets.district_factors,
            parking: parking.value(),
        };
        let mut context = score_context(destination, &inputs, settings);
        let mut context_issues = Vec::new();
        if parking.is_unavailable() {
            context_issues.push("parking");
        }
        if context.details.get("district_factor_found") == Some(&Value::Bool(false)) {
            context_issues.push("district_factor");
        }
        let context_status = status_of(&mut context, context_issues);

        let breakdown = compose(
            vec![
                ScoredFeature {
                    name: ComponentName::Accessibility,
                    feature: accessibility,
                    status: access_status,
                },
                ScoredFeature {
                    name: ComponentName::Weather,
                    feature: weather,
                    status: weather_status,
                },
                ScoredFeature {
                    name: ComponentName::Preference,
                    feature: preference,
                    status: preference_status,
                },
                ScoredFeature {
                    name: ComponentName::Context,
                    feature: context,
                    status: context_status,
                },
            ],
            &self.weights,
        );
        log::trace!(
            "scored destination {}: total {:.3}",
            destination.id,
            breakdown.total
        );
        breakdown
    }
}
