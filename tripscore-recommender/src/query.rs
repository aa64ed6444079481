//! Resolution of a request into the values actually used for scoring.
//!
//! Every knob follows the same precedence: the request wins, then the
//! selected preset, then the configured default. The resolved values are
//! echoed back to the caller as an [`EffectiveQuery`].

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;
use serde_json::{Map, Value};
use tripscore_core::{
    ComponentWeights, GeoPoint, PartialComponentWeights, Preset, Settings, UserPreferences,
    ZonedTimeWindow, normalise_tag, normalise_tags,
};
use tripscore_scorer::{ScoringPlan, resolve_component_weights};

use crate::RecommendError;

/// The request as it was interpreted, returned alongside the results.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EffectiveQuery {
    /// Trip origin.
    pub origin: GeoPoint,
    /// Visit window with explicit offsets.
    pub time_window: ZonedTimeWindow,
    /// Preset applied, as named by the request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// Number of results returned at most.
    pub max_results: usize,
    /// Renormalised component weights.
    pub component_weights: ComponentWeights,
    /// Rain importance; `None` keeps the configured rain/temperature split.
    pub weather_rain_importance: Option<f64>,
    /// Effective avoid-crowds importance.
    pub avoid_crowds_importance: f64,
    /// Effective family-friendly importance.
    pub family_friendly_importance: f64,
    /// Tag weights used by the preference scorer.
    pub tag_weights: BTreeMap<String, f64>,
    /// Tags every result carries.
    pub required_tags: BTreeSet<String>,
    /// Tags no result carries.
    pub excluded_tags: BTreeSet<String>,
    /// Override patch accepted for this request.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings_overrides: Option<Map<String, Value>>,
}

/// A scoring plan together with the query it was derived from.
#[derive(Debug)]
pub(crate) struct Resolved {
    pub(crate) plan: ScoringPlan,
    pub(crate) query: EffectiveQuery,
}

fn normalise_keys(weights: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    weights
        .iter()
        .filter_map(|(tag, weight)| normalise_tag(tag).map(|t| (t, *weight)))
        .collect()
}

/// First non-empty mapping among request, preset and configured default.
fn effective_tag_weights(
    preferences: &UserPreferences,
    preset: Option<&Preset>,
    settings: &Settings,
) -> BTreeMap<String, f64> {
    let requested = preferences.normalised_tag_weights();
    if !requested.is_empty() {
        return requested;
    }
    preset
        .map(|p| normalise_keys(&p.tag_weights))
        .filter(|weights| !weights.is_empty())
        .unwrap_or_else(|| normalise_keys(&settings.preference.default_tag_weights))
}

fn lookup_preset<'s>(settings: &'s Settings, name: &str) -> Result<&'s Preset, RecommendError> {
    settings
        .preset(name)
        .ok_or_else(|| RecommendError::UnknownPreset {
            name: name.trim().to_owned(),
        })
}

/// Validate `preferences` and resolve them against `base`.
///
/// `base` is never modified; an override patch yields a request-scoped copy.
pub(crate) fn resolve(
    preferences: &UserPreferences,
    base: &Settings,
) -> Result<Resolved, RecommendError> {
    preferences.validate()?;
    let accepted_patch = preferences
        .settings_overrides
        .as_ref()
        .filter(|patch| !patch.is_empty());
    let settings =
        accepted_patch.map_or_else(|| Ok(base.clone()), |patch| base.with_overrides(patch))?;
    let time_window = preferences
        .time_window
        .normalise(settings.default_offset()?)?;
    let preset = preferences
        .preset
        .as_deref()
        .map(|name| lookup_preset(&settings, name))
        .transpose()?;

    let component_weights = resolve_component_weights(&[
        PartialComponentWeights::from(settings.scoring.composite_weights),
        preset.map(Preset::weight_layer).unwrap_or_default(),
        preferences.component_weights,
    ]);
    let tag_weights = effective_tag_weights(preferences, preset, &settings);
    let weather_rain_importance = preferences
        .weather_rain_importance
        .or_else(|| preset.and_then(|p| p.weather_rain_importance));
    let avoid_crowds_importance = preferences
        .avoid_crowds_importance
        .or_else(|| preset.and_then(|p| p.avoid_crowds_importance))
        .unwrap_or(settings.context.default_avoid_crowds_importance);
    let family_friendly_importance = preferences
        .family_friendly_importance
        .or_else(|| preset.and_then(|p| p.family_friendly_importance))
        .unwrap_or(settings.context.default_family_friendly_importance);

    let mut required_tags = normalise_tags(&preferences.required_tags);
    let mut excluded_tags = normalise_tags(&preferences.excluded_tags);
    if let Some(p) = preset {
        required_tags.extend(p.required());
        excluded_tags.extend(p.excluded());
    }
    let max_results = preferences
        .max_results
        .unwrap_or(settings.scoring.top_n_default)
        .min(settings.scoring.max_results_limit);

    let query = EffectiveQuery {
        origin: preferences.origin,
        time_window,
        preset: preferences.preset.as_deref().map(|p| p.trim().to_owned()),
        max_results,
        component_weights,
        weather_rain_importance,
        avoid_crowds_importance,
        family_friendly_importance,
        tag_weights: tag_weights.clone(),
        required_tags,
        excluded_tags,
        settings_overrides: accepted_patch.cloned(),
    };
    let plan = ScoringPlan {
        settings,
        origin: preferences.origin,
        window: time_window,
        weights: component_weights,
        tag_weights,
        rain_importance: weather_rain_importance,
        avoid_crowds_importance,
        family_friendly_importance,
    };
    Ok(Resolved { plan, query })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tripscore_core::{OverrideError, PreferencesError};

    #[fixture]
    fn request() -> UserPreferences {
        serde_json::from_value(json!({
            "origin": {"lat": 25.0478, "lon": 121.5170},
            "time_window": {"start": "2026-03-07T10:00:00", "end": "2026-03-07T16:00:00"}
        }))
        .expect("valid request")
    }

    #[rstest]
    fn defaults_fill_every_knob(request: UserPreferences) {
        let settings = Settings::default();
        let resolved = resolve(&request, &settings).expect("valid request");
        let query = resolved.query;
        assert_eq!(query.max_results, settings.scoring.top_n_default);
        assert!((query.component_weights.total() - 1.0).abs() < 1e-9);
        assert_eq!(query.weather_rain_importance, None);
        assert!(
            (query.avoid_crowds_importance - settings.context.default_avoid_crowds_importance)
                .abs()
                < f64::EPSILON
        );
        assert_eq!(
            query.time_window.start.to_rfc3339(),
            "2026-03-07T10:00:00+08:00"
        );
        assert_eq!(resolved.plan.settings, settings);
    }

    #[rstest]
    fn request_beats_preset_beats_default(mut request: UserPreferences) {
        request.preset = Some("Family_Day".to_owned());
        request.family_friendly_importance = Some(0.2);
        let resolved = resolve(&request, &Settings::default()).expect("valid request");
        let query = resolved.query;
        assert!((query.family_friendly_importance - 0.2).abs() < f64::EPSILON);
        assert!((query.avoid_crowds_importance - 0.6).abs() < f64::EPSILON);
        assert!(query.excluded_tags.contains("adult_only"));
        assert_eq!(query.tag_weights.get("family_friendly"), Some(&1.0));
        assert_eq!(query.preset.as_deref(), Some("Family_Day"));
    }

    #[rstest]
    fn user_weight_overrides_only_its_own_key(mut request: UserPreferences) {
        request.component_weights.weather = Some(0.0);
        let query = resolve(&request, &Settings::default())
            .expect("valid request")
            .query;
        assert!(query.component_weights.weather.abs() < f64::EPSILON);
        assert!(query.component_weights.accessibility > 0.0);
        assert!((query.component_weights.total() - 1.0).abs() < 1e-9);
    }

    #[rstest]
    fn request_tag_weights_are_normalised(request: UserPreferences) {
        let prefs = request.with_tag_weight(" Culture ", 0.8);
        let query = resolve(&prefs, &Settings::default())
            .expect("valid request")
            .query;
        assert_eq!(query.tag_weights, BTreeMap::from([("culture".to_owned(), 0.8)]));
    }

    #[rstest]
    fn unknown_preset_is_a_client_error(request: UserPreferences) {
        let err = resolve(&request.with_preset("beach_day"), &Settings::default())
            .expect_err("unknown preset");
        assert_eq!(err.to_string(), "unknown preset 'beach_day'");
    }

    #[rstest]
    fn max_results_is_capped_by_configured_limit(mut request: UserPreferences) {
        let mut settings = Settings::default();
        settings.scoring.max_results_limit = 20;
        request.max_results = Some(40);
        let query = resolve(&request, &settings).expect("valid request").query;
        assert_eq!(query.max_results, 20);
    }

    #[rstest]
    fn default_limit_caps_large_requests(mut request: UserPreferences) {
        let settings = Settings::default();
        request.max_results = Some(51);
        let query = resolve(&request, &settings).expect("valid request").query;
        assert_eq!(query.max_results, settings.scoring.max_results_limit);
        assert_eq!(query.max_results, 50);
    }

    #[rstest]
    fn zero_max_results_is_rejected(mut request: UserPreferences) {
        request.max_results = Some(0);
        assert!(matches!(
            resolve(&request, &Settings::default()),
            Err(RecommendError::Preferences(_))
        ));
    }

    #[rstest]
    fn overrides_are_scoped_to_the_request(mut request: UserPreferences) {
        let base = Settings::default();
        request.settings_overrides = json!({"scoring": {"neutral_score": 0.4}})
            .as_object()
            .cloned();
        let resolved = resolve(&request, &base).expect("allowed override");
        assert!((resolved.plan.settings.scoring.neutral_score - 0.4).abs() < f64::EPSILON);
        assert!((base.scoring.neutral_score - 0.5).abs() < f64::EPSILON);
        assert!(resolved.query.settings_overrides.is_some());
    }

    #[rstest]
    fn disallowed_override_is_rejected(mut request: UserPreferences) {
        request.settings_overrides = json!({"catalog": {"path": "/etc/passwd"}})
            .as_object()
            .cloned();
        let err = resolve(&request, &Settings::default()).expect_err("disallowed key");
        assert!(matches!(
            err,
            RecommendError::Overrides(OverrideError::DisallowedKey { ref path }) if path == "catalog"
        ));
    }

    #[rstest]
    fn inverted_window_is_rejected(mut request: UserPreferences) {
        std::mem::swap(
            &mut request.time_window.start,
            &mut request.time_window.end,
        );
        assert!(matches!(
            resolve(&request, &Settings::default()),
            Err(RecommendError::Preferences(PreferencesError::EmptyWindow { .. }))
        ));
    }
}
