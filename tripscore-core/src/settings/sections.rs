//! Individual sections of the settings tree and their defaults.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::validation::{
    SettingsError, finite, non_negative, not_blank, ordered, positive, unit, within,
};
use crate::ComponentWeights;

/// Sanity bound on `scoring.max_results_limit`.
const MAX_RESULTS_CEILING: usize = 1_000;

/// Process-level settings. Never overridable per request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AppSettings {
    /// Service name used in log lines.
    pub name: String,
    /// Offset attached to window timestamps lacking one, e.g. `+08:00`.
    pub default_utc_offset: String,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            name: "tripscore".to_owned(),
            default_utc_offset: "+08:00".to_owned(),
        }
    }
}

/// Composite scoring and request-level knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ScoringSettings {
    /// Score substituted whenever a signal cannot be computed.
    pub neutral_score: f64,
    /// Configured component weights, the lowest precedence tier.
    pub composite_weights: ComponentWeights,
    /// Results returned when the request does not say.
    pub top_n_default: usize,
    /// Hard ceiling on returned results.
    pub max_results_limit: usize,
    /// Upper bound on threads scoring destinations concurrently, and on
    /// threads fetching datasets for one request.
    pub worker_threads: usize,
    /// Request-wide fetch deadline in milliseconds.
    pub fetch_timeout_ms: u64,
}

impl Default for ScoringSettings {
    fn default() -> Self {
        Self {
            neutral_score: 0.5,
            composite_weights: ComponentWeights {
                accessibility: 0.35,
                weather: 0.3,
                preference: 0.2,
                context: 0.15,
            },
            top_n_default: 10,
            max_results_limit: 50,
            worker_threads: 4,
            fetch_timeout_ms: 5_000,
        }
    }
}

impl ScoringSettings {
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        unit("scoring.neutral_score", self.neutral_score)?;
        let weights = &self.composite_weights;
        for (key, value) in [
            ("accessibility", weights.accessibility),
            ("weather", weights.weather),
            ("preference", weights.preference),
            ("context", weights.context),
        ] {
            non_negative(&format!("scoring.composite_weights.{key}"), value)?;
        }
        count_within(
            "scoring.max_results_limit",
            self.max_results_limit,
            1,
            MAX_RESULTS_CEILING,
        )?;
        count_within(
            "scoring.top_n_default",
            self.top_n_default,
            1,
            self.max_results_limit,
        )?;
        count_within("scoring.worker_threads", self.worker_threads, 1, 64)?;
        if self.fetch_timeout_ms == 0 {
            return Err(SettingsError::NonPositive {
                path: "scoring.fetch_timeout_ms".to_owned(),
                value: 0.0,
            });
        }
        Ok(())
    }
}

fn count_within(path: &str, value: usize, min: usize, max: usize) -> Result<(), SettingsError> {
    if (min..=max).contains(&value) {
        return Ok(());
    }
    let as_f64 = |n: usize| u32::try_from(n).map_or(f64::from(u32::MAX), f64::from);
    Err(SettingsError::OutOfRange {
        path: path.to_owned(),
        value: as_f64(value),
        min: as_f64(min),
        max: as_f64(max),
    })
}

/// Weights blending a count sub-score with a nearest-distance sub-score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CountDistanceWeights {
    /// Weight of the count-within-radius sub-score.
    pub count: f64,
    /// Weight of the nearest-distance sub-score.
    pub distance: f64,
}

/// Radius, caps and weights for a stop-based transit signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TransitSignalSettings {
    /// Search radius around the destination in metres.
    pub radius_m: f64,
    /// Count at which the count sub-score saturates.
    pub count_cap: f64,
    /// Distance at which the distance sub-score reaches zero.
    pub distance_cap_m: f64,
    /// Intra-signal weights.
    pub weights: CountDistanceWeights,
}

impl TransitSignalSettings {
    fn validate(&self, prefix: &str) -> Result<(), SettingsError> {
        positive(&format!("{prefix}.radius_m"), self.radius_m)?;
        positive(&format!("{prefix}.count_cap"), self.count_cap)?;
        positive(&format!("{prefix}.distance_cap_m"), self.distance_cap_m)?;
        non_negative(&format!("{prefix}.weights.count"), self.weights.count)?;
        non_negative(&format!("{prefix}.weights.distance"), self.weights.distance)
    }
}

/// Weights for the bike signal's three sub-scores.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BikeWeights {
    /// Weight of the stations-within-radius sub-score.
    pub stations: f64,
    /// Weight of the nearest-station sub-score.
    pub distance: f64,
    /// Weight of the rentable-bikes sub-score.
    pub available_bikes: f64,
}

/// Radius, caps and weights for the shared-bike signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BikeSignalSettings {
    /// Search radius around the destination in metres.
    pub radius_m: f64,
    /// Station count at which the count sub-score saturates.
    pub station_cap: f64,
    /// Distance at which the distance sub-score reaches zero.
    pub distance_cap_m: f64,
    /// Rentable bikes at which the availability sub-score saturates.
    pub available_bikes_cap: f64,
    /// Intra-signal weights.
    pub weights: BikeWeights,
}

/// Relative weight of each local transit signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SignalWeights {
    /// Bus stops.
    pub bus: f64,
    /// Metro stations.
    pub metro: f64,
    /// Shared-bike stations.
    pub bike: f64,
}

/// Blend between local transit and origin proximity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlendWeights {
    /// Weight of the combined local transit score.
    pub local_transit: f64,
    /// Weight of the origin proximity score.
    pub origin_proximity: f64,
}

/// Settings for the accessibility scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AccessibilitySettings {
    /// Origin distance at which proximity reaches zero.
    pub origin_distance_cap_m: f64,
    /// Local transit versus origin proximity.
    pub blend: BlendWeights,
    /// Relative weight of bus, metro and bike.
    pub signal_weights: SignalWeights,
    /// Bus stop signal.
    pub bus: TransitSignalSettings,
    /// Metro station signal.
    pub metro: TransitSignalSettings,
    /// Shared-bike signal.
    pub bike: BikeSignalSettings,
}

impl Default for AccessibilitySettings {
    fn default() -> Self {
        Self {
            origin_distance_cap_m: 15_000.0,
            blend: BlendWeights {
                local_transit: 0.7,
                origin_proximity: 0.3,
            },
            signal_weights: SignalWeights {
                bus: 0.55,
                metro: 0.3,
                bike: 0.15,
            },
            bus: TransitSignalSettings {
                radius_m: 500.0,
                count_cap: 20.0,
                distance_cap_m: 800.0,
                weights: CountDistanceWeights {
                    count: 0.7,
                    distance: 0.3,
                },
            },
            metro: TransitSignalSettings {
                radius_m: 700.0,
                count_cap: 10.0,
                distance_cap_m: 900.0,
                weights: CountDistanceWeights {
                    count: 0.6,
                    distance: 0.4,
                },
            },
            bike: BikeSignalSettings {
                radius_m: 500.0,
                station_cap: 8.0,
                distance_cap_m: 800.0,
                available_bikes_cap: 40.0,
                weights: BikeWeights {
                    stations: 0.35,
                    distance: 0.25,
                    available_bikes: 0.4,
                },
            },
        }
    }
}

impl AccessibilitySettings {
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        positive(
            "accessibility.origin_distance_cap_m",
            self.origin_distance_cap_m,
        )?;
        non_negative(
            "accessibility.blend.local_transit",
            self.blend.local_transit,
        )?;
        non_negative(
            "accessibility.blend.origin_proximity",
            self.blend.origin_proximity,
        )?;
        for (key, value) in [
            ("bus", self.signal_weights.bus),
            ("metro", self.signal_weights.metro),
            ("bike", self.signal_weights.bike),
        ] {
            non_negative(&format!("accessibility.signal_weights.{key}"), value)?;
        }
        self.bus.validate("accessibility.bus")?;
        self.metro.validate("accessibility.metro")?;
        let bike = &self.bike;
        positive("accessibility.bike.radius_m", bike.radius_m)?;
        positive("accessibility.bike.station_cap", bike.station_cap)?;
        positive("accessibility.bike.distance_cap_m", bike.distance_cap_m)?;
        positive(
            "accessibility.bike.available_bikes_cap",
            bike.available_bikes_cap,
        )?;
        for (key, value) in [
            ("stations", bike.weights.stations),
            ("distance", bike.weights.distance),
            ("available_bikes", bike.weights.available_bikes),
        ] {
            non_negative(&format!("accessibility.bike.weights.{key}"), value)?;
        }
        Ok(())
    }
}

/// Default rain versus temperature weights.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WeatherWeights {
    /// Rain sub-score weight.
    pub rain: f64,
    /// Temperature sub-score weight.
    pub temperature: f64,
}

/// Settings for the weather scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WeatherSettings {
    /// Lower bound of the comfortable temperature band in °C.
    pub comfort_min_c: f64,
    /// Upper bound of the comfortable temperature band in °C.
    pub comfort_max_c: f64,
    /// Degrees outside the band at which the temperature score reaches zero.
    pub temperature_penalty_scale_c: f64,
    /// Default sub-score weights.
    pub weights: WeatherWeights,
    /// Tag marking indoor destinations.
    pub indoor_tag: String,
    /// Tag marking outdoor destinations.
    pub outdoor_tag: String,
    /// Rain weight multiplier for purely indoor destinations.
    pub indoor_rain_multiplier: f64,
    /// Rain weight multiplier for purely outdoor destinations.
    pub outdoor_rain_multiplier: f64,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            comfort_min_c: 22.0,
            comfort_max_c: 28.0,
            temperature_penalty_scale_c: 10.0,
            weights: WeatherWeights {
                rain: 0.7,
                temperature: 0.3,
            },
            indoor_tag: "indoor".to_owned(),
            outdoor_tag: "outdoor".to_owned(),
            indoor_rain_multiplier: 0.7,
            outdoor_rain_multiplier: 1.2,
        }
    }
}

impl WeatherSettings {
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        within("weather.comfort_min_c", self.comfort_min_c, -50.0, 60.0)?;
        within("weather.comfort_max_c", self.comfort_max_c, -50.0, 60.0)?;
        ordered("weather.comfort", self.comfort_min_c, self.comfort_max_c)?;
        positive(
            "weather.temperature_penalty_scale_c",
            self.temperature_penalty_scale_c,
        )?;
        non_negative("weather.weights.rain", self.weights.rain)?;
        non_negative("weather.weights.temperature", self.weights.temperature)?;
        not_blank("weather.indoor_tag", &self.indoor_tag)?;
        not_blank("weather.outdoor_tag", &self.outdoor_tag)?;
        within(
            "weather.indoor_rain_multiplier",
            self.indoor_rain_multiplier,
            0.0,
            1.0,
        )?;
        within(
            "weather.outdoor_rain_multiplier",
            self.outdoor_rain_multiplier,
            1.0,
            10.0,
        )
    }
}

/// Settings for the preference-match scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreferenceSettings {
    /// Tag weights used when neither the request nor a preset supplies any.
    pub default_tag_weights: BTreeMap<String, f64>,
    /// Matched tags listed in the reason line.
    pub max_reason_tags: usize,
}

impl Default for PreferenceSettings {
    fn default() -> Self {
        let default_tag_weights = [
            ("culture", 0.6),
            ("food", 0.6),
            ("history", 0.5),
            ("nature", 0.5),
            ("shopping", 0.3),
        ]
        .into_iter()
        .map(|(tag, weight)| (tag.to_owned(), weight))
        .collect();
        Self {
            default_tag_weights,
            max_reason_tags: 6,
        }
    }
}

impl PreferenceSettings {
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        for (tag, weight) in &self.default_tag_weights {
            finite(&format!("preference.default_tag_weights.{tag}"), *weight)?;
        }
        Ok(())
    }
}

/// Weights for the parking availability signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ParkingWeights {
    /// Lots-within-radius sub-score weight.
    pub lots: f64,
    /// Available-spaces sub-score weight.
    pub available_spaces: f64,
}

/// Settings for the parking availability signal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ParkingSettings {
    /// Search radius around the destination in metres.
    pub radius_m: f64,
    /// Lot count at which the lots sub-score saturates.
    pub lot_cap: f64,
    /// Free spaces at which the availability sub-score saturates.
    pub available_spaces_cap: f64,
    /// Sub-score weights.
    pub weights: ParkingWeights,
}

impl Default for ParkingSettings {
    fn default() -> Self {
        Self {
            radius_m: 800.0,
            lot_cap: 10.0,
            available_spaces_cap: 400.0,
            weights: ParkingWeights {
                lots: 0.3,
                available_spaces: 0.7,
            },
        }
    }
}

impl ParkingSettings {
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        positive("parking.radius_m", self.radius_m)?;
        positive("parking.lot_cap", self.lot_cap)?;
        positive("parking.available_spaces_cap", self.available_spaces_cap)?;
        non_negative("parking.weights.lots", self.weights.lots)?;
        non_negative(
            "parking.weights.available_spaces",
            self.weights.available_spaces,
        )
    }
}

/// A span of hours during which crowd risk is scaled.
///
/// When `end_hour` is not after `start_hour` the window wraps past
/// midnight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PeakWindow {
    /// First hour of the window, `0..=23`.
    pub start_hour: u32,
    /// Hour the window ends, `0..=24`.
    pub end_hour: u32,
    /// Crowd risk multiplier applied while the window overlaps the visit.
    pub multiplier: f64,
}

/// Crowd-risk heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CrowdSettings {
    /// Baseline risk for districts without a factor entry.
    pub default_risk: f64,
    /// Multiplier applied when the visit starts on a weekend.
    pub weekend_multiplier: f64,
    /// Share of the predicted risk taken from parking scarcity.
    pub parking_risk_weight: f64,
    /// Peak-hour windows.
    pub peak_hours: Vec<PeakWindow>,
    /// Additive risk adjustments keyed by tag.
    pub tag_risk_adjustments: BTreeMap<String, f64>,
}

impl Default for CrowdSettings {
    fn default() -> Self {
        Self {
            default_risk: 0.5,
            weekend_multiplier: 1.2,
            parking_risk_weight: 0.35,
            peak_hours: vec![
                PeakWindow {
                    start_hour: 11,
                    end_hour: 14,
                    multiplier: 1.15,
                },
                PeakWindow {
                    start_hour: 17,
                    end_hour: 20,
                    multiplier: 1.25,
                },
            ],
            tag_risk_adjustments: [("night_market", 0.15), ("nature", -0.1)]
                .into_iter()
                .map(|(tag, adj)| (tag.to_owned(), adj))
                .collect(),
        }
    }
}

/// Family-suitability heuristics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FamilySettings {
    /// Baseline suitability for districts without a factor entry.
    pub default_score: f64,
    /// Tag that earns the bonus.
    pub tag: String,
    /// Bonus added when the destination carries `tag`.
    pub tag_bonus: f64,
}

impl Default for FamilySettings {
    fn default() -> Self {
        Self {
            default_score: 0.5,
            tag: "family_friendly".to_owned(),
            tag_bonus: 0.25,
        }
    }
}

/// Settings for the context scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ContextSettings {
    /// Avoid-crowds importance when neither request nor preset sets one.
    pub default_avoid_crowds_importance: f64,
    /// Family-friendly importance when neither request nor preset sets one.
    pub default_family_friendly_importance: f64,
    /// Crowd-risk heuristics.
    pub crowd: CrowdSettings,
    /// Family-suitability heuristics.
    pub family: FamilySettings,
}

impl Default for ContextSettings {
    fn default() -> Self {
        Self {
            default_avoid_crowds_importance: 0.7,
            default_family_friendly_importance: 0.3,
            crowd: CrowdSettings::default(),
            family: FamilySettings::default(),
        }
    }
}

impl ContextSettings {
    pub(crate) fn validate(&self) -> Result<(), SettingsError> {
        unit(
            "context.default_avoid_crowds_importance",
            self.default_avoid_crowds_importance,
        )?;
        unit(
            "context.default_family_friendly_importance",
            self.default_family_friendly_importance,
        )?;
        let crowd = &self.crowd;
        unit("context.crowd.default_risk", crowd.default_risk)?;
        within(
            "context.crowd.weekend_multiplier",
            crowd.weekend_multiplier,
            0.0,
            10.0,
        )?;
        unit(
            "context.crowd.parking_risk_weight",
            crowd.parking_risk_weight,
        )?;
        for (idx, window) in crowd.peak_hours.iter().enumerate() {
            let prefix = format!("context.crowd.peak_hours.{idx}");
            within(
                &format!("{prefix}.start_hour"),
                f64::from(window.start_hour),
                0.0,
                23.0,
            )?;
            within(
                &format!("{prefix}.end_hour"),
                f64::from(window.end_hour),
                0.0,
                24.0,
            )?;
            within(
                &format!("{prefix}.multiplier"),
                window.multiplier,
                0.0,
                10.0,
            )?;
        }
        for (tag, adjustment) in &crowd.tag_risk_adjustments {
            within(
                &format!("context.crowd.tag_risk_adjustments.{tag}"),
                *adjustment,
                -1.0,
                1.0,
            )?;
        }
        unit("context.family.default_score", self.family.default_score)?;
        unit("context.family.tag_bonus", self.family.tag_bonus)?;
        not_blank("context.family.tag", &self.family.tag)
    }
}

/// Data-source settings that a request may influence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceSettings {
    /// City used for destinations that do not name one.
    pub default_city: String,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            default_city: "taipei".to_owned(),
        }
    }
}

/// File locations of the file-backed collaborators. Never overridable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CatalogSettings {
    /// Destination catalogue JSON.
    pub path: Option<String>,
    /// Optional per-destination details JSON merged into metadata.
    pub details_path: Option<String>,
    /// District crowd and family baselines JSON.
    pub district_factors_path: Option<String>,
}
