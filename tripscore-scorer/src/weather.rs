//! Weather: rain probability and temperature comfort over the visit window.

use serde_json::{Value, json};
use tripscore_core::{Destination, Details, FeatureScore, Metric, Settings, WeatherSummary, clamp01};

use crate::fallback::{Fallback, fail_open};
use crate::weights::weighted_mean;

/// Penalty scales below this are treated as this.
const PENALTY_SCALE_FLOOR_C: f64 = 0.1;

/// Rain weight multiplier for a destination's indoor/outdoor tags.
///
/// Only a destination tagged purely indoor or purely outdoor is adjusted.
fn rain_multiplier(destination: &Destination, settings: &Settings) -> (f64, Option<&'static str>) {
    let cfg = &settings.weather;
    let indoor = destination.has_tag(&cfg.indoor_tag);
    let outdoor = destination.has_tag(&cfg.outdoor_tag);
    match (indoor, outdoor) {
        (true, false) => (cfg.indoor_rain_multiplier, Some("indoor")),
        (false, true) => (cfg.outdoor_rain_multiplier, Some("outdoor")),
        _ => (1.0, None),
    }
}

fn temperature_score(celsius: f64, settings: &Settings) -> f64 {
    let cfg = &settings.weather;
    let outside = if celsius < cfg.comfort_min_c {
        cfg.comfort_min_c - celsius
    } else if celsius > cfg.comfort_max_c {
        celsius - cfg.comfort_max_c
    } else {
        return 1.0;
    };
    let scale = cfg.temperature_penalty_scale_c.max(PENALTY_SCALE_FLOOR_C);
    1.0 - clamp01(outside / scale)
}

/// Score forecast comfort for one destination.
///
/// `rain_importance`, when given, replaces the configured rain and
/// temperature weights with `(r, 1 - r)`.
#[must_use]
pub fn score_weather(
    summary: Metric<&WeatherSummary>,
    destination: &Destination,
    rain_importance: Option<f64>,
    settings: &Settings,
) -> FeatureScore {
    let neutral = settings.scoring.neutral_score;
    let (rain, temperature) = match summary {
        Metric::Value(s) => (s.max_precipitation_probability, s.mean_temperature_c),
        Metric::Unavailable => (None, None),
    };
    let mut details = Details::new();
    details.insert(
        "max_precipitation_probability".to_owned(),
        json!(rain),
    );
    details.insert("mean_temperature_c".to_owned(), json!(temperature));

    if rain.is_none() && temperature.is_none() {
        return fail_open(
            neutral,
            Fallback::Unavailable("Weather data"),
            details,
            vec![
                "Rain probability unavailable".to_owned(),
                "Temperature unavailable".to_owned(),
            ],
        );
    }

    let rain_score = rain.map_or(neutral, |p| 1.0 - clamp01(p / 100.0));
    let temp_score = temperature.map_or(neutral, |t| temperature_score(t, settings));
    let (base_rain, base_temp) = rain_importance.map_or(
        (settings.weather.weights.rain, settings.weather.weights.temperature),
        |r| (r, 1.0 - r),
    );
    let (multiplier, adjusted_for) = rain_multiplier(destination, settings);
    let w_rain = base_rain * multiplier;
    let w_temp = base_temp;

    details.insert("rain_score".to_owned(), Value::from(rain_score));
    details.insert("temperature_score".to_owned(), Value::from(temp_score));
    details.insert(
        "rain_importance_multiplier".to_owned(),
        Value::from(multiplier),
    );
    details.insert(
        "weights".to_owned(),
        json!({ "rain": w_rain, "temperature": w_temp }),
    );

    let Some(score) = weighted_mean(&[(w_rain, rain_score), (w_temp, temp_score)]) else {
        return fail_open(neutral, Fallback::Misconfigured("Weather"), details, Vec::new());
    };

    let mut reasons = Vec::with_capacity(3);
    reasons.push(rain.map_or_else(
        || "Rain probability unavailable".to_owned(),
        |p| format!("Max rain probability {p:.0}%"),
    ));
    reasons.push(temperature.map_or_else(
        || "Temperature unavailable".to_owned(),
        |t| format!("Avg temperature {t:.1}°C"),
    ));
    if let Some(kind) = adjusted_for {
        reasons.push(format!("Rain impact adjusted for {kind} destination"));
    }
    FeatureScore::new(score, reasons, details)
}
