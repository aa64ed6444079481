#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

//! Behavioural coverage for the feature scorers.

use std::cell::RefCell;
use std::collections::BTreeMap;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tripscore_core::test_support::point;
use tripscore_core::{Destination, FeatureScore, Metric, Settings, WeatherSummary};
use tripscore_scorer::{
    AccessibilityMetrics, StopSignal, score_accessibility, score_preference, score_weather,
};

/// Shared state threaded through each scenario.
pub struct TestContext {
    settings: RefCell<Settings>,
    metrics: RefCell<AccessibilityMetrics>,
    summary: RefCell<WeatherSummary>,
    tag_weights: RefCell<BTreeMap<String, f64>>,
    scored: RefCell<Option<FeatureScore>>,
    indoor_vs_outdoor: RefCell<Option<(f64, f64)>>,
}

#[fixture]
/// Fresh scenario state.
pub fn context() -> TestContext {
    TestContext {
        settings: RefCell::new(Settings::default()),
        metrics: RefCell::new(AccessibilityMetrics {
            origin_distance_m: 0.0,
            bus: Metric::Unavailable,
            metro: Metric::Unavailable,
            bike: Metric::Unavailable,
        }),
        summary: RefCell::new(WeatherSummary::unknown()),
        tag_weights: RefCell::new(BTreeMap::new()),
        scored: RefCell::new(None),
        indoor_vs_outdoor: RefCell::new(None),
    }
}

fn destination(tags: &[&str]) -> Destination {
    Destination::new("dest", "Destination", point(25.04, 121.56), tags.iter().copied())
        .expect("valid destination")
}

fn scored(context: &TestContext) -> FeatureScore {
    context
        .scored
        .borrow()
        .clone()
        .expect("a score was computed")
}

#[given(
    "accessibility caps of {count_cap} stops, {distance_cap} metres and an origin cap of {origin_cap} metres"
)]
fn accessibility_caps(context: &TestContext, count_cap: f64, distance_cap: f64, origin_cap: f64) {
    let mut settings = context.settings.borrow_mut();
    let cfg = &mut settings.accessibility;
    cfg.bus.count_cap = count_cap;
    cfg.bus.distance_cap_m = distance_cap;
    cfg.bus.weights.count = 0.5;
    cfg.bus.weights.distance = 0.5;
    cfg.origin_distance_cap_m = origin_cap;
}

#[given("{count} bus stops with the nearest at {nearest} metres")]
fn bus_stops(context: &TestContext, count: u32, nearest: f64) {
    context.metrics.borrow_mut().bus = Metric::Value(StopSignal {
        count,
        nearest_m: nearest,
    });
}

#[given("metro and bike data are unavailable")]
fn metro_and_bike_unavailable(context: &TestContext) {
    let mut metrics = context.metrics.borrow_mut();
    metrics.metro = Metric::Unavailable;
    metrics.bike = Metric::Unavailable;
}

#[given("the destination is {distance} metres from the origin")]
fn origin_distance(context: &TestContext, distance: f64) {
    context.metrics.borrow_mut().origin_distance_m = distance;
}

#[when("accessibility is scored")]
fn accessibility_is_scored(context: &TestContext) {
    let result = score_accessibility(&context.metrics.borrow(), &context.settings.borrow());
    *context.scored.borrow_mut() = Some(result);
}

#[given("a forecast of {rain} percent rain at {temperature} degrees")]
fn forecast(context: &TestContext, rain: f64, temperature: f64) {
    *context.summary.borrow_mut() = WeatherSummary {
        max_precipitation_probability: Some(rain),
        mean_temperature_c: Some(temperature),
    };
}

#[given("a forecast with no rain or temperature")]
fn empty_forecast(context: &TestContext) {
    *context.summary.borrow_mut() = WeatherSummary::unknown();
}

#[given(
    "a temperature penalty scale of {scale} degrees and an indoor rain multiplier of {multiplier}"
)]
fn weather_tuning(context: &TestContext, scale: f64, multiplier: f64) {
    let mut settings = context.settings.borrow_mut();
    settings.weather.temperature_penalty_scale_c = scale;
    settings.weather.indoor_rain_multiplier = multiplier;
}

#[when("weather is scored for an indoor and an outdoor destination")]
fn weather_indoor_and_outdoor(context: &TestContext) {
    let settings = context.settings.borrow();
    let summary = context.summary.borrow();
    let indoor = score_weather(
        Metric::Value(&*summary),
        &destination(&["indoor"]),
        None,
        &settings,
    );
    let outdoor = score_weather(
        Metric::Value(&*summary),
        &destination(&["outdoor"]),
        None,
        &settings,
    );
    *context.indoor_vs_outdoor.borrow_mut() = Some((indoor.score, outdoor.score));
}

#[when("weather is scored for an untagged destination")]
fn weather_untagged(context: &TestContext) {
    let result = score_weather(
        Metric::Value(&*context.summary.borrow()),
        &destination(&[]),
        None,
        &context.settings.borrow(),
    );
    *context.scored.borrow_mut() = Some(result);
}

#[given("tag weights of culture {culture} and food {food}")]
fn tag_weights(context: &TestContext, culture: f64, food: f64) {
    let mut weights = context.tag_weights.borrow_mut();
    weights.insert("culture".to_owned(), culture);
    weights.insert("food".to_owned(), food);
}

#[when("preference is scored for a destination tagged culture and food")]
fn preference_is_scored(context: &TestContext) {
    let result = score_preference(
        &destination(&["culture", "food"]),
        &context.tag_weights.borrow(),
        0.5,
        6,
    );
    *context.scored.borrow_mut() = Some(result);
}

#[then("the score is {expected}")]
fn score_is(context: &TestContext, expected: f64) {
    let actual = scored(context).score;
    assert!((actual - expected).abs() < 1e-9, "score was {actual}");
}

#[then("a reason mentions \"{text}\"")]
fn reason_mentions(context: &TestContext, text: String) {
    let result = scored(context);
    assert!(
        result.reasons.iter().any(|r| r.contains(&text)),
        "reasons were {:?}",
        result.reasons
    );
}

#[then("the indoor score is higher than the outdoor score")]
fn indoor_beats_outdoor(context: &TestContext) {
    let (indoor, outdoor) = context
        .indoor_vs_outdoor
        .borrow()
        .expect("both destinations scored");
    assert!(indoor > outdoor, "indoor {indoor} vs outdoor {outdoor}");
}

#[scenario(path = "tests/features/feature_scores.feature", index = 0)]
fn missing_transit_is_excluded(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/feature_scores.feature", index = 1)]
fn indoor_rain_weight_is_reduced(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/feature_scores.feature", index = 2)]
fn empty_forecast_is_neutral(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/feature_scores.feature", index = 3)]
fn negative_tag_weights_are_inert(context: TestContext) {
    let _ = context;
}
