#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

//! Behavioural coverage for the recommendation pipeline.

use std::cell::RefCell;
use std::sync::Arc;
use std::time::Duration;

use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::json;
use tripscore_core::test_support::{StubTransitSource, StubWeatherSource, offset_m, point};
use tripscore_core::{
    ComponentName, Destination, Settings, SignalStatus, UserPreferences, WeatherSummary,
};
use tripscore_recommender::{Recommendation, RecommendError, Recommender};

/// Shared state threaded through each scenario.
pub struct TestContext {
    settings: RefCell<Settings>,
    catalog: RefCell<Vec<Destination>>,
    transit: RefCell<Arc<StubTransitSource>>,
    weather: RefCell<Arc<StubWeatherSource>>,
    outcome: RefCell<Option<Result<Recommendation, RecommendError>>>,
}

#[fixture]
/// Fresh scenario state.
pub fn context() -> TestContext {
    TestContext {
        settings: RefCell::new(Settings::default()),
        catalog: RefCell::new(Vec::new()),
        transit: RefCell::new(Arc::new(StubTransitSource::empty())),
        weather: RefCell::new(Arc::new(StubWeatherSource::unavailable())),
        outcome: RefCell::new(None),
    }
}

fn fair_weather() -> WeatherSummary {
    WeatherSummary {
        max_precipitation_probability: Some(20.0),
        mean_temperature_c: Some(25.0),
    }
}

fn request() -> UserPreferences {
    serde_json::from_value(json!({
        "origin": {"lat": 25.0478, "lon": 121.5170},
        "time_window": {"start": "2026-03-04T10:00:00", "end": "2026-03-04T15:00:00"}
    }))
    .expect("valid request")
}

fn destination(id: &str, tags: &[&str], north_m: f64) -> Destination {
    Destination::new(
        id,
        id,
        offset_m(point(25.04, 121.56), north_m, 0.0),
        tags.iter().copied(),
    )
    .expect("valid destination")
}

fn run(context: &TestContext, preferences: &UserPreferences) {
    let recommender = Recommender::new(
        context.settings.borrow().clone(),
        context.catalog.borrow().clone(),
        Arc::clone(&*context.transit.borrow()),
        Arc::clone(&*context.weather.borrow()),
    )
    .expect("valid settings");
    *context.outcome.borrow_mut() = Some(recommender.recommend(preferences));
}

fn answer(context: &TestContext) -> Recommendation {
    context
        .outcome
        .borrow()
        .as_ref()
        .expect("request made")
        .as_ref()
        .expect("request accepted")
        .clone()
}

#[given("a catalogue with a museum, a bar tagged adult_only and a park")]
fn mixed_catalogue(context: &TestContext) {
    *context.catalog.borrow_mut() = vec![
        destination("museum", &["culture", "indoor"], 0.0),
        destination("bar", &["nightlife", "adult_only"], 300.0),
        destination("park", &["nature", "outdoor"], 600.0),
    ];
}

#[given("a catalogue spread over two cities")]
fn two_city_catalogue(context: &TestContext) {
    *context.catalog.borrow_mut() = vec![
        destination("museum", &["culture"], 0.0).with_city("Taipei"),
        destination("temple", &["culture"], 200.0).with_city("Taipei"),
        destination("old-street", &["food"], 900.0).with_city("New Taipei"),
    ];
}

#[given("transit and weather sources that answer immediately")]
fn prompt_sources(context: &TestContext) {
    *context.transit.borrow_mut() = Arc::new(StubTransitSource::empty());
    *context.weather.borrow_mut() = Arc::new(StubWeatherSource::uniform(fair_weather()));
}

#[given("a weather source slower than the fetch timeout")]
fn slow_weather(context: &TestContext) {
    context.settings.borrow_mut().scoring.fetch_timeout_ms = 50;
    *context.transit.borrow_mut() = Arc::new(StubTransitSource::empty());
    *context.weather.borrow_mut() = Arc::new(
        StubWeatherSource::uniform(fair_weather()).with_delay(Duration::from_millis(400)),
    );
}

#[when("the traveller asks for recommendations")]
fn asks(context: &TestContext) {
    run(context, &request());
}

#[when("the traveller excludes adult_only")]
fn excludes_adult_only(context: &TestContext) {
    run(context, &request().with_excluded_tag("adult_only"));
}

#[when("the traveller selects the {preset} preset")]
fn selects_preset(context: &TestContext, preset: String) {
    run(context, &request().with_preset(preset));
}

#[when("the traveller overrides catalog.path")]
fn overrides_catalog_path(context: &TestContext) {
    let mut prefs = request();
    prefs.settings_overrides = json!({"catalog": {"path": "/etc/passwd"}})
        .as_object()
        .cloned();
    run(context, &prefs);
}

#[then("the results do not include {id}")]
fn results_exclude(context: &TestContext, id: String) {
    let result = answer(context);
    assert!(
        !result.ranked_ids().contains(&id.as_str()),
        "results were {:?}",
        result.ranked_ids()
    );
}

#[then("{count} results are returned")]
fn result_count(context: &TestContext, count: usize) {
    assert_eq!(answer(context).results.len(), count);
}

#[then("a {code} warning is reported")]
fn warning_reported(context: &TestContext, code: String) {
    let result = answer(context);
    assert!(
        result.warnings.iter().any(|w| w.code.as_str() == code),
        "warnings were {:?}",
        result.warnings
    );
}

#[then("every weather component is degraded")]
fn weather_degraded(context: &TestContext) {
    for item in answer(context).results {
        let weather = item
            .breakdown
            .component(ComponentName::Weather)
            .expect("weather component");
        assert_eq!(weather.status, SignalStatus::Degraded);
    }
}

#[then("the transit source was called {count} times")]
fn transit_calls(context: &TestContext, count: usize) {
    assert_eq!(context.transit.borrow().calls(), count);
}

#[then("the weather source was called {count} times")]
fn weather_calls(context: &TestContext, count: usize) {
    assert_eq!(context.weather.borrow().calls(), count);
}

#[then("the echoed component weights sum to one")]
fn weights_sum_to_one(context: &TestContext) {
    let total = answer(context).query.component_weights.total();
    assert!((total - 1.0).abs() < 1e-9, "weights summed to {total}");
}

#[then("the request is rejected naming \"{path}\"")]
fn rejected_naming(context: &TestContext, path: String) {
    let outcome = context.outcome.borrow();
    let err = outcome
        .as_ref()
        .expect("request made")
        .as_ref()
        .expect_err("request rejected");
    assert!(err.to_string().contains(&format!("'{path}'")), "error was {err}");
}

#[scenario(path = "tests/features/recommendation.feature", index = 0)]
fn excluded_tags_warn(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/recommendation.feature", index = 1)]
fn datasets_fetched_once(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/recommendation.feature", index = 2)]
fn slow_forecast_is_unavailable(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/recommendation.feature", index = 3)]
fn preset_excludes_tags(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/recommendation.feature", index = 4)]
fn disallowed_override_rejected(context: TestContext) {
    let _ = context;
}
