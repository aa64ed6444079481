//! Property-based tests for the feature scorers.
//!
//! # Invariants tested
//!
//! - **Unit interval:** every feature score lies in `0.0..=1.0`.
//! - **Exclusion, not penalty:** an unavailable transit dataset never lowers
//!   accessibility below the score with that signal absent from the blend.
//! - **Idempotence:** scoring the same destination twice yields identical
//!   breakdowns.

use std::collections::BTreeMap;

use chrono::{FixedOffset, TimeZone};
use proptest::prelude::*;
use tripscore_core::test_support::{offset_m, point};
use tripscore_core::{
    BikeStation, Destination, Metric, Settings, TransitStop, WeatherSummary, ZonedTimeWindow,
};
use tripscore_scorer::{
    AccessibilityMetrics, BikeSignal, CityDatasets, Datasets, ScoringPlan, StationIndex,
    StopSignal, resolve_component_weights, score_accessibility, score_preference, score_weather,
};

fn stop_strategy() -> impl Strategy<Value = Metric<StopSignal>> {
    prop_oneof![
        Just(Metric::Unavailable),
        (0_u32..50, prop_oneof![0.0_f64..5_000.0, Just(f64::INFINITY)])
            .prop_map(|(count, nearest_m)| Metric::Value(StopSignal { count, nearest_m })),
    ]
}

fn bike_strategy() -> impl Strategy<Value = Metric<BikeSignal>> {
    prop_oneof![
        Just(Metric::Unavailable),
        (0_u32..20, 0.0_f64..5_000.0, prop::option::of(0_u32..200)).prop_map(
            |(stations, nearest_m, bikes)| Metric::Value(BikeSignal {
                stations,
                nearest_m,
                available_bikes: Metric::from(bikes),
                available_docks: Metric::Unavailable,
            })
        ),
    ]
}

fn destination(tags: &[&str]) -> Destination {
    Destination::new("d", "Dest", point(25.04, 121.56), tags.iter().copied())
        .unwrap_or_else(|err| panic!("valid destination: {err}"))
}

fn window() -> ZonedTimeWindow {
    let tz = FixedOffset::east_opt(8 * 3600).unwrap_or_else(|| panic!("valid offset"));
    let at = |hour| {
        tz.with_ymd_and_hms(2026, 5, 2, hour, 0, 0)
            .single()
            .unwrap_or_else(|| panic!("valid time"))
    };
    ZonedTimeWindow {
        start: at(10),
        end: at(16),
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Property: accessibility stays in the unit interval for any mix of
    /// present, empty and unavailable datasets.
    #[test]
    fn accessibility_is_bounded(
        origin in 0.0_f64..100_000.0,
        bus in stop_strategy(),
        metro in stop_strategy(),
        bike in bike_strategy(),
    ) {
        let metrics = AccessibilityMetrics { origin_distance_m: origin, bus, metro, bike };
        let scored = score_accessibility(&metrics, &Settings::default());
        prop_assert!((0.0..=1.0).contains(&scored.score));
        prop_assert!(!scored.reasons.is_empty());
    }

    /// Property: weather stays in the unit interval for any forecast and
    /// rain importance.
    #[test]
    fn weather_is_bounded(
        rain in prop::option::of(0.0_f64..=100.0),
        temperature in prop::option::of(-30.0_f64..50.0),
        importance in prop::option::of(0.0_f64..=1.0),
        indoor in any::<bool>(),
    ) {
        let summary = WeatherSummary {
            max_precipitation_probability: rain,
            mean_temperature_c: temperature,
        };
        let tags: &[&str] = if indoor { &["indoor"] } else { &["outdoor"] };
        let scored = score_weather(
            Metric::Value(&summary),
            &destination(tags),
            importance,
            &Settings::default(),
        );
        prop_assert!((0.0..=1.0).contains(&scored.score));
    }

    /// Property: preference stays in the unit interval whatever the sign of
    /// the tag weights.
    #[test]
    fn preference_is_bounded(
        culture in -5.0_f64..5.0,
        food in -5.0_f64..5.0,
        nature in -5.0_f64..5.0,
    ) {
        let weights = BTreeMap::from([
            ("culture".to_owned(), culture),
            ("food".to_owned(), food),
            ("nature".to_owned(), nature),
        ]);
        let scored = score_preference(&destination(&["culture", "nature"]), &weights, 0.5, 6);
        prop_assert!((0.0..=1.0).contains(&scored.score));
    }

    /// Property: an unavailable dataset is excluded, so the score equals the
    /// score computed with that signal's weight set to zero.
    #[test]
    fn unavailable_metro_is_excluded_not_penalised(
        origin in 0.0_f64..20_000.0,
        count in 0_u32..30,
        nearest in 0.0_f64..2_000.0,
    ) {
        let bus = Metric::Value(StopSignal { count, nearest_m: nearest });
        let without_metro = AccessibilityMetrics {
            origin_distance_m: origin,
            bus,
            metro: Metric::Unavailable,
            bike: Metric::Unavailable,
        };
        let mut zero_metro = Settings::default();
        zero_metro.accessibility.signal_weights.metro = 0.0;
        zero_metro.accessibility.signal_weights.bike = 0.0;
        let with_empty_metro = AccessibilityMetrics {
            metro: Metric::Value(StopSignal { count: 0, nearest_m: f64::INFINITY }),
            bike: Metric::Value(BikeSignal {
                stations: 0,
                nearest_m: f64::INFINITY,
                available_bikes: Metric::Value(0),
                available_docks: Metric::Value(0),
            }),
            ..without_metro
        };
        let excluded = score_accessibility(&without_metro, &Settings::default()).score;
        let zero_weighted = score_accessibility(&with_empty_metro, &zero_metro).score;
        prop_assert!((excluded - zero_weighted).abs() < 1e-9);
    }
}

#[test]
fn scoring_a_destination_twice_is_idempotent() {
    let settings = Settings::default();
    let centre = point(25.04, 121.56);
    let mut cities = BTreeMap::new();
    cities.insert(
        "taipei".to_owned(),
        CityDatasets {
            bus: Metric::Value(StationIndex::new(vec![TransitStop {
                id: "b1".to_owned(),
                name: "Stop".to_owned(),
                location: offset_m(centre, 120.0, 0.0),
            }])),
            bike: Metric::Value(StationIndex::new(vec![BikeStation {
                id: "k1".to_owned(),
                location: offset_m(centre, 0.0, 80.0),
                available_rent_bikes: Some(7),
                available_return_bikes: Some(3),
            }])),
            parking: Metric::Unavailable,
        },
    );
    let datasets = Datasets {
        cities,
        ..Datasets::default()
    };
    let plan = ScoringPlan {
        weights: resolve_component_weights(&[settings.scoring.composite_weights.into()]),
        tag_weights: settings.preference.default_tag_weights.clone(),
        origin: offset_m(centre, 3_000.0, 0.0),
        window: window(),
        rain_importance: None,
        avoid_crowds_importance: 0.7,
        family_friendly_importance: 0.3,
        settings,
    };
    let dest = destination(&["culture"]).with_city("Taipei");
    let first = plan.score(&dest, &datasets);
    let second = plan.score(&dest, &datasets);
    assert_eq!(first, second);
    assert!((0.0..=1.0).contains(&first.total));
}
