//! Facade crate for the TripScore recommendation engine.
//!
//! This crate re-exports the domain types, the scorers and the
//! recommendation orchestrator, and exposes the file-backed loaders behind
//! the `data` feature.

#![forbid(unsafe_code)]

pub use tripscore_core::{
    ComponentName, ComponentWeights, Destination, DistrictFactor, DistrictFactors, GeoPoint,
    Metric, OverrideError, ScoreBreakdown, ScoreComponent, Settings, SettingsError, SignalStatus,
    SourceError, TimeWindow, TransitSource, UserPreferences, WeatherSource,
};
pub use tripscore_recommender::{
    EffectiveQuery, RecommendError, Recommendation, RecommendationItem, Recommender, Warning,
    WarningCode,
};
pub use tripscore_scorer::{ScoringPlan, one_line_summary};

#[cfg(feature = "data")]
pub use tripscore_data::{
    DataError, SnapshotSource, load_catalog, load_catalog_with_details, load_district_factors,
    load_settings,
};

#[cfg(feature = "test-support")]
pub use tripscore_core::test_support;
