//! Core domain types for the TripScore engine.
//!
//! This crate holds the vocabulary shared by the scorers, the
//! recommendation orchestrator, and the data loaders: geographic points,
//! destinations, user preferences, score breakdowns, the layered settings
//! tree with its override guard, and the collaborator traits through
//! which transit and weather datasets are fetched.
//!
//! Constructors and validators return `Result` so malformed input is
//! rejected before any scoring happens.

#![cfg_attr(docsrs, feature(doc_cfg))]

pub mod component;
pub mod destination;
pub mod district;
pub mod location;
pub mod metric;
pub mod overrides;
pub mod preferences;
pub mod score;
pub mod settings;
pub mod sources;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use component::{
    ComponentName, ComponentWeights, Details, FeatureScore, PartialComponentWeights,
    ScoreBreakdown, ScoreComponent, SignalStatus,
};
pub use destination::{Destination, DestinationError, normalise_tag, normalise_tags};
pub use location::{GeoPoint, GeoPointError, haversine_m};
pub use metric::Metric;
pub use overrides::{AllowTree, OverrideError, deep_merge};
pub use preferences::{
    PreferencesError, TimeWindow, UserPreferences, WindowInstant, ZonedTimeWindow,
};
pub use score::clamp01;
pub use district::{DistrictFactor, DistrictFactors};
pub use settings::{Preset, Settings, SettingsError};
pub use sources::{
    BikeStation, ParkingLot, SourceError, TransitSource, TransitStop, WeatherForecast,
    WeatherRequest, WeatherSource, WeatherSummary,
};
