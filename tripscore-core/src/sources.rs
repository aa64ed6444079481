//! Collaborator traits for external datasets.
//!
//! The engine never talks to transit or weather services directly. It asks
//! a [`TransitSource`] and a [`WeatherSource`] for raw records once per
//! request. Implementations may block on I/O and may cache internally; the
//! orchestrator bounds each call with a timeout and treats any error as
//! "dataset unavailable".
//!
//! A source that answers with an empty list is reporting that nothing
//! exists, which is different from failing to answer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GeoPoint, ZonedTimeWindow};

/// A bus stop or metro station.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransitStop {
    /// Upstream identifier.
    pub id: String,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Position of the stop.
    pub location: GeoPoint,
}

/// A shared-bike station with optional live availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeStation {
    /// Upstream identifier.
    pub id: String,
    /// Position of the station.
    pub location: GeoPoint,
    /// Bikes ready to rent, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_rent_bikes: Option<u32>,
    /// Free docks, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_return_bikes: Option<u32>,
}

/// An off-street car park with optional live availability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParkingLot {
    /// Upstream identifier.
    pub id: String,
    /// Position of the car park.
    pub location: GeoPoint,
    /// Free spaces, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub available_spaces: Option<u32>,
    /// Total spaces, when reported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_spaces: Option<u32>,
}

/// Forecast aggregated over a visit window for one destination.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    /// Highest precipitation probability over the window, `0..=100`.
    #[serde(default)]
    pub max_precipitation_probability: Option<f64>,
    /// Mean temperature over the window in °C.
    #[serde(default)]
    pub mean_temperature_c: Option<f64>,
}

impl WeatherSummary {
    /// A summary with neither field known.
    #[must_use]
    pub const fn unknown() -> Self {
        Self {
            max_precipitation_probability: None,
            mean_temperature_c: None,
        }
    }
}

/// A destination whose weather is requested.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherRequest {
    /// Destination identifier the summary will be keyed by.
    pub destination_id: String,
    /// Where to forecast.
    pub location: GeoPoint,
}

/// Weather summaries keyed by destination identifier.
pub type WeatherForecast = BTreeMap<String, WeatherSummary>;

/// Failure reported by a collaborator.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SourceError {
    /// The upstream service could not be reached or answered with an error.
    #[error("{dataset} unavailable: {message}")]
    Unavailable {
        /// Dataset that failed.
        dataset: String,
        /// Upstream explanation.
        message: String,
    },
    /// The source does not cover the requested city.
    #[error("{dataset} has no coverage for city '{city}'")]
    UnsupportedCity {
        /// Dataset that was asked.
        dataset: String,
        /// City that is not covered.
        city: String,
    },
}

impl SourceError {
    /// Convenience constructor for [`SourceError::Unavailable`].
    pub fn unavailable(dataset: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Unavailable {
            dataset: dataset.into(),
            message: message.into(),
        }
    }
}

/// Supplies transit, bike and parking records.
///
/// City names are passed lowercased.
pub trait TransitSource: Send + Sync {
    /// Bus stops in `city`.
    fn bus_stops(&self, city: &str) -> Result<Vec<TransitStop>, SourceError>;

    /// Metro stations across every network the source knows about.
    fn metro_stations(&self) -> Result<Vec<TransitStop>, SourceError>;

    /// Shared-bike stations in `city`, merged with live availability.
    fn bike_stations(&self, city: &str) -> Result<Vec<BikeStation>, SourceError>;

    /// Car parks in `city`, merged with live availability.
    fn parking_lots(&self, city: &str) -> Result<Vec<ParkingLot>, SourceError>;
}

/// Supplies forecasts aggregated over a visit window.
pub trait WeatherSource: Send + Sync {
    /// Summaries for each requested destination.
    ///
    /// Destinations missing from the returned map are treated as having
    /// no forecast.
    fn forecast(
        &self,
        requests: &[WeatherRequest],
        window: &ZonedTimeWindow,
    ) -> Result<WeatherForecast, SourceError>;
}
