//! Transit and weather datasets served from a JSON snapshot.
//!
//! A snapshot captures what the live services answered at some point, so
//! the engine can run offline. Its layout mirrors the collaborator traits:
//!
//! ```json
//! {
//!   "metro_stations": [{"id": "BL12", "name": "Taipei Main", "location": {"lat": 25.046, "lon": 121.517}}],
//!   "cities": {
//!     "taipei": {"bus_stops": [], "bike_stations": [], "parking_lots": []}
//!   },
//!   "weather": {"tp-101": {"max_precipitation_probability": 30, "mean_temperature_c": 24.5}}
//! }
//! ```
//!
//! A section that is absent is reported as unavailable, while an empty list
//! means the dataset exists and is empty.

use std::collections::BTreeMap;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};
use tripscore_core::{
    BikeStation, ParkingLot, SourceError, TransitSource, TransitStop, WeatherForecast,
    WeatherRequest, WeatherSource, ZonedTimeWindow, normalise_tag,
};

use crate::DataError;
use crate::fs::read_json;

/// Per-city transit datasets.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CitySnapshot {
    /// Bus stops, if captured.
    #[serde(default)]
    pub bus_stops: Option<Vec<TransitStop>>,
    /// Shared-bike stations with availability, if captured.
    #[serde(default)]
    pub bike_stations: Option<Vec<BikeStation>>,
    /// Car parks with availability, if captured.
    #[serde(default)]
    pub parking_lots: Option<Vec<ParkingLot>>,
}

/// The on-disk snapshot document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Snapshot {
    /// Metro stations across every network, if captured.
    #[serde(default)]
    pub metro_stations: Option<Vec<TransitStop>>,
    /// Transit datasets keyed by city name.
    #[serde(default)]
    pub cities: BTreeMap<String, CitySnapshot>,
    /// Window summaries keyed by destination identifier, if captured.
    #[serde(default)]
    pub weather: Option<WeatherForecast>,
}

/// A [`TransitSource`] and [`WeatherSource`] backed by a [`Snapshot`].
///
/// The default source has captured nothing, so every dataset is
/// unavailable and scoring degrades to its neutral fallbacks.
///
/// # Examples
/// ```
/// use tripscore_core::TransitSource;
/// use tripscore_data::{CitySnapshot, Snapshot, SnapshotSource};
///
/// let mut snapshot = Snapshot::default();
/// snapshot.cities.insert("Taipei".into(), CitySnapshot {
///     bus_stops: Some(Vec::new()),
///     ..CitySnapshot::default()
/// });
/// let source = SnapshotSource::new(snapshot);
/// assert_eq!(source.bus_stops("taipei").map(|stops| stops.len()), Ok(0));
/// assert!(source.metro_stations().is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct SnapshotSource {
    metro_stations: Option<Vec<TransitStop>>,
    cities: BTreeMap<String, CitySnapshot>,
    weather: Option<WeatherForecast>,
}

impl SnapshotSource {
    /// Index a snapshot, keying cities by lowercase name.
    #[must_use]
    pub fn new(snapshot: Snapshot) -> Self {
        let cities = snapshot
            .cities
            .into_iter()
            .filter_map(|(name, city)| normalise_tag(&name).map(|key| (key, city)))
            .collect();
        Self {
            metro_stations: snapshot.metro_stations,
            cities,
            weather: snapshot.weather,
        }
    }

    /// Load and index the snapshot at `path`.
    pub fn load(path: &Utf8Path) -> Result<Self, DataError> {
        let snapshot: Snapshot = read_json(path, "snapshot")?;
        log::debug!(
            "loaded snapshot from {path} covering {} cities",
            snapshot.cities.len()
        );
        Ok(Self::new(snapshot))
    }

    fn city<'s, T>(
        &'s self,
        city: &str,
        dataset: &'static str,
        section: impl FnOnce(&'s CitySnapshot) -> Option<&'s Vec<T>>,
    ) -> Result<Vec<T>, SourceError>
    where
        T: Clone + 's,
    {
        let key = normalise_tag(city).unwrap_or_default();
        let captured = self
            .cities
            .get(&key)
            .ok_or_else(|| SourceError::UnsupportedCity {
                dataset: dataset.to_owned(),
                city: key.clone(),
            })?;
        section(captured)
            .cloned()
            .ok_or_else(|| missing(dataset, &key))
    }
}

fn missing(dataset: &str, scope: &str) -> SourceError {
    SourceError::unavailable(dataset, format!("not captured in snapshot for {scope}"))
}

impl TransitSource for SnapshotSource {
    fn bus_stops(&self, city: &str) -> Result<Vec<TransitStop>, SourceError> {
        self.city(city, "bus_stops", |c| c.bus_stops.as_ref())
    }

    fn metro_stations(&self) -> Result<Vec<TransitStop>, SourceError> {
        self.metro_stations
            .clone()
            .ok_or_else(|| missing("metro_stations", "any network"))
    }

    fn bike_stations(&self, city: &str) -> Result<Vec<BikeStation>, SourceError> {
        self.city(city, "bike_stations", |c| c.bike_stations.as_ref())
    }

    fn parking_lots(&self, city: &str) -> Result<Vec<ParkingLot>, SourceError> {
        self.city(city, "parking_lots", |c| c.parking_lots.as_ref())
    }
}

impl WeatherSource for SnapshotSource {
    /// Captured summaries for the requested destinations.
    ///
    /// A snapshot holds one summary per destination, so the window is not
    /// consulted.
    fn forecast(
        &self,
        requests: &[WeatherRequest],
        _window: &ZonedTimeWindow,
    ) -> Result<WeatherForecast, SourceError> {
        let captured = self
            .weather
            .as_ref()
            .ok_or_else(|| missing("weather", "any destination"))?;
        Ok(requests
            .iter()
            .filter_map(|request| {
                captured
                    .get(&request.destination_id)
                    .map(|summary| (request.destination_id.clone(), *summary))
            })
            .collect())
    }
}
