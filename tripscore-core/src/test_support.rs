//! In-memory collaborators used by unit and behaviour tests.
//!
//! The stubs answer from fixed tables, can be told to fail or to stall, and
//! count how often each dataset was requested so tests can assert that the
//! orchestrator fetches every dataset once per request.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use crate::{
    BikeStation, GeoPoint, ParkingLot, SourceError, TransitSource, TransitStop, WeatherForecast,
    WeatherRequest, WeatherSource, WeatherSummary, ZonedTimeWindow,
};

/// Build a point, panicking on invalid coordinates.
///
/// # Panics
///
/// Panics when the coordinates are outside WGS84 ranges.
#[must_use]
#[expect(clippy::expect_used, reason = "test helper with literal coordinates")]
pub fn point(lat: f64, lon: f64) -> GeoPoint {
    GeoPoint::new(lat, lon).expect("test coordinates must be valid")
}

/// Offset `origin` by whole metres north and east.
///
/// Uses a flat-earth approximation that is accurate to well under a metre
/// for the few hundred metres tests need.
#[must_use]
pub fn offset_m(origin: GeoPoint, north_m: f64, east_m: f64) -> GeoPoint {
    let dlat = north_m / 111_195.0;
    let dlon = east_m / (111_195.0 * origin.lat().to_radians().cos());
    point(origin.lat() + dlat, origin.lon() + dlon)
}

/// Transit source answering from fixed per-city tables.
///
/// A dataset left as `None` fails with [`SourceError::Unavailable`].
#[derive(Debug, Default)]
pub struct StubTransitSource {
    /// Bus stops by lowercase city.
    pub bus: Option<BTreeMap<String, Vec<TransitStop>>>,
    /// Metro stations.
    pub metro: Option<Vec<TransitStop>>,
    /// Bike stations by lowercase city.
    pub bike: Option<BTreeMap<String, Vec<BikeStation>>>,
    /// Car parks by lowercase city.
    pub parking: Option<BTreeMap<String, Vec<ParkingLot>>>,
    /// Delay applied before every answer.
    pub delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubTransitSource {
    /// A source where every dataset fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// A source where every dataset is present but empty.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            bus: Some(BTreeMap::new()),
            metro: Some(Vec::new()),
            bike: Some(BTreeMap::new()),
            parking: Some(BTreeMap::new()),
            ..Self::default()
        }
    }

    /// Stall every call for `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Total number of dataset requests served.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn answer<T: Clone>(
        &self,
        dataset: &str,
        table: Option<&BTreeMap<String, Vec<T>>>,
        city: &str,
    ) -> Result<Vec<T>, SourceError> {
        self.enter();
        table
            .map(|by_city| by_city.get(city).cloned().unwrap_or_default())
            .ok_or_else(|| SourceError::unavailable(dataset, "stubbed outage"))
    }

    fn enter(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
    }
}

impl TransitSource for StubTransitSource {
    fn bus_stops(&self, city: &str) -> Result<Vec<TransitStop>, SourceError> {
        self.answer("bus_stops", self.bus.as_ref(), city)
    }

    fn metro_stations(&self) -> Result<Vec<TransitStop>, SourceError> {
        self.enter();
        self.metro
            .clone()
            .ok_or_else(|| SourceError::unavailable("metro_stations", "stubbed outage"))
    }

    fn bike_stations(&self, city: &str) -> Result<Vec<BikeStation>, SourceError> {
        self.answer("bike_stations", self.bike.as_ref(), city)
    }

    fn parking_lots(&self, city: &str) -> Result<Vec<ParkingLot>, SourceError> {
        self.answer("parking_lots", self.parking.as_ref(), city)
    }
}

/// Weather source answering with one summary for every destination.
#[derive(Debug, Default)]
pub struct StubWeatherSource {
    /// Summary returned for every request; `None` fails.
    pub summary: Option<WeatherSummary>,
    /// Per-destination summaries taking precedence over `summary`.
    pub by_destination: WeatherForecast,
    /// Delay applied before every answer.
    pub delay: Option<Duration>,
    calls: AtomicUsize,
}

impl StubWeatherSource {
    /// A source returning `summary` for every destination.
    #[must_use]
    pub fn uniform(summary: WeatherSummary) -> Self {
        Self {
            summary: Some(summary),
            ..Self::default()
        }
    }

    /// A source that always fails.
    #[must_use]
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Stall every call for `delay`.
    #[must_use]
    pub const fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Number of forecast requests served.
    #[must_use]
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl WeatherSource for StubWeatherSource {
    fn forecast(
        &self,
        requests: &[WeatherRequest],
        _window: &ZonedTimeWindow,
    ) -> Result<WeatherForecast, SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            thread::sleep(delay);
        }
        let fallback = self
            .summary
            .ok_or_else(|| SourceError::unavailable("weather", "stubbed outage"))?;
        Ok(requests
            .iter()
            .map(|req| {
                let summary = self
                    .by_destination
                    .get(&req.destination_id)
                    .copied()
                    .unwrap_or(fallback);
                (req.destination_id.clone(), summary)
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::haversine_m;
    use rstest::rstest;

    #[rstest]
    fn offsets_are_close_to_requested_distance() {
        let origin = point(25.04, 121.55);
        let moved = offset_m(origin, 300.0, 400.0);
        let d = haversine_m(origin, moved);
        assert!((d - 500.0).abs() < 2.0, "distance was {d}");
    }

    #[rstest]
    fn unavailable_source_fails_and_counts() {
        let source = StubTransitSource::unavailable();
        assert!(source.bus_stops("taipei").is_err());
        assert!(source.metro_stations().is_err());
        assert_eq!(source.calls(), 2);
    }

    #[rstest]
    fn empty_source_answers_with_nothing() {
        let source = StubTransitSource::empty();
        assert_eq!(source.bus_stops("taipei"), Ok(Vec::new()));
    }
}
