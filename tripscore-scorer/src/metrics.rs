//! Per-destination metrics extracted from raw datasets.
//!
//! Each dataset is either [`Metric::Unavailable`] (the fetch failed) or an
//! index over whatever the source returned. A present dataset always
//! yields concrete metrics: a count of zero and an infinite nearest
//! distance when nothing is around.

use serde::Serialize;
use tripscore_core::settings::{AccessibilitySettings, ParkingSettings};
use tripscore_core::{
    BikeStation, Destination, GeoPoint, Metric, ParkingLot, TransitStop, haversine_m,
};

use crate::spatial::{Located, StationIndex};

/// Indexed datasets for one city.
#[derive(Debug, Default)]
pub struct CityDatasets {
    /// Bus stops in the city.
    pub bus: Metric<StationIndex<TransitStop>>,
    /// Shared-bike stations in the city.
    pub bike: Metric<StationIndex<BikeStation>>,
    /// Car parks in the city.
    pub parking: Metric<StationIndex<ParkingLot>>,
}

/// Count and nearest distance for a stop-based signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StopSignal {
    /// Stops within the configured radius.
    pub count: u32,
    /// Distance to the closest stop anywhere; infinite when there is none.
    pub nearest_m: f64,
}

/// Shared-bike signal.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BikeSignal {
    /// Stations within the configured radius.
    pub stations: u32,
    /// Distance to the closest station anywhere; infinite when there is none.
    pub nearest_m: f64,
    /// Rentable bikes summed over stations within the radius.
    pub available_bikes: Metric<u32>,
    /// Free docks summed over stations within the radius.
    pub available_docks: Metric<u32>,
}

/// Everything the accessibility scorer needs for one destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AccessibilityMetrics {
    /// Great-circle distance from the trip origin.
    pub origin_distance_m: f64,
    /// Bus stops.
    pub bus: Metric<StopSignal>,
    /// Metro stations.
    pub metro: Metric<StopSignal>,
    /// Shared-bike stations.
    pub bike: Metric<BikeSignal>,
}

/// Car-park supply around one destination.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ParkingMetrics {
    /// Car parks within the configured radius.
    pub lots: u32,
    /// Distance to the closest car park anywhere; infinite when there is none.
    pub nearest_m: f64,
    /// Free spaces summed over car parks within the radius.
    pub available_spaces: Metric<u32>,
    /// Total spaces summed over car parks within the radius.
    pub total_spaces: Metric<u32>,
}

fn saturating_count(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}

fn nearest_m<T: Located>(index: &StationIndex<T>, centre: GeoPoint) -> f64 {
    index.nearest(centre).map_or(f64::INFINITY, |(_, d)| d)
}

/// Sum an optional per-item figure.
///
/// Zero items sum to zero. Items that never report make the sum
/// unavailable.
fn sum_reported<'a, T: 'a>(
    items: impl IntoIterator<Item = &'a T>,
    figure: impl Fn(&T) -> Option<u32>,
) -> Metric<u32> {
    let mut seen_any = false;
    let mut reported = false;
    let mut total = 0_u32;
    for item in items {
        seen_any = true;
        if let Some(value) = figure(item) {
            reported = true;
            total = total.saturating_add(value);
        }
    }
    if seen_any && !reported {
        Metric::Unavailable
    } else {
        Metric::Value(total)
    }
}

fn stop_signal(
    index: &Metric<StationIndex<TransitStop>>,
    centre: GeoPoint,
    radius_m: f64,
) -> Metric<StopSignal> {
    index.as_ref().map(|idx| StopSignal {
        count: saturating_count(idx.within(centre, radius_m).len()),
        nearest_m: nearest_m(idx, centre),
    })
}

/// Measure transit access around `destination`.
#[must_use]
pub fn measure_accessibility(
    destination: &Destination,
    origin: GeoPoint,
    city: &CityDatasets,
    metro: &Metric<StationIndex<TransitStop>>,
    settings: &AccessibilitySettings,
) -> AccessibilityMetrics {
    let centre = destination.location;
    let bike = city.bike.as_ref().map(|idx| {
        let nearby = idx.within(centre, settings.bike.radius_m);
        BikeSignal {
            stations: saturating_count(nearby.len()),
            nearest_m: nearest_m(idx, centre),
            available_bikes: sum_reported(nearby.iter().map(|(s, _)| *s), |s| {
                s.available_rent_bikes
            }),
            available_docks: sum_reported(nearby.iter().map(|(s, _)| *s), |s| {
                s.available_return_bikes
            }),
        }
    });
    AccessibilityMetrics {
        origin_distance_m: haversine_m(origin, centre),
        bus: stop_signal(&city.bus, centre, settings.bus.radius_m),
        metro: stop_signal(metro, centre, settings.metro.radius_m),
        bike,
    }
}

/// Measure car-park supply around `destination`.
#[must_use]
pub fn measure_parking(
    destination: &Destination,
    city: &CityDatasets,
    settings: &ParkingSettings,
) -> Metric<ParkingMetrics> {
    let centre = destination.location;
    city.parking.as_ref().map(|idx| {
        let nearby = idx.within(centre, settings.radius_m);
        ParkingMetrics {
            lots: saturating_count(nearby.len()),
            nearest_m: nearest_m(idx, centre),
            available_spaces: sum_reported(nearby.iter().map(|(l, _)| *l), |l| {
                l.available_spaces
            }),
            total_spaces: sum_reported(nearby.iter().map(|(l, _)| *l), |l| l.total_spaces),
        }
    })
}
