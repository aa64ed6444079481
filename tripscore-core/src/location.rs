//! Geographic points and great-circle distance.
//!
//! [`GeoPoint`] stores latitude and longitude in decimal degrees and
//! refuses coordinates outside the WGS84 ranges. Distances are computed
//! with the haversine formula via the `geo` crate, which is accurate to
//! well under a metre at city scale.

use geo::{Distance, Haversine, Point};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A validated WGS84 coordinate.
///
/// # Examples
/// ```
/// use tripscore_core::GeoPoint;
///
/// # fn main() -> Result<(), tripscore_core::GeoPointError> {
/// let taipei_101 = GeoPoint::new(25.0340, 121.5645)?;
/// assert!((taipei_101.lat() - 25.0340).abs() < 1e-9);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawGeoPoint")]
pub struct GeoPoint {
    lat: f64,
    lon: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    lat: f64,
    lon: f64,
}

/// Errors returned by [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, Error, PartialEq)]
pub enum GeoPointError {
    /// Latitude fell outside `[-90, 90]` or was not finite.
    #[error("latitude {value} is outside [-90, 90]")]
    Latitude {
        /// Rejected latitude.
        value: f64,
    },
    /// Longitude fell outside `[-180, 180]` or was not finite.
    #[error("longitude {value} is outside [-180, 180]")]
    Longitude {
        /// Rejected longitude.
        value: f64,
    },
}

impl GeoPoint {
    /// Validate and construct a point from decimal degrees.
    pub fn new(lat: f64, lon: f64) -> Result<Self, GeoPointError> {
        if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
            return Err(GeoPointError::Latitude { value: lat });
        }
        if !lon.is_finite() || !(-180.0..=180.0).contains(&lon) {
            return Err(GeoPointError::Longitude { value: lon });
        }
        Ok(Self { lat, lon })
    }

    /// Latitude in decimal degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in decimal degrees.
    #[must_use]
    pub const fn lon(&self) -> f64 {
        self.lon
    }
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoPointError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.lat, raw.lon)
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(point: GeoPoint) -> Self {
        Self::new(point.lon, point.lat)
    }
}

/// Great-circle distance between two points in metres.
///
/// # Examples
/// ```
/// use tripscore_core::{GeoPoint, haversine_m};
///
/// # fn main() -> Result<(), tripscore_core::GeoPointError> {
/// let a = GeoPoint::new(25.0478, 121.5170)?;
/// assert!(haversine_m(a, a).abs() < 1e-6);
/// # Ok(())
/// # }
/// ```
#[must_use]
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> f64 {
    Haversine.distance(Point::from(a), Point::from(b))
}
