//! Values that may be missing because an upstream dataset was unavailable.
//!
//! A [`Metric`] keeps "the dataset could not be fetched" apart from "the
//! dataset was fetched and holds nothing nearby". The latter is a real
//! observation (a count of zero, or an infinite nearest distance) and is
//! scored; the former is reported as [`Metric::Unavailable`] and triggers
//! the fail-open path in the scorers.

use serde::{Serialize, Serializer};

/// A measured value or a marker that the source was unavailable.
///
/// Serialises as the inner value, or `null` when unavailable.
///
/// # Examples
/// ```
/// use tripscore_core::Metric;
///
/// let count: Metric<u32> = Metric::Value(3);
/// assert_eq!(count.value(), Some(&3));
/// assert!(Metric::<u32>::Unavailable.is_unavailable());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Metric<T> {
    /// The source could not be consulted.
    #[default]
    Unavailable,
    /// The source answered with this value.
    Value(T),
}

impl<T> Metric<T> {
    /// Whether the source was unavailable.
    #[must_use]
    pub const fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Whether a value was measured.
    #[must_use]
    pub const fn is_available(&self) -> bool {
        !self.is_unavailable()
    }

    /// Borrow the measured value, if any.
    #[must_use]
    pub const fn value(&self) -> Option<&T> {
        match self {
            Self::Unavailable => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Convert into an `Option`, discarding the unavailability marker.
    #[must_use]
    pub fn into_option(self) -> Option<T> {
        match self {
            Self::Unavailable => None,
            Self::Value(v) => Some(v),
        }
    }

    /// Borrow the inner value as a new metric.
    #[must_use]
    pub const fn as_ref(&self) -> Metric<&T> {
        match self {
            Self::Unavailable => Metric::Unavailable,
            Self::Value(v) => Metric::Value(v),
        }
    }

    /// Transform a measured value, preserving unavailability.
    #[must_use]
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Metric<U> {
        match self {
            Self::Unavailable => Metric::Unavailable,
            Self::Value(v) => Metric::Value(f(v)),
        }
    }
}

impl<T> From<Option<T>> for Metric<T> {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Unavailable, Self::Value)
    }
}

impl<T: Serialize> Serialize for Metric<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Unavailable => serializer.serialize_none(),
            Self::Value(v) => serializer.serialize_some(v),
        }
    }
}
