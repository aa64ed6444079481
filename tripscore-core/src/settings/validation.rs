//! Range checks applied to a fully merged settings tree.

use thiserror::Error;

/// A schema violation, reported with the dotted path of the offending key.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum SettingsError {
    /// A value fell outside its closed range.
    #[error("{path} must be within [{min}, {max}], got {value}")]
    OutOfRange {
        /// Dotted path of the key.
        path: String,
        /// Rejected value.
        value: f64,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// A value had to be strictly positive.
    #[error("{path} must be greater than zero, got {value}")]
    NonPositive {
        /// Dotted path of the key.
        path: String,
        /// Rejected value.
        value: f64,
    },
    /// A value had to be zero or greater.
    #[error("{path} must not be negative, got {value}")]
    Negative {
        /// Dotted path of the key.
        path: String,
        /// Rejected value.
        value: f64,
    },
    /// A value was not a finite number.
    #[error("{path} must be a finite number")]
    NotFinite {
        /// Dotted path of the key.
        path: String,
    },
    /// A `[min, max]` pair had `min > max`.
    #[error("{path} has its lower bound above its upper bound")]
    InvertedRange {
        /// Dotted path of the range.
        path: String,
    },
    /// A component weight map named something other than the four components.
    #[error("{path} is not a known score component")]
    UnknownComponent {
        /// Dotted path of the key.
        path: String,
    },
    /// A UTC offset string could not be parsed.
    #[error("{path} is not a valid UTC offset such as '+08:00', got '{value}'")]
    InvalidOffset {
        /// Dotted path of the key.
        path: String,
        /// Rejected text.
        value: String,
    },
    /// A text value was blank.
    #[error("{path} must not be blank")]
    Blank {
        /// Dotted path of the key.
        path: String,
    },
}

pub(crate) fn finite(path: &str, value: f64) -> Result<(), SettingsError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(SettingsError::NotFinite {
            path: path.to_owned(),
        })
    }
}

pub(crate) fn within(path: &str, value: f64, min: f64, max: f64) -> Result<(), SettingsError> {
    finite(path, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(SettingsError::OutOfRange {
            path: path.to_owned(),
            value,
            min,
            max,
        })
    }
}

pub(crate) fn unit(path: &str, value: f64) -> Result<(), SettingsError> {
    within(path, value, 0.0, 1.0)
}

pub(crate) fn positive(path: &str, value: f64) -> Result<(), SettingsError> {
    finite(path, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(SettingsError::NonPositive {
            path: path.to_owned(),
            value,
        })
    }
}

pub(crate) fn non_negative(path: &str, value: f64) -> Result<(), SettingsError> {
    finite(path, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(SettingsError::Negative {
            path: path.to_owned(),
            value,
        })
    }
}

pub(crate) fn not_blank(path: &str, value: &str) -> Result<(), SettingsError> {
    if value.trim().is_empty() {
        Err(SettingsError::Blank {
            path: path.to_owned(),
        })
    } else {
        Ok(())
    }
}

pub(crate) fn ordered(path: &str, min: f64, max: f64) -> Result<(), SettingsError> {
    if min <= max {
        Ok(())
    } else {
        Err(SettingsError::InvertedRange {
            path: path.to_owned(),
        })
    }
}
