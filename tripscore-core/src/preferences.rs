//! User preferences for a single recommendation request.
//!
//! A request carries an origin, a time window, and optional knobs that
//! override preset and configuration defaults: component weights,
//! importances, tag weights, tag filters, and a settings override patch.
//! [`UserPreferences::validate`] checks the ranges before any scoring.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, LocalResult, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{ComponentName, GeoPoint, PartialComponentWeights, normalise_tag};

/// A window boundary, with or without an explicit UTC offset.
///
/// Timestamps without an offset are interpreted in the configured default
/// timezone; timestamps carrying an offset are left untouched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WindowInstant {
    /// RFC 3339 timestamp with an offset.
    Zoned(DateTime<FixedOffset>),
    /// Wall-clock timestamp without an offset.
    Local(NaiveDateTime),
}

impl WindowInstant {
    /// Attach `default_offset` when no offset is present.
    ///
    /// # Examples
    /// ```
    /// use chrono::{FixedOffset, NaiveDate, Timelike};
    /// use tripscore_core::WindowInstant;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let naive = NaiveDate::from_ymd_opt(2026, 1, 5)
    ///     .and_then(|d| d.and_hms_opt(10, 0, 0))
    ///     .ok_or("bad date")?;
    /// let offset = FixedOffset::east_opt(8 * 3600).ok_or("bad offset")?;
    /// let zoned = WindowInstant::Local(naive).with_default_offset(offset)?;
    /// assert_eq!(zoned.hour(), 10);
    /// assert_eq!(zoned.offset().local_minus_utc(), 8 * 3600);
    /// # Ok(())
    /// # }
    /// ```
    pub fn with_default_offset(
        self,
        default_offset: FixedOffset,
    ) -> Result<DateTime<FixedOffset>, PreferencesError> {
        match self {
            Self::Zoned(dt) => Ok(dt),
            Self::Local(naive) => match default_offset.from_local_datetime(&naive) {
                LocalResult::Single(dt) => Ok(dt),
                LocalResult::Ambiguous(..) | LocalResult::None => {
                    Err(PreferencesError::UnrepresentableTime { value: naive })
                }
            },
        }
    }
}

/// A requested visiting window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TimeWindow {
    /// Window start.
    pub start: WindowInstant,
    /// Window end.
    pub end: WindowInstant,
}

impl TimeWindow {
    /// Resolve both boundaries against `default_offset`.
    ///
    /// Fails when the resolved end does not come after the start.
    pub fn normalise(
        &self,
        default_offset: FixedOffset,
    ) -> Result<ZonedTimeWindow, PreferencesError> {
        let start = self.start.with_default_offset(default_offset)?;
        let end = self.end.with_default_offset(default_offset)?;
        if end <= start {
            return Err(PreferencesError::EmptyWindow { start, end });
        }
        Ok(ZonedTimeWindow { start, end })
    }
}

/// A time window whose boundaries carry explicit offsets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZonedTimeWindow {
    /// Window start.
    pub start: DateTime<FixedOffset>,
    /// Window end.
    pub end: DateTime<FixedOffset>,
}

/// Errors returned while validating [`UserPreferences`].
#[derive(Debug, Clone, Error, PartialEq)]
pub enum PreferencesError {
    /// `max_results` was zero. The upper bound is
    /// `scoring.max_results_limit`, applied when the request is resolved.
    #[error("max_results must be at least 1, got {value}")]
    MaxResults {
        /// Requested value.
        value: usize,
    },
    /// An importance fell outside `[0, 1]`.
    #[error("{field} must be within [0, 1], got {value}")]
    Importance {
        /// Name of the importance field.
        field: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A component weight was negative or not finite.
    #[error("component weight for {component} must be a non-negative number, got {value}")]
    ComponentWeight {
        /// Offending component.
        component: ComponentName,
        /// Rejected value.
        value: f64,
    },
    /// A tag weight was not finite.
    #[error("tag weight for '{tag}' must be finite, got {value}")]
    TagWeight {
        /// Offending tag.
        tag: String,
        /// Rejected value.
        value: f64,
    },
    /// A tag was blank after trimming.
    #[error("{field} contains a blank tag")]
    BlankTag {
        /// Collection holding the blank tag.
        field: &'static str,
    },
    /// A preset name was blank.
    #[error("preset name must not be blank")]
    BlankPreset,
    /// The window end does not come after its start.
    #[error("time window end {end} must be after start {start}")]
    EmptyWindow {
        /// Resolved start.
        start: DateTime<FixedOffset>,
        /// Resolved end.
        end: DateTime<FixedOffset>,
    },
    /// A wall-clock time could not be placed in the default timezone.
    #[error("local time {value} cannot be represented in the default timezone")]
    UnrepresentableTime {
        /// Offending timestamp.
        value: NaiveDateTime,
    },
}

/// A recommendation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPreferences {
    /// Where the trip starts.
    pub origin: GeoPoint,
    /// When the user intends to visit.
    pub time_window: TimeWindow,
    /// Optional named preset supplying defaults.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub preset: Option<String>,
    /// How many recommendations to return.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_results: Option<usize>,
    /// Per-component weight overrides.
    #[serde(default, skip_serializing_if = "PartialComponentWeights::is_empty")]
    pub component_weights: PartialComponentWeights,
    /// How much rain matters, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weather_rain_importance: Option<f64>,
    /// How much avoiding crowds matters, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avoid_crowds_importance: Option<f64>,
    /// How much family suitability matters, in `[0, 1]`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_friendly_importance: Option<f64>,
    /// Per-tag interest weights; negative values mark dislikes.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub tag_weights: BTreeMap<String, f64>,
    /// Tags every recommendation must carry.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub required_tags: BTreeSet<String>,
    /// Tags no recommendation may carry.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub excluded_tags: BTreeSet<String>,
    /// Partial settings tree applied to this request only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub settings_overrides: Option<serde_json::Map<String, serde_json::Value>>,
}

impl UserPreferences {
    /// Minimal request with every optional knob unset.
    #[must_use]
    pub fn new(origin: GeoPoint, time_window: TimeWindow) -> Self {
        Self {
            origin,
            time_window,
            preset: None,
            max_results: None,
            component_weights: PartialComponentWeights::default(),
            weather_rain_importance: None,
            avoid_crowds_importance: None,
            family_friendly_importance: None,
            tag_weights: BTreeMap::new(),
            required_tags: BTreeSet::new(),
            excluded_tags: BTreeSet::new(),
            settings_overrides: None,
        }
    }

    /// Set a tag weight.
    #[must_use]
    pub fn with_tag_weight(mut self, tag: impl Into<String>, weight: f64) -> Self {
        self.tag_weights.insert(tag.into(), weight);
        self
    }

    /// Exclude destinations carrying `tag`.
    #[must_use]
    pub fn with_excluded_tag(mut self, tag: impl Into<String>) -> Self {
        self.excluded_tags.insert(tag.into());
        self
    }

    /// Require destinations to carry `tag`.
    #[must_use]
    pub fn with_required_tag(mut self, tag: impl Into<String>) -> Self {
        self.required_tags.insert(tag.into());
        self
    }

    /// Select a preset by name.
    #[must_use]
    pub fn with_preset(mut self, preset: impl Into<String>) -> Self {
        self.preset = Some(preset.into());
        self
    }

    /// Check every range constraint on the request.
    pub fn validate(&self) -> Result<(), PreferencesError> {
        if let Some(value @ 0) = self.max_results {
            return Err(PreferencesError::MaxResults { value });
        }
        for (field, value) in [
            ("weather_rain_importance", self.weather_rain_importance),
            ("avoid_crowds_importance", self.avoid_crowds_importance),
            ("family_friendly_importance", self.family_friendly_importance),
        ] {
            if let Some(v) = value
                && !(0.0..=1.0).contains(&v)
            {
                return Err(PreferencesError::Importance { field, value: v });
            }
        }
        if let Some((component, value)) = self.component_weights.first_invalid() {
            return Err(PreferencesError::ComponentWeight { component, value });
        }
        if let Some((tag, value)) = self.tag_weights.iter().find(|(_, w)| !w.is_finite()) {
            return Err(PreferencesError::TagWeight {
                tag: tag.clone(),
                value: *value,
            });
        }
        for (field, tags) in [
            ("required_tags", &self.required_tags),
            ("excluded_tags", &self.excluded_tags),
        ] {
            if tags.iter().any(|t| normalise_tag(t).is_none()) {
                return Err(PreferencesError::BlankTag { field });
            }
        }
        if self.preset.as_deref().is_some_and(|p| p.trim().is_empty()) {
            return Err(PreferencesError::BlankPreset);
        }
        Ok(())
    }

    /// Tag weights keyed by normalised tag.
    #[must_use]
    pub fn normalised_tag_weights(&self) -> BTreeMap<String, f64> {
        self.tag_weights
            .iter()
            .filter_map(|(tag, w)| normalise_tag(tag).map(|t| (t, *w)))
            .collect()
    }
}
