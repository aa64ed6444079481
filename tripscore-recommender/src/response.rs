//! The ranked response returned to callers.

use std::fmt;

use serde::Serialize;
use serde_json::Value;
use tripscore_core::{Destination, ScoreBreakdown};

use crate::EffectiveQuery;

/// Machine-readable warning category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum WarningCode {
    /// The tag filter removed destinations.
    TagFilterExcluded,
    /// No destination survived the tag filter.
    NoCandidates,
    /// One or more transit, bike or parking datasets were unavailable.
    TransitPartial,
    /// The forecast was unavailable or missing destinations.
    WeatherUnavailable,
}

impl WarningCode {
    /// Wire name of the code.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TagFilterExcluded => "TAG_FILTER_EXCLUDED",
            Self::NoCandidates => "NO_CANDIDATES",
            Self::TransitPartial => "TRANSIT_PARTIAL",
            Self::WeatherUnavailable => "WEATHER_UNAVAILABLE",
        }
    }
}

impl fmt::Display for WarningCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A non-fatal condition the caller should know about.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Warning {
    /// Category.
    pub code: WarningCode,
    /// Human-readable explanation.
    pub message: String,
    /// Structured context, `null` when there is none.
    #[serde(skip_serializing_if = "Value::is_null")]
    pub detail: Value,
}

impl Warning {
    /// A warning without structured detail.
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            detail: Value::Null,
        }
    }

    /// Attach structured detail.
    #[must_use]
    pub fn with_detail(mut self, detail: Value) -> Self {
        self.detail = detail;
        self
    }
}

/// One ranked destination.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendationItem {
    /// The destination as catalogued.
    pub destination: Destination,
    /// Its explainable score.
    pub breakdown: ScoreBreakdown,
}

/// Ranked results plus everything needed to interpret them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Recommendation {
    /// The request as it was interpreted.
    pub query: EffectiveQuery,
    /// Top results, best first; ties keep catalogue order.
    pub results: Vec<RecommendationItem>,
    /// Non-fatal conditions met while answering.
    pub warnings: Vec<Warning>,
    /// Destinations that passed the tag filter and were scored.
    pub candidates_scored: usize,
}

impl Recommendation {
    /// Whether any warning carries `code`.
    #[must_use]
    pub fn has_warning(&self, code: WarningCode) -> bool {
        self.warnings.iter().any(|w| w.code == code)
    }

    /// Destination identifiers in rank order.
    #[must_use]
    pub fn ranked_ids(&self) -> Vec<&str> {
        self.results
            .iter()
            .map(|item| item.destination.id.as_str())
            .collect()
    }
}
