//! Score components, weights, and the explainable breakdown.
//!
//! Each destination is scored by four features. Every feature yields a
//! [`FeatureScore`] carrying the sub-score, human-readable reasons, and
//! machine-readable details. The aggregator turns those into
//! [`ScoreComponent`]s with weights and contributions, collected into a
//! [`ScoreBreakdown`].

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::clamp01;

/// Machine-readable details attached to a feature score.
pub type Details = serde_json::Map<String, serde_json::Value>;

/// The four scoring features.
///
/// # Examples
/// ```
/// use tripscore_core::ComponentName;
///
/// assert_eq!(ComponentName::Weather.as_str(), "weather");
/// assert_eq!("context".parse::<ComponentName>(), Ok(ComponentName::Context));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentName {
    /// Transit access and distance from the origin.
    Accessibility,
    /// Forecast rain and temperature comfort.
    Weather,
    /// Overlap between destination tags and the user's tag weights.
    Preference,
    /// Predicted crowding and family suitability.
    Context,
}

impl ComponentName {
    /// All components in canonical order.
    pub const ALL: [Self; 4] = [
        Self::Accessibility,
        Self::Weather,
        Self::Preference,
        Self::Context,
    ];

    /// Lowercase identifier.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Accessibility => "accessibility",
            Self::Weather => "weather",
            Self::Preference => "preference",
            Self::Context => "context",
        }
    }
}

impl fmt::Display for ComponentName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ComponentName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "accessibility" => Ok(Self::Accessibility),
            "weather" => Ok(Self::Weather),
            "preference" => Ok(Self::Preference),
            "context" => Ok(Self::Context),
            _ => Err(format!("unknown score component '{s}'")),
        }
    }
}

/// A fully resolved set of component weights.
///
/// Weights produced by the aggregator are non-negative and sum to one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComponentWeights {
    /// Weight of the accessibility component.
    pub accessibility: f64,
    /// Weight of the weather component.
    pub weather: f64,
    /// Weight of the preference component.
    pub preference: f64,
    /// Weight of the context component.
    pub context: f64,
}

impl ComponentWeights {
    /// Weight assigned to `name`.
    #[must_use]
    pub const fn get(&self, name: ComponentName) -> f64 {
        match name {
            ComponentName::Accessibility => self.accessibility,
            ComponentName::Weather => self.weather,
            ComponentName::Preference => self.preference,
            ComponentName::Context => self.context,
        }
    }

    /// Mutable access to the weight assigned to `name`.
    pub fn get_mut(&mut self, name: ComponentName) -> &mut f64 {
        match name {
            ComponentName::Accessibility => &mut self.accessibility,
            ComponentName::Weather => &mut self.weather,
            ComponentName::Preference => &mut self.preference,
            ComponentName::Context => &mut self.context,
        }
    }

    /// Sum of all four weights.
    #[must_use]
    pub fn total(&self) -> f64 {
        ComponentName::ALL.iter().map(|name| self.get(*name)).sum()
    }
}

/// Component weights where any entry may be left unset.
///
/// Used for user requests and presets; unset entries fall through to the
/// next layer during resolution.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PartialComponentWeights {
    /// Optional accessibility weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub accessibility: Option<f64>,
    /// Optional weather weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather: Option<f64>,
    /// Optional preference weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preference: Option<f64>,
    /// Optional context weight.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<f64>,
}

impl PartialComponentWeights {
    /// Weight for `name`, if set.
    #[must_use]
    pub const fn get(&self, name: ComponentName) -> Option<f64> {
        match name {
            ComponentName::Accessibility => self.accessibility,
            ComponentName::Weather => self.weather,
            ComponentName::Preference => self.preference,
            ComponentName::Context => self.context,
        }
    }

    /// Whether no entry is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        ComponentName::ALL.iter().all(|name| self.get(*name).is_none())
    }

    /// First entry that is negative or not finite.
    #[must_use]
    pub fn first_invalid(&self) -> Option<(ComponentName, f64)> {
        ComponentName::ALL.iter().find_map(|name| {
            self.get(*name)
                .filter(|w| !w.is_finite() || *w < 0.0)
                .map(|w| (*name, w))
        })
    }
}

impl From<ComponentWeights> for PartialComponentWeights {
    fn from(weights: ComponentWeights) -> Self {
        Self {
            accessibility: Some(weights.accessibility),
            weather: Some(weights.weather),
            preference: Some(weights.preference),
            context: Some(weights.context),
        }
    }
}

/// Health of the inputs behind one component for one destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalStatus {
    /// Every input was available.
    #[default]
    Ok,
    /// An optional input was missing; the score used what remained.
    Partial,
    /// A primary input was missing; the score leans on fallbacks.
    Degraded,
}

/// Output of a single feature scorer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureScore {
    /// Sub-score in `[0.0, 1.0]`.
    pub score: f64,
    /// Human-readable explanations, most significant first.
    pub reasons: Vec<String>,
    /// Machine-readable details.
    pub details: Details,
}

impl FeatureScore {
    /// Build a feature score, clamping `score` into `[0.0, 1.0]`.
    #[must_use]
    pub fn new(score: f64, reasons: Vec<String>, details: Details) -> Self {
        Self {
            score: clamp01(score),
            reasons,
            details,
        }
    }
}

/// One weighted component in a destination's breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreComponent {
    /// Which feature produced this component.
    pub name: ComponentName,
    /// Sub-score in `[0.0, 1.0]`.
    pub score: f64,
    /// Resolved weight.
    pub weight: f64,
    /// `score * weight`, clamped into `[0.0, 1.0]`.
    pub contribution: f64,
    /// Health of the inputs behind this component.
    pub status: SignalStatus,
    /// Human-readable explanations.
    pub reasons: Vec<String>,
    /// Machine-readable details.
    pub details: Details,
}

impl ScoreComponent {
    /// Weight a feature score.
    #[must_use]
    pub fn weighted(
        name: ComponentName,
        feature: FeatureScore,
        weight: f64,
        status: SignalStatus,
    ) -> Self {
        let score = clamp01(feature.score);
        Self {
            name,
            score,
            weight,
            contribution: clamp01(score * weight),
            status,
            reasons: feature.reasons,
            details: feature.details,
        }
    }
}

/// The explainable composite score of one destination.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    /// Composite score in `[0.0, 1.0]`.
    #[serde(rename = "total_score")]
    pub total: f64,
    /// Components in canonical order.
    pub components: Vec<ScoreComponent>,
}

impl ScoreBreakdown {
    /// Assemble a breakdown whose total is the clamped sum of contributions.
    #[must_use]
    pub fn from_components(components: Vec<ScoreComponent>) -> Self {
        let total = clamp01(components.iter().map(|c| c.contribution).sum());
        Self { total, components }
    }

    /// Look up a component by name.
    #[must_use]
    pub fn component(&self, name: ComponentName) -> Option<&ScoreComponent> {
        self.components.iter().find(|c| c.name == name)
    }

    /// Status of every component, in canonical order.
    #[must_use]
    pub fn signal_status(&self) -> Vec<(ComponentName, SignalStatus)> {
        self.components.iter().map(|c| (c.name, c.status)).collect()
    }
}
