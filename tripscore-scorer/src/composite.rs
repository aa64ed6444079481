//! Composite aggregation: effective component weights and the breakdown.

use std::collections::BTreeMap;

use tripscore_core::{
    ComponentName, ComponentWeights, FeatureScore, PartialComponentWeights, ScoreBreakdown,
    ScoreComponent, SignalStatus,
};

use crate::weights::normalise_weights;

/// Resolve component weights from layers ordered lowest to highest
/// precedence, then renormalise them to sum to one.
///
/// Each layer overrides only the keys it sets. Keys no layer sets count as
/// zero. If every weight resolves to zero the four components share equally.
///
/// # Examples
/// ```
/// use tripscore_core::{ComponentWeights, PartialComponentWeights};
/// use tripscore_scorer::resolve_component_weights;
///
/// let config = ComponentWeights { accessibility: 0.4, weather: 0.3, preference: 0.2, context: 0.1 };
/// let user = PartialComponentWeights { weather: Some(0.7), ..Default::default() };
/// let weights = resolve_component_weights(&[config.into(), user]);
/// assert!((weights.total() - 1.0).abs() < 1e-9);
/// assert!((weights.weather - 0.5).abs() < 1e-9);
/// ```
#[must_use]
pub fn resolve_component_weights(layers: &[PartialComponentWeights]) -> ComponentWeights {
    let raw: BTreeMap<ComponentName, f64> = ComponentName::ALL
        .iter()
        .map(|name| {
            let resolved = layers.iter().rev().find_map(|layer| layer.get(*name));
            (*name, resolved.unwrap_or(0.0))
        })
        .collect();
    let normalised = normalise_weights(&raw);
    let mut weights = ComponentWeights {
        accessibility: 0.0,
        weather: 0.0,
        preference: 0.0,
        context: 0.0,
    };
    for (name, weight) in normalised {
        *weights.get_mut(name) = weight;
    }
    weights
}

/// One scored feature awaiting its weight.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredFeature {
    /// Component the feature belongs to.
    pub name: ComponentName,
    /// The scorer's output.
    pub feature: FeatureScore,
    /// Health of the feature's inputs.
    pub status: SignalStatus,
}

/// Weight every feature and sum the contributions.
///
/// Components are emitted in canonical order whatever order `features`
/// arrive in.
#[must_use]
pub fn compose(features: Vec<ScoredFeature>, weights: &ComponentWeights) -> ScoreBreakdown {
    let mut sorted = features;
    sorted.sort_by_key(|f| f.name);
    let components = sorted
        .into_iter()
        .map(|f| ScoreComponent::weighted(f.name, f.feature, weights.get(f.name), f.status))
        .collect();
    ScoreBreakdown::from_components(components)
}
