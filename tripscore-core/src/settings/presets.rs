//! Named bundles of request defaults.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use super::validation::{SettingsError, finite, non_negative, unit};
use crate::{ComponentName, PartialComponentWeights, normalise_tags};

/// A named bundle of defaults a request may opt into.
///
/// Values set here sit between the request (higher precedence) and the
/// configured defaults (lower precedence).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Preset {
    /// Short human-readable description.
    pub description: String,
    /// Component weights keyed by component name.
    pub component_weights: BTreeMap<String, f64>,
    /// Rain importance in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weather_rain_importance: Option<f64>,
    /// Avoid-crowds importance in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avoid_crowds_importance: Option<f64>,
    /// Family-friendly importance in `[0, 1]`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub family_friendly_importance: Option<f64>,
    /// Tag weights used when the request supplies none.
    pub tag_weights: BTreeMap<String, f64>,
    /// Tags added to the request's required set.
    pub required_tags: BTreeSet<String>,
    /// Tags added to the request's excluded set.
    pub excluded_tags: BTreeSet<String>,
}

impl Preset {
    /// Component weights as a partial weight layer.
    ///
    /// Keys are checked by [`Preset::validate`]; anything that is not a
    /// component name has already been rejected.
    #[must_use]
    pub fn weight_layer(&self) -> PartialComponentWeights {
        let mut layer = PartialComponentWeights::default();
        for (key, weight) in &self.component_weights {
            let slot = match key.parse::<ComponentName>() {
                Ok(ComponentName::Accessibility) => &mut layer.accessibility,
                Ok(ComponentName::Weather) => &mut layer.weather,
                Ok(ComponentName::Preference) => &mut layer.preference,
                Ok(ComponentName::Context) => &mut layer.context,
                Err(_) => continue,
            };
            *slot = Some(*weight);
        }
        layer
    }

    /// Normalised required tags.
    #[must_use]
    pub fn required(&self) -> BTreeSet<String> {
        normalise_tags(&self.required_tags)
    }

    /// Normalised excluded tags.
    #[must_use]
    pub fn excluded(&self) -> BTreeSet<String> {
        normalise_tags(&self.excluded_tags)
    }

    pub(crate) fn validate(&self, name: &str) -> Result<(), SettingsError> {
        let prefix = format!("presets.{name}");
        for (key, weight) in &self.component_weights {
            let path = format!("{prefix}.component_weights.{key}");
            if key.parse::<ComponentName>().is_err() {
                return Err(SettingsError::UnknownComponent { path });
            }
            non_negative(&path, *weight)?;
        }
        for (field, value) in [
            ("weather_rain_importance", self.weather_rain_importance),
            ("avoid_crowds_importance", self.avoid_crowds_importance),
            ("family_friendly_importance", self.family_friendly_importance),
        ] {
            if let Some(v) = value {
                unit(&format!("{prefix}.{field}"), v)?;
            }
        }
        for (tag, weight) in &self.tag_weights {
            finite(&format!("{prefix}.tag_weights.{tag}"), *weight)?;
        }
        Ok(())
    }
}

fn tags(raw: &[&str]) -> BTreeSet<String> {
    raw.iter().map(|t| (*t).to_owned()).collect()
}

fn weights(raw: &[(&str, f64)]) -> BTreeMap<String, f64> {
    raw.iter().map(|(k, v)| ((*k).to_owned(), *v)).collect()
}

/// Presets shipped with the default configuration.
pub(crate) fn builtin_presets() -> BTreeMap<String, Preset> {
    let family_day = Preset {
        description: "Relaxed day out with children".to_owned(),
        component_weights: weights(&[("context", 0.3), ("preference", 0.25)]),
        avoid_crowds_importance: Some(0.6),
        family_friendly_importance: Some(0.9),
        tag_weights: weights(&[("family_friendly", 1.0), ("nature", 0.6), ("culture", 0.4)]),
        excluded_tags: tags(&["adult_only"]),
        ..Preset::default()
    };
    let rainy_day = Preset {
        description: "Stay dry when rain is likely".to_owned(),
        component_weights: weights(&[("weather", 0.4)]),
        weather_rain_importance: Some(0.9),
        tag_weights: weights(&[("indoor", 1.0), ("culture", 0.7), ("shopping", 0.5)]),
        ..Preset::default()
    };
    let car_free = Preset {
        description: "Everything reachable by public transport".to_owned(),
        component_weights: weights(&[("accessibility", 0.55)]),
        ..Preset::default()
    };
    [
        ("family_day", family_day),
        ("rainy_day", rainy_day),
        ("car_free", car_free),
    ]
    .into_iter()
    .map(|(name, preset)| (name.to_owned(), preset))
    .collect()
}
