//! Request-scoped settings overrides.
//!
//! A request may carry a partial settings tree. Before it touches any
//! configuration the patch passes two gates:
//!
//! 1. an allow-list, expressed as an [`AllowTree`], rejects any key the
//!    caller is not permitted to change, naming the full dotted path;
//! 2. after a deep merge onto a dump of the base settings, the merged tree
//!    is decoded and run through [`Settings::validate`].
//!
//! The base settings are never mutated. A successful override produces a
//! new [`Settings`] value scoped to the request.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use thiserror::Error;

use crate::{Settings, SettingsError};

/// Permitted shape of an override patch.
///
/// A leaf allows the whole subtree beneath it; a node allows only the
/// listed children, recursively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AllowTree {
    /// Anything beneath this point may be overridden.
    Any,
    /// Only the listed children may be overridden.
    Node(BTreeMap<&'static str, AllowTree>),
}

/// Errors raised while applying an override patch.
#[derive(Debug, Error)]
pub enum OverrideError {
    /// The patch named a key outside the allow-list.
    #[error("settings_overrides contains a disallowed key: '{path}'")]
    DisallowedKey {
        /// Dotted path of the rejected key.
        path: String,
    },
    /// The allow-list expects a mapping here but the patch holds a scalar.
    #[error("settings_overrides key '{path}' must be a mapping")]
    NotAMapping {
        /// Dotted path of the offending value.
        path: String,
    },
    /// The patch value has a different JSON type from the setting it replaces.
    #[error("settings key '{path}' must be {expected}, got {found}")]
    TypeMismatch {
        /// Dotted path of the offending value.
        path: String,
        /// JSON type of the base value.
        expected: &'static str,
        /// JSON type supplied by the patch.
        found: &'static str,
    },
    /// The merged tree could not be decoded into [`Settings`].
    #[error("merged settings tree is invalid: {0}")]
    Decode(#[source] serde_json::Error),
    /// The merged tree decoded but failed range validation.
    #[error("settings rejected: {0}")]
    Schema(#[from] SettingsError),
}

impl AllowTree {
    /// Build a node from `(key, subtree)` pairs.
    #[must_use]
    pub fn node(children: impl IntoIterator<Item = (&'static str, Self)>) -> Self {
        Self::Node(children.into_iter().collect())
    }

    /// The policy applied to per-request overrides.
    ///
    /// Scorer tuning is open. Process concerns (`app`, `catalog`,
    /// `presets`), worker and timeout limits, and everything under
    /// `sources` except the default city stay closed.
    #[must_use]
    pub fn request_policy() -> Self {
        Self::node([
            (
                "scoring",
                Self::node([
                    ("neutral_score", Self::Any),
                    ("composite_weights", Self::Any),
                    ("top_n_default", Self::Any),
                ]),
            ),
            ("accessibility", Self::Any),
            ("weather", Self::Any),
            ("preference", Self::Any),
            ("parking", Self::Any),
            (
                "context",
                Self::node([
                    ("default_avoid_crowds_importance", Self::Any),
                    ("default_family_friendly_importance", Self::Any),
                    ("crowd", Self::Any),
                    ("family", Self::Any),
                ]),
            ),
            ("sources", Self::node([("default_city", Self::Any)])),
        ])
    }

    /// Walk `patch`, rejecting any key outside this tree.
    ///
    /// # Examples
    /// ```
    /// use serde_json::json;
    /// use tripscore_core::AllowTree;
    ///
    /// let policy = AllowTree::request_policy();
    /// let ok = json!({"weather": {"comfort_min_c": 20.0}});
    /// assert!(policy.check(ok.as_object().unwrap_or(&Default::default())).is_ok());
    ///
    /// let bad = json!({"catalog": {"path": "/etc/passwd"}});
    /// let err = policy
    ///     .check(bad.as_object().unwrap_or(&Default::default()))
    ///     .unwrap_err();
    /// assert_eq!(
    ///     err.to_string(),
    ///     "settings_overrides contains a disallowed key: 'catalog'"
    /// );
    /// ```
    pub fn check(&self, patch: &Map<String, Value>) -> Result<(), OverrideError> {
        self.check_at(patch, "")
    }

    fn check_at(&self, patch: &Map<String, Value>, prefix: &str) -> Result<(), OverrideError> {
        let Self::Node(children) = self else {
            return Ok(());
        };
        for (key, value) in patch {
            let path = join(prefix, key);
            let child = children
                .get(key.as_str())
                .ok_or_else(|| OverrideError::DisallowedKey { path: path.clone() })?;
            if let Self::Node(_) = child {
                let nested = value
                    .as_object()
                    .ok_or_else(|| OverrideError::NotAMapping { path: path.clone() })?;
                child.check_at(nested, &path)?;
            }
        }
        Ok(())
    }
}

fn join(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Recursively merge `patch` onto `base` without mutating either.
///
/// Matching mappings are merged key by key so sibling keys survive; any
/// other patch value replaces the base value outright.
///
/// # Examples
/// ```
/// use serde_json::json;
/// use tripscore_core::deep_merge;
///
/// let base = json!({"a": {"x": 1, "y": 2}});
/// let patch = json!({"a": {"x": 9}});
/// assert_eq!(deep_merge(&base, &patch), json!({"a": {"x": 9, "y": 2}}));
/// ```
#[must_use]
pub fn deep_merge(base: &Value, patch: &Value) -> Value {
    match (base, patch) {
        (Value::Object(base_map), Value::Object(patch_map)) => {
            let mut merged = base_map.clone();
            for (key, patch_value) in patch_map {
                let next = merged.get(key).map_or_else(
                    || patch_value.clone(),
                    |base_value| deep_merge(base_value, patch_value),
                );
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        _ => patch.clone(),
    }
}

const fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a mapping",
    }
}

fn check_types(base: &Value, patch: &Value, prefix: &str) -> Result<(), OverrideError> {
    let (Value::Object(base_map), Value::Object(patch_map)) = (base, patch) else {
        return Ok(());
    };
    for (key, patch_value) in patch_map {
        let Some(base_value) = base_map.get(key) else {
            continue;
        };
        let path = join(prefix, key);
        if base_value.is_null() {
            continue;
        }
        let (expected, found) = (kind(base_value), kind(patch_value));
        if expected != found {
            return Err(OverrideError::TypeMismatch {
                path,
                expected,
                found,
            });
        }
        check_types(base_value, patch_value, &path)?;
    }
    Ok(())
}

impl Settings {
    /// Derive request-scoped settings from an override patch.
    ///
    /// The patch must pass [`AllowTree::request_policy`]. `self` is left
    /// untouched whether or not the patch is accepted.
    pub fn with_overrides(&self, patch: &Map<String, Value>) -> Result<Self, OverrideError> {
        AllowTree::request_policy().check(patch)?;
        self.layered(patch)
    }

    /// Deep-merge a partial tree onto these settings without an allow-list.
    ///
    /// Used for trusted layers such as configuration files. The result is
    /// validated before it is returned.
    pub fn layered(&self, layer: &Map<String, Value>) -> Result<Self, OverrideError> {
        let base = serde_json::to_value(self).map_err(OverrideError::Decode)?;
        let patch = Value::Object(layer.clone());
        check_types(&base, &patch, "")?;
        let merged = deep_merge(&base, &patch);
        let derived: Self = serde_json::from_value(merged).map_err(OverrideError::Decode)?;
        derived.validate()?;
        log::debug!("applied settings layer touching {} top-level keys", layer.len());
        Ok(derived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;

    fn object(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[fixture]
    fn base() -> Settings {
        Settings::default()
    }

    #[rstest]
    #[case(json!({"app": {"name": "x"}}), "app")]
    #[case(json!({"catalog": {"path": "/tmp/x"}}), "catalog")]
    #[case(json!({"context": {"crowd": {"default_risk": 0.2}, "secret": 1}}), "context.secret")]
    #[case(json!({"sources": {"endpoint": "http://x"}}), "sources.endpoint")]
    #[case(json!({"scoring": {"worker_threads": 64}}), "scoring.worker_threads")]
    fn disallowed_keys_name_full_path(base: Settings, #[case] patch: Value, #[case] path: &str) {
        let err = base
            .with_overrides(&object(patch))
            .expect_err("should be rejected");
        assert!(
            matches!(&err, OverrideError::DisallowedKey { path: p } if p == path),
            "unexpected error {err}"
        );
    }

    #[rstest]
    fn scalar_in_place_of_mapping_is_rejected(base: Settings) {
        let err = base
            .with_overrides(&object(json!({"context": 0.5})))
            .expect_err("should be rejected");
        assert_eq!(
            err.to_string(),
            "settings_overrides key 'context' must be a mapping"
        );
    }

    #[rstest]
    fn sibling_keys_survive(base: Settings) {
        let patch = object(json!({"weather": {"weights": {"rain": 0.2}}}));
        let derived = base.with_overrides(&patch).expect("allowed patch");
        assert!((derived.weather.weights.rain - 0.2).abs() < f64::EPSILON);
        assert!(
            (derived.weather.weights.temperature - base.weather.weights.temperature).abs()
                < f64::EPSILON
        );
        assert_eq!(derived.weather.indoor_tag, base.weather.indoor_tag);
    }

    #[rstest]
    fn schema_violations_surface_after_merge(base: Settings) {
        let patch = object(json!({"scoring": {"neutral_score": 2.0}}));
        let err = base.with_overrides(&patch).expect_err("out of range");
        assert!(matches!(
            err,
            OverrideError::Schema(SettingsError::OutOfRange { ref path, .. })
                if path == "scoring.neutral_score"
        ));
    }

    #[rstest]
    fn type_mismatch_names_path(base: Settings) {
        let patch = object(json!({"parking": {"weights": {"lots": "heavy"}}}));
        let err = base.with_overrides(&patch).expect_err("wrong type");
        assert!(matches!(
            err,
            OverrideError::TypeMismatch { ref path, expected: "a number", found: "a string" }
                if path == "parking.weights.lots"
        ));
    }

    #[rstest]
    fn unknown_leaf_under_open_subtree_fails_decode(base: Settings) {
        let patch = object(json!({"weather": {"humidity_weight": 0.3}}));
        assert!(matches!(
            base.with_overrides(&patch),
            Err(OverrideError::Decode(_))
        ));
    }

    #[rstest]
    fn base_is_unchanged_and_patch_round_trips(base: Settings) {
        let original = base.clone();
        let forward = object(json!({"context": {"crowd": {"default_risk": 0.9}}}));
        let derived = base.with_overrides(&forward).expect("allowed patch");
        assert_eq!(base, original);
        let back = object(json!({
            "context": {"crowd": {"default_risk": original.context.crowd.default_risk}}
        }));
        let restored = derived.with_overrides(&back).expect("allowed patch");
        assert_eq!(restored, original);
    }

    #[rstest]
    fn array_values_replace_wholesale(base: Settings) {
        let patch = object(json!({"context": {"crowd": {"peak_hours": []}}}));
        let derived = base.with_overrides(&patch).expect("allowed patch");
        assert!(derived.context.crowd.peak_hours.is_empty());
    }

    #[rstest]
    fn merge_law_holds_for_nested_maps() {
        let merged = deep_merge(
            &json!({"a": {"x": 1, "y": 2}, "b": 3}),
            &json!({"a": {"x": 9}}),
        );
        assert_eq!(merged, json!({"a": {"x": 9, "y": 2}, "b": 3}));
    }
}
