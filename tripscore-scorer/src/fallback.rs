//! The single fail-open policy shared by every scorer.
//!
//! Whenever a scorer cannot compute a value it returns the configured
//! neutral score, a reason saying why, and a `fallback` flag in its
//! details. Keeping the wording and flag here means the four scorers
//! degrade identically.

use serde_json::Value;
use tripscore_core::{Details, FeatureScore, clamp01};

/// Why a score fell back to neutral.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fallback<'a> {
    /// The named input could not be fetched.
    Unavailable(&'a str),
    /// The named blend had no positive weight.
    Misconfigured(&'a str),
    /// The named input was present but carried nothing to score.
    NoSignal(&'a str),
}

impl Fallback<'_> {
    /// Machine-readable flag stored under `details.fallback`.
    #[must_use]
    pub const fn flag(&self) -> &'static str {
        match self {
            Self::Unavailable(_) => "unavailable",
            Self::Misconfigured(_) => "weights_misconfigured",
            Self::NoSignal(_) => "no_signal",
        }
    }

    /// Human-readable reason.
    #[must_use]
    pub fn reason(&self) -> String {
        match self {
            Self::Unavailable(what) => format!("{what} unavailable; using neutral score"),
            Self::Misconfigured(what) => {
                format!("{what} weights misconfigured; using neutral score")
            }
            Self::NoSignal(what) => format!("{what}; using neutral score"),
        }
    }
}

/// Neutral feature score explaining why it is neutral.
///
/// `details` is kept and extended with `fallback` and `neutral_score`;
/// `extra_reasons` follow the fallback reason.
#[must_use]
pub fn fail_open(
    neutral: f64,
    fallback: Fallback<'_>,
    mut details: Details,
    extra_reasons: Vec<String>,
) -> FeatureScore {
    let neutral_score = clamp01(neutral);
    details.insert("fallback".to_owned(), Value::from(fallback.flag()));
    details.insert("neutral_score".to_owned(), Value::from(neutral_score));
    let mut reasons = Vec::with_capacity(extra_reasons.len() + 1);
    reasons.push(fallback.reason());
    reasons.extend(extra_reasons);
    FeatureScore::new(neutral_score, reasons, details)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(Fallback::Unavailable("Weather data"), "Weather data unavailable; using neutral score", "unavailable")]
    #[case(Fallback::Misconfigured("Context"), "Context weights misconfigured; using neutral score", "weights_misconfigured")]
    fn reasons_and_flags_are_consistent(
        #[case] fallback: Fallback<'_>,
        #[case] reason: &str,
        #[case] flag: &str,
    ) {
        let score = fail_open(0.5, fallback, Details::new(), vec!["extra".to_owned()]);
        assert!((score.score - 0.5).abs() < f64::EPSILON);
        assert_eq!(score.reasons, [reason, "extra"]);
        assert_eq!(score.details.get("fallback"), Some(&Value::from(flag)));
    }
}
