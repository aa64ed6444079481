//! Feature scorers and composite aggregation for `TripScore`.
//!
//! The crate turns raw datasets into explainable scores:
//! - **Metric extraction** indexes stops, stations and car parks in an
//!   R\*-tree and measures counts and nearest distances around each
//!   destination, keeping "dataset unavailable" distinct from "nothing
//!   nearby".
//! - **Feature scorers** map those metrics, the forecast, the traveller's
//!   tag weights and district context into `0.0..=1.0` sub-scores, each with
//!   reasons and machine-readable details. Every scorer degrades through
//!   [`fail_open`] rather than erroring.
//! - **Composite aggregation** resolves component weights across precedence
//!   layers, renormalises them and sums the weighted contributions into a
//!   [`ScoreBreakdown`](tripscore_core::ScoreBreakdown).
//!
//! # Examples
//!
//! ```
//! use tripscore_core::{ComponentWeights, PartialComponentWeights};
//! use tripscore_scorer::resolve_component_weights;
//!
//! let config = ComponentWeights { accessibility: 0.35, weather: 0.3, preference: 0.2, context: 0.15 };
//! let preset = PartialComponentWeights { weather: Some(0.4), ..Default::default() };
//! let weights = resolve_component_weights(&[config.into(), preset]);
//! assert!((weights.total() - 1.0).abs() < 1e-9);
//! ```

#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]

use serde::Serialize;
use serde_json::Value;

mod accessibility;
mod composite;
mod context;
mod explain;
mod fallback;
mod metrics;
mod parking;
mod plan;
mod preference;
mod spatial;
mod weather;
mod weights;

pub use accessibility::score_accessibility;
pub use composite::{ScoredFeature, compose, resolve_component_weights};
pub use context::{ContextInputs, crowd_label, score_context};
pub use explain::one_line_summary;
pub use fallback::{Fallback, fail_open};
pub use metrics::{
    AccessibilityMetrics, BikeSignal, CityDatasets, ParkingMetrics, StopSignal,
    measure_accessibility, measure_parking,
};
pub use parking::score_parking;
pub use plan::{Datasets, ScoringPlan};
pub use preference::score_preference;
pub use spatial::{Located, StationIndex};
pub use weather::score_weather;
pub use weights::{normalise_weights, sanitise_weight, weighted_mean};

/// Serialise a value for a details map; non-finite floats become `null`.
pub(crate) fn detail<T: Serialize + ?Sized>(value: &T) -> Value {
    serde_json::to_value(value).unwrap_or(Value::Null)
}

/// Human-readable distance: metres below one kilometre, else kilometres.
pub(crate) fn format_distance(metres: f64) -> String {
    if metres >= 1_000.0 {
        format!("{:.1}km", metres / 1_000.0)
    } else {
        format!("{metres:.0}m")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(200.4, "200m")]
    #[case(999.0, "999m")]
    #[case(1_234.0, "1.2km")]
    fn distances_read_naturally(#[case] metres: f64, #[case] expected: &str) {
        assert_eq!(format_distance(metres), expected);
    }

    #[rstest]
    fn non_finite_details_are_null() {
        assert_eq!(detail(&f64::INFINITY), Value::Null);
    }
}
