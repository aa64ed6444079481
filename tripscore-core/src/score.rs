//! Helpers shared by every score producer.

/// Clamp a raw score into `[0.0, 1.0]`.
///
/// `NaN` maps to `0.0` so it can never leak into a composite total;
/// infinities saturate at the nearer bound.
///
/// # Examples
/// ```
/// use tripscore_core::clamp01;
///
/// assert_eq!(clamp01(1.7), 1.0);
/// assert_eq!(clamp01(-0.2), 0.0);
/// assert_eq!(clamp01(f64::NAN), 0.0);
/// assert_eq!(clamp01(f64::INFINITY), 1.0);
/// ```
#[must_use]
pub fn clamp01(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
