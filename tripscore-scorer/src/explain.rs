//! Compact text rendering of a breakdown.

use tripscore_core::ScoreBreakdown;

/// Render a breakdown on one line, e.g.
/// `total=0.712 | accessibility=0.800 (w=0.35) | ...`.
#[must_use]
pub fn one_line_summary(breakdown: &ScoreBreakdown) -> String {
    let mut parts = vec![format!("total={:.3}", breakdown.total)];
    parts.extend(breakdown.components.iter().map(|component| {
        format!(
            "{}={:.3} (w={:.2})",
            component.name, component.score, component.weight
        )
    }));
    parts.join(" | ")
}
