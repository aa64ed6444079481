//! Catalogue pruning by required and excluded tags.

use std::collections::BTreeSet;

use tripscore_core::Destination;

use crate::{Warning, WarningCode};

/// Candidates that survived the tag filter, in catalogue order.
#[derive(Debug)]
pub(crate) struct Filtered<'c> {
    pub(crate) candidates: Vec<&'c Destination>,
    /// Destinations dropped for carrying an excluded tag.
    pub(crate) excluded: usize,
    /// Destinations dropped for lacking a required tag.
    pub(crate) missing_required: usize,
}

/// Keep destinations carrying every required tag and no excluded tag.
///
/// A destination failing both tests is counted once, as excluded.
pub(crate) fn filter_candidates<'c>(
    catalog: &'c [Destination],
    required: &BTreeSet<String>,
    excluded: &BTreeSet<String>,
) -> Filtered<'c> {
    let mut filtered = Filtered {
        candidates: Vec::with_capacity(catalog.len()),
        excluded: 0,
        missing_required: 0,
    };
    for destination in catalog {
        if !destination.tags.is_disjoint(excluded) {
            filtered.excluded += 1;
        } else if !destination.tags.is_superset(required) {
            filtered.missing_required += 1;
        } else {
            filtered.candidates.push(destination);
        }
    }
    filtered
}

impl Filtered<'_> {
    /// Warnings describing what the filter removed.
    pub(crate) fn warnings(&self) -> Vec<Warning> {
        let mut warnings = Vec::new();
        if self.excluded > 0 {
            log::warn!("{} destinations excluded by excluded_tags", self.excluded);
            warnings.push(Warning::new(
                WarningCode::TagFilterExcluded,
                format!("{} destinations excluded by excluded_tags", self.excluded),
            ));
        }
        if self.missing_required > 0 {
            log::warn!(
                "{} destinations excluded by required_tags",
                self.missing_required
            );
            warnings.push(Warning::new(
                WarningCode::TagFilterExcluded,
                format!(
                    "{} destinations excluded by required_tags",
                    self.missing_required
                ),
            ));
        }
        if self.candidates.is_empty() {
            warnings.push(Warning::new(
                WarningCode::NoCandidates,
                "No destinations match the requested tag filters",
            ));
        }
        warnings
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use tripscore_core::test_support::point;

    fn tags(raw: &[&str]) -> BTreeSet<String> {
        raw.iter().map(|t| (*t).to_owned()).collect()
    }

    #[fixture]
    fn catalog() -> Vec<Destination> {
        [
            ("museum", vec!["culture", "indoor"]),
            ("bar", vec!["nightlife", "adult_only"]),
            ("park", vec!["nature", "outdoor"]),
        ]
        .into_iter()
        .map(|(id, t)| Destination::new(id, id, point(25.04, 121.56), t).expect("valid"))
        .collect()
    }

    #[rstest]
    fn excluded_tags_drop_destinations(catalog: Vec<Destination>) {
        let filtered = filter_candidates(&catalog, &BTreeSet::new(), &tags(&["adult_only"]));
        let ids: Vec<&str> = filtered.candidates.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["museum", "park"]);
        assert_eq!(filtered.excluded, 1);
        let warnings = filtered.warnings();
        assert_eq!(warnings.len(), 1);
        assert_eq!(
            warnings.first().map(|w| w.message.as_str()),
            Some("1 destinations excluded by excluded_tags")
        );
    }

    #[rstest]
    fn required_tags_must_all_be_present(catalog: Vec<Destination>) {
        let filtered = filter_candidates(&catalog, &tags(&["culture", "indoor"]), &BTreeSet::new());
        assert_eq!(filtered.candidates.len(), 1);
        assert_eq!(filtered.missing_required, 2);
    }

    #[rstest]
    fn empty_result_warns_no_candidates(catalog: Vec<Destination>) {
        let filtered = filter_candidates(&catalog, &tags(&["spa"]), &BTreeSet::new());
        let codes: Vec<WarningCode> = filtered.warnings().iter().map(|w| w.code).collect();
        assert_eq!(
            codes,
            [WarningCode::TagFilterExcluded, WarningCode::NoCandidates]
        );
    }

    #[rstest]
    fn no_filters_keep_catalogue_order(catalog: Vec<Destination>) {
        let filtered = filter_candidates(&catalog, &BTreeSet::new(), &BTreeSet::new());
        assert_eq!(filtered.candidates.len(), 3);
        assert!(filtered.warnings().is_empty());
    }
}
