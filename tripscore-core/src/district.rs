//! Per-district crowd and family baselines used by the context scorer.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::SettingsError;
use crate::normalise_tag;

/// One row of the district factor table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DistrictFactor {
    /// City name.
    pub city: String,
    /// District name.
    pub district: String,
    /// Baseline crowd risk in `[0, 1]`.
    pub crowd_risk: f64,
    /// Baseline family suitability in `[0, 1]`, if surveyed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_friendliness: Option<f64>,
}

/// Lookup table of [`DistrictFactor`]s keyed by lowercase city and district.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistrictFactors {
    entries: BTreeMap<(String, String), DistrictFactor>,
}

impl DistrictFactors {
    /// Build a table from rows, validating each baseline.
    ///
    /// Later rows replace earlier rows for the same district.
    ///
    /// # Examples
    /// ```
    /// use tripscore_core::{DistrictFactor, DistrictFactors};
    ///
    /// # fn main() -> Result<(), tripscore_core::SettingsError> {
    /// let table = DistrictFactors::from_rows(vec![DistrictFactor {
    ///     city: "Taipei".into(),
    ///     district: "Xinyi".into(),
    ///     crowd_risk: 0.8,
    ///     family_friendliness: Some(0.4),
    /// }])?;
    /// assert!(table.lookup(Some("taipei"), Some("XINYI")).is_some());
    /// # Ok(())
    /// # }
    /// ```
    pub fn from_rows(rows: Vec<DistrictFactor>) -> Result<Self, SettingsError> {
        let mut entries = BTreeMap::new();
        for row in rows {
            let (Some(city), Some(district)) =
                (normalise_tag(&row.city), normalise_tag(&row.district))
            else {
                return Err(SettingsError::Blank {
                    path: "district_factors.city_or_district".to_owned(),
                });
            };
            let prefix = format!("district_factors.{city}.{district}");
            crate::settings::check_unit(&format!("{prefix}.crowd_risk"), row.crowd_risk)?;
            if let Some(family) = row.family_friendliness {
                crate::settings::check_unit(&format!("{prefix}.family_friendliness"), family)?;
            }
            entries.insert((city, district), row);
        }
        Ok(Self { entries })
    }

    /// Find the factor for a city and district, case-insensitively.
    #[must_use]
    pub fn lookup(&self, city: Option<&str>, district: Option<&str>) -> Option<&DistrictFactor> {
        let key = (normalise_tag(city?)?, normalise_tag(district?)?);
        self.entries.get(&key)
    }

    /// Number of districts in the table.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
