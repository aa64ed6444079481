//! Catalogue destinations and tag normalisation.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::GeoPoint;

/// Normalise a single tag: trimmed and lowercased.
///
/// Returns `None` when nothing remains after trimming.
///
/// # Examples
/// ```
/// use tripscore_core::normalise_tag;
///
/// assert_eq!(normalise_tag("  Night_Market "), Some("night_market".to_owned()));
/// assert_eq!(normalise_tag("   "), None);
/// ```
#[must_use]
pub fn normalise_tag(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_lowercase())
}

/// Normalise a collection of tags into a sorted, de-duplicated set.
#[must_use]
pub fn normalise_tags<I, S>(raw: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw.into_iter()
        .filter_map(|tag| normalise_tag(tag.as_ref()))
        .collect()
}

/// A point of interest that may be recommended.
///
/// Tags are always stored normalised, so membership tests can compare
/// lowercase strings directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawDestination")]
pub struct Destination {
    /// Stable catalogue identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Geographic position.
    pub location: GeoPoint,
    /// Normalised tag set.
    pub tags: BTreeSet<String>,
    /// City the destination belongs to, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    /// District within the city, if known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub district: Option<String>,
    /// Free-form descriptive metadata such as address or opening hours.
    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

#[derive(Deserialize)]
struct RawDestination {
    id: String,
    name: String,
    location: GeoPoint,
    #[serde(default)]
    tags: Vec<String>,
    #[serde(default)]
    city: Option<String>,
    #[serde(default)]
    district: Option<String>,
    #[serde(default)]
    metadata: serde_json::Map<String, serde_json::Value>,
}

/// Errors returned by [`Destination::new`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum DestinationError {
    /// The identifier was blank.
    #[error("destination id must not be empty")]
    MissingId,
    /// The display name was blank.
    #[error("destination '{id}' must have a name")]
    MissingName {
        /// Identifier of the offending destination.
        id: String,
    },
}

impl Destination {
    /// Validate and construct a destination, normalising its tags.
    ///
    /// # Examples
    /// ```
    /// use tripscore_core::{Destination, GeoPoint};
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let dest = Destination::new(
    ///     "tp-101",
    ///     "Taipei 101",
    ///     GeoPoint::new(25.0340, 121.5645)?,
    ///     ["Landmark", "indoor", "landmark"],
    /// )?;
    /// assert_eq!(dest.tags.len(), 2);
    /// # Ok(())
    /// # }
    /// ```
    pub fn new<I, S>(
        id: impl Into<String>,
        name: impl Into<String>,
        location: GeoPoint,
        tags: I,
    ) -> Result<Self, DestinationError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let trimmed_id = id.into().trim().to_owned();
        if trimmed_id.is_empty() {
            return Err(DestinationError::MissingId);
        }
        let trimmed_name = name.into().trim().to_owned();
        if trimmed_name.is_empty() {
            return Err(DestinationError::MissingName { id: trimmed_id });
        }
        Ok(Self {
            id: trimmed_id,
            name: trimmed_name,
            location,
            tags: normalise_tags(tags),
            city: None,
            district: None,
            metadata: serde_json::Map::new(),
        })
    }

    /// Attach the city this destination belongs to.
    #[must_use]
    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    /// Attach the district this destination belongs to.
    #[must_use]
    pub fn with_district(mut self, district: impl Into<String>) -> Self {
        self.district = Some(district.into());
        self
    }

    /// Whether the destination carries `tag` once normalised.
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        normalise_tag(tag).is_some_and(|t| self.tags.contains(&t))
    }

    /// City key used to group transit fetches, falling back to `default`.
    #[must_use]
    pub fn city_key(&self, default: &str) -> String {
        self.city
            .as_deref()
            .and_then(normalise_tag)
            .or_else(|| normalise_tag(default))
            .unwrap_or_default()
    }
}

impl TryFrom<RawDestination> for Destination {
    type Error = DestinationError;

    fn try_from(raw: RawDestination) -> Result<Self, Self::Error> {
        let mut dest = Self::new(raw.id, raw.name, raw.location, raw.tags)?;
        dest.city = raw.city.filter(|c| !c.trim().is_empty());
        dest.district = raw.district.filter(|d| !d.trim().is_empty());
        dest.metadata = raw.metadata;
        Ok(dest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn point() -> GeoPoint {
        GeoPoint::new(25.0, 121.5).expect("valid point")
    }

    #[rstest]
    fn tags_are_trimmed_lowercased_and_deduplicated(point: GeoPoint) {
        let dest = Destination::new("a", "A", point, [" Food", "food ", "", "Culture"])
            .expect("valid destination");
        let tags: Vec<&str> = dest.tags.iter().map(String::as_str).collect();
        assert_eq!(tags, ["culture", "food"]);
    }

    #[rstest]
    #[case("", "Name", DestinationError::MissingId)]
    #[case("x", "  ", DestinationError::MissingName { id: "x".to_owned() })]
    fn rejects_blank_fields(
        point: GeoPoint,
        #[case] id: &str,
        #[case] name: &str,
        #[case] expected: DestinationError,
    ) {
        let err = Destination::new(id, name, point, ["t"]).expect_err("should fail");
        assert_eq!(err, expected);
    }

    #[rstest]
    fn city_key_falls_back_to_default(point: GeoPoint) {
        let dest = Destination::new("a", "A", point, ["t"]).expect("valid destination");
        assert_eq!(dest.city_key("Taipei"), "taipei");
        let located = dest.with_city(" Tainan ");
        assert_eq!(located.city_key("Taipei"), "tainan");
    }

    #[rstest]
    fn deserialising_normalises_tags() {
        let json = r#"{
            "id": "d1",
            "name": "Museum",
            "location": {"lat": 25.0, "lon": 121.5},
            "tags": ["Culture", "INDOOR"],
            "district": "Zhongzheng"
        }"#;
        let dest: Destination = serde_json::from_str(json).expect("valid json");
        assert!(dest.has_tag("culture"));
        assert!(dest.has_tag(" Indoor"));
        assert_eq!(dest.district.as_deref(), Some("Zhongzheng"));
    }
}
