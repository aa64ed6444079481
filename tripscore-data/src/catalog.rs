//! Destination catalogue loading.
//!
//! The catalogue is a JSON array of destinations. An optional details file
//! maps destination identifiers to extra descriptive fields and is merged in
//! on a best-effort basis: a details file that cannot be read is logged and
//! ignored.

use std::collections::{BTreeMap, BTreeSet};

use camino::Utf8Path;
use serde_json::{Map, Value};
use tripscore_core::Destination;

use crate::DataError;
use crate::fs::read_json;

/// Detail fields copied into [`Destination::metadata`].
pub const DETAIL_FIELDS: [&str; 5] = ["address", "phone", "opening_hours", "description", "url"];

/// Per-destination detail objects keyed by identifier.
pub type DestinationDetails = BTreeMap<String, Map<String, Value>>;

/// Load and validate the catalogue at `path`.
///
/// Destination identifiers must be unique; catalogue order is preserved
/// because it breaks ranking ties.
pub fn load_catalog(path: &Utf8Path) -> Result<Vec<Destination>, DataError> {
    let destinations: Vec<Destination> = read_json(path, "catalog")?;
    let mut seen = BTreeSet::new();
    for destination in &destinations {
        if !seen.insert(destination.id.as_str()) {
            return Err(DataError::DuplicateDestination {
                path: path.to_path_buf(),
                id: destination.id.clone(),
            });
        }
    }
    log::debug!("loaded {} destinations from {path}", destinations.len());
    Ok(destinations)
}

/// Load a details file mapping destination identifiers to detail objects.
///
/// Entries with blank keys or non-object values are skipped, as is a
/// document that is not an object at all.
pub fn load_details(path: &Utf8Path) -> Result<DestinationDetails, DataError> {
    let document: Value = read_json(path, "destination details")?;
    let Value::Object(entries) = document else {
        log::warn!("destination details at {path} are not a JSON object; ignoring them");
        return Ok(DestinationDetails::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(id, value)| {
            let key = id.trim();
            match value {
                Value::Object(fields) if !key.is_empty() => Some((key.to_owned(), fields)),
                _ => None,
            }
        })
        .collect())
}

/// Load the catalogue and merge the optional details file into it.
pub fn load_catalog_with_details(
    catalog: &Utf8Path,
    details: Option<&Utf8Path>,
) -> Result<Vec<Destination>, DataError> {
    let destinations = load_catalog(catalog)?;
    let Some(details_path) = details else {
        return Ok(destinations);
    };
    let extra = match load_details(details_path) {
        Ok(extra) => extra,
        Err(err) => {
            log::warn!("skipping destination details: {err}");
            return Ok(destinations);
        }
    };
    Ok(destinations
        .into_iter()
        .map(|mut destination| {
            if let Some(fields) = extra.get(&destination.id) {
                merge_details(&mut destination, fields);
            }
            destination
        })
        .collect())
}

fn non_blank(fields: &Map<String, Value>, key: &str) -> Option<String> {
    let text = fields.get(key)?.as_str()?.trim();
    (!text.is_empty()).then(|| text.to_owned())
}

fn merge_details(destination: &mut Destination, fields: &Map<String, Value>) {
    for key in DETAIL_FIELDS {
        if let Some(text) = non_blank(fields, key) {
            destination.metadata.insert(key.to_owned(), Value::String(text));
        }
    }
    if let Some(city) = non_blank(fields, "city") {
        destination.city = Some(city);
    }
    if let Some(district) = non_blank(fields, "district") {
        destination.district = Some(district);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;

    struct Workspace {
        _dir: TempDir,
        root: Utf8PathBuf,
    }

    impl Workspace {
        fn write(&self, name: &str, value: &Value) -> Utf8PathBuf {
            let path = self.root.join(name);
            std::fs::write(&path, value.to_string()).expect("write fixture");
            path
        }
    }

    #[fixture]
    fn workspace() -> Workspace {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        Workspace { _dir: dir, root }
    }

    fn catalog_json() -> Value {
        json!([
            {"id": "museum", "name": "Palace Museum",
             "location": {"lat": 25.1024, "lon": 121.5485}, "tags": ["Culture", "indoor"]},
            {"id": "park", "name": "Daan Park",
             "location": {"lat": 25.0299, "lon": 121.5363}, "tags": ["nature"],
             "city": "Taipei"}
        ])
    }

    #[rstest]
    fn catalog_keeps_order_and_normalises_tags(workspace: Workspace) {
        let path = workspace.write("catalog.json", &catalog_json());
        let catalog = load_catalog(&path).expect("valid catalog");
        let ids: Vec<&str> = catalog.iter().map(|d| d.id.as_str()).collect();
        assert_eq!(ids, ["museum", "park"]);
        assert!(catalog.first().expect("museum").tags.contains("culture"));
    }

    #[rstest]
    fn duplicate_ids_are_rejected(workspace: Workspace) {
        let entry = json!({"id": "dup", "name": "Dup", "location": {"lat": 25.0, "lon": 121.5}});
        let path = workspace.write("catalog.json", &json!([entry.clone(), entry]));
        match load_catalog(&path).expect_err("duplicate") {
            DataError::DuplicateDestination { id, .. } => assert_eq!(id, "dup"),
            other => panic!("expected DuplicateDestination, found {other:?}"),
        }
    }

    #[rstest]
    fn invalid_destinations_fail_to_parse(workspace: Workspace) {
        let path = workspace.write(
            "catalog.json",
            &json!([{"id": " ", "name": "Blank", "location": {"lat": 25.0, "lon": 121.5}}]),
        );
        assert!(matches!(
            load_catalog(&path),
            Err(DataError::Parse { what: "catalog", .. })
        ));
    }

    #[rstest]
    fn details_are_merged_by_id(workspace: Workspace) {
        let catalog = workspace.write("catalog.json", &catalog_json());
        let details = workspace.write(
            "details.json",
            &json!({
                "museum": {"address": " 221 Zhishan Rd ", "city": "Taipei",
                           "district": "Shilin", "phone": "", "rating": 5},
                "unknown": {"address": "nowhere"},
                "park": "not an object"
            }),
        );
        let merged = load_catalog_with_details(&catalog, Some(&details)).expect("valid");
        let museum = merged.first().expect("museum");
        assert_eq!(museum.metadata.get("address"), Some(&json!("221 Zhishan Rd")));
        assert!(!museum.metadata.contains_key("phone"));
        assert!(!museum.metadata.contains_key("rating"));
        assert_eq!(museum.city.as_deref(), Some("Taipei"));
        assert_eq!(museum.district.as_deref(), Some("Shilin"));
        let park = merged.get(1).expect("park");
        assert!(park.metadata.is_empty());
    }

    #[rstest]
    fn unreadable_details_are_ignored(workspace: Workspace) {
        let catalog = workspace.write("catalog.json", &catalog_json());
        let missing = workspace.root.join("missing-details.json");
        let merged = load_catalog_with_details(&catalog, Some(&missing)).expect("best effort");
        assert_eq!(merged.len(), 2);
    }

    #[rstest]
    fn non_object_details_are_empty(workspace: Workspace) {
        let details = workspace.write("details.json", &json!(["museum"]));
        assert!(load_details(&details).expect("valid json").is_empty());
    }
}
