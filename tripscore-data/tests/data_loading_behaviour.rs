#![expect(
    clippy::expect_used,
    reason = "tests should fail fast when setup breaks"
)]

//! Behavioural coverage for the file-backed loaders.

use std::cell::RefCell;

use camino::Utf8PathBuf;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::{Value, json};
use tempfile::TempDir;
use tripscore_core::{Destination, ParkingLot, SourceError, TransitSource};
use tripscore_data::{
    SnapshotSource, load_catalog_with_details, load_settings, resolve_relative,
};

/// Shared state threaded through each scenario.
pub struct TestContext {
    dir: TempDir,
    settings_path: RefCell<Option<Utf8PathBuf>>,
    catalog: RefCell<Vec<Destination>>,
    snapshot: RefCell<SnapshotSource>,
    parking: RefCell<Option<Result<Vec<ParkingLot>, SourceError>>>,
}

impl TestContext {
    fn root(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().to_path_buf()).expect("utf-8 workspace")
    }

    fn write(&self, name: &str, value: &Value) -> Utf8PathBuf {
        let path = self.root().join(name);
        std::fs::write(&path, value.to_string()).expect("write fixture");
        path
    }
}

#[fixture]
/// Fresh scenario state in its own temporary directory.
pub fn context() -> TestContext {
    TestContext {
        dir: TempDir::new().expect("tempdir"),
        settings_path: RefCell::new(None),
        catalog: RefCell::new(Vec::new()),
        snapshot: RefCell::new(SnapshotSource::default()),
        parking: RefCell::new(None),
    }
}

#[given("a data directory with a settings file naming catalog.json and details.json")]
fn data_directory(context: &TestContext) {
    context.write(
        "catalog.json",
        &json!([
            {"id": "museum", "name": "National Palace Museum",
             "location": {"lat": 25.1024, "lon": 121.5485}, "tags": ["culture"]},
            {"id": "market", "name": "Shilin Night Market",
             "location": {"lat": 25.0880, "lon": 121.5241}, "tags": ["food"]}
        ]),
    );
    context.write(
        "details.json",
        &json!({"museum": {"address": "221 Zhishan Rd", "district": "Shilin"}}),
    );
    let settings = context.write(
        "settings.json",
        &json!({"catalog": {"path": "catalog.json", "details_path": "details.json"}}),
    );
    *context.settings_path.borrow_mut() = Some(settings);
}

#[given("a snapshot capturing bus stops for Taipei")]
fn bus_only_snapshot(context: &TestContext) {
    let path = context.write(
        "snapshot.json",
        &json!({"cities": {"Taipei": {"bus_stops": []}}}),
    );
    *context.snapshot.borrow_mut() = SnapshotSource::load(&path).expect("valid snapshot");
}

#[when("the catalogue is loaded through the settings file")]
fn load_through_settings(context: &TestContext) {
    let settings_path = context
        .settings_path
        .borrow()
        .clone()
        .expect("settings written");
    let settings = load_settings(&settings_path).expect("valid settings");
    let catalog = settings.catalog.path.as_deref().expect("catalog path");
    let details = settings
        .catalog
        .details_path
        .as_deref()
        .map(|p| resolve_relative(&settings_path, p));
    *context.catalog.borrow_mut() = load_catalog_with_details(
        &resolve_relative(&settings_path, catalog),
        details.as_deref(),
    )
    .expect("valid catalog");
}

#[when("parking lots are requested for Taipei")]
fn request_parking(context: &TestContext) {
    *context.parking.borrow_mut() = Some(context.snapshot.borrow().parking_lots("taipei"));
}

#[then("{count} destinations are loaded")]
fn destination_count(context: &TestContext, count: usize) {
    assert_eq!(context.catalog.borrow().len(), count);
}

#[then("destination {id} has address \"{address}\"")]
fn destination_address(context: &TestContext, id: String, address: String) {
    let catalog = context.catalog.borrow();
    let destination = catalog
        .iter()
        .find(|d| d.id == id)
        .expect("destination present");
    assert_eq!(destination.metadata.get("address"), Some(&json!(address)));
}

#[then("the dataset is reported unavailable")]
fn reported_unavailable(context: &TestContext) {
    let outcome = context.parking.borrow();
    assert!(matches!(
        outcome.as_ref().expect("requested"),
        Err(SourceError::Unavailable { .. })
    ));
}

#[scenario(path = "tests/features/data_loading.feature", index = 0)]
fn settings_locate_catalogue(context: TestContext) {
    let _ = context;
}

#[scenario(path = "tests/features/data_loading.feature", index = 1)]
fn snapshot_gaps_are_unavailable(context: TestContext) {
    let _ = context;
}
