//! Test helpers for laying out CLI inputs in a temporary directory.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Value, json};
use std::sync::Arc;
use tempfile::TempDir;
use tripscore_core::WeatherSummary;
use tripscore_core::test_support::{StubTransitSource, StubWeatherSource};

use crate::recommend::{RecommendConfig, SourceBuilder, Sources};
use crate::CliError;

pub(super) fn write_utf8(path: &Utf8Path, contents: &[u8]) {
    std::fs::write(path, contents).expect("write test file");
}

pub(super) fn write_value(path: &Utf8Path, value: &Value) {
    let payload = serde_json::to_string_pretty(value).expect("serialise fixture");
    write_utf8(path, payload.as_bytes());
}

/// A temporary directory holding a catalogue, request and settings file.
pub(super) struct Workspace {
    _tmp: TempDir,
    pub(super) root: Utf8PathBuf,
}

impl Workspace {
    pub(super) fn new() -> Self {
        let tmp = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(tmp.path().to_path_buf()).expect("utf-8 workspace");
        Self { _tmp: tmp, root }
    }

    pub(super) fn request_path(&self) -> Utf8PathBuf {
        self.root.join("request.json")
    }

    pub(super) fn settings_path(&self) -> Utf8PathBuf {
        self.root.join("settings.json")
    }

    pub(super) fn catalog_path(&self) -> Utf8PathBuf {
        self.root.join("catalog.json")
    }

    /// Write a three-destination catalogue and a settings file naming it.
    pub(super) fn write_data(&self) {
        write_value(
            &self.catalog_path(),
            &json!([
                {"id": "museum", "name": "National Palace Museum",
                 "location": {"lat": 25.1024, "lon": 121.5485},
                 "tags": ["culture", "indoor"], "city": "Taipei", "district": "Shilin"},
                {"id": "bar", "name": "Rooftop Bar",
                 "location": {"lat": 25.0400, "lon": 121.5650},
                 "tags": ["nightlife", "adult_only"], "city": "Taipei"},
                {"id": "park", "name": "Daan Forest Park",
                 "location": {"lat": 25.0299, "lon": 121.5363},
                 "tags": ["nature", "outdoor"], "city": "Taipei"}
            ]),
        );
        write_value(
            &self.settings_path(),
            &json!({"catalog": {"path": "catalog.json"}}),
        );
    }

    pub(super) fn write_request(&self, extra: &Value) {
        let mut request = json!({
            "origin": {"lat": 25.0478, "lon": 121.5170},
            "time_window": {"start": "2026-03-07T10:00:00", "end": "2026-03-07T15:00:00"},
            "tag_weights": {"culture": 1.0}
        });
        if let (Some(base), Some(more)) = (request.as_object_mut(), extra.as_object()) {
            base.extend(more.clone());
        }
        write_value(&self.request_path(), &request);
    }
}

/// Serves fixed in-memory datasets instead of reading a snapshot.
pub(super) struct StubSourceBuilder;

impl SourceBuilder for StubSourceBuilder {
    fn build(&self, _config: &RecommendConfig) -> Result<Sources, CliError> {
        Ok(Sources {
            transit: Arc::new(StubTransitSource::empty()),
            weather: Arc::new(StubWeatherSource::uniform(WeatherSummary {
                max_precipitation_probability: Some(10.0),
                mean_temperature_c: Some(23.0),
            })),
        })
    }
}
