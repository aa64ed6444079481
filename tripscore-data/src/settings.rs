//! Settings file loading.

use camino::{Utf8Path, Utf8PathBuf};
use serde_json::{Map, Value};
use tripscore_core::Settings;

use crate::DataError;
use crate::fs::read_json;

/// Layer the JSON object at `path` over the default settings.
///
/// The file may be partial; absent keys keep their defaults. The file is
/// trusted, so unlike a request patch it may set paths, presets and the
/// `app` section. The merged tree is validated before it is returned.
pub fn load_settings(path: &Utf8Path) -> Result<Settings, DataError> {
    let layer: Map<String, Value> = read_json(path, "settings")?;
    let settings =
        Settings::default()
            .layered(&layer)
            .map_err(|source| DataError::InvalidSettings {
                path: path.to_path_buf(),
                source,
            })?;
    log::info!("loaded settings from {path}");
    Ok(settings)
}

/// Resolve a path named inside `origin_file` against that file's directory.
///
/// Absolute paths are returned unchanged.
#[must_use]
pub fn resolve_relative(origin_file: &Utf8Path, configured: &str) -> Utf8PathBuf {
    origin_file
        .parent()
        .unwrap_or_else(|| Utf8Path::new(""))
        .join(configured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};
    use serde_json::json;
    use tempfile::TempDir;
    use tripscore_core::OverrideError;

    struct SettingsFile {
        _dir: TempDir,
        path: Utf8PathBuf,
    }

    #[fixture]
    fn settings_file() -> SettingsFile {
        let dir = TempDir::new().expect("tempdir");
        let root = Utf8PathBuf::from_path_buf(dir.path().to_path_buf()).expect("utf-8 workspace");
        SettingsFile {
            _dir: dir,
            path: root.join("settings.json"),
        }
    }

    fn write(file: &SettingsFile, value: &Value) {
        std::fs::write(&file.path, value.to_string()).expect("write settings");
    }

    #[rstest]
    fn partial_files_keep_defaults(settings_file: SettingsFile) {
        write(
            &settings_file,
            &json!({"scoring": {"top_n_default": 5}, "catalog": {"path": "catalog.json"}}),
        );
        let loaded = load_settings(&settings_file.path).expect("valid settings");
        let defaults = Settings::default();
        assert_eq!(loaded.scoring.top_n_default, 5);
        assert_eq!(loaded.catalog.path.as_deref(), Some("catalog.json"));
        assert_eq!(loaded.weather, defaults.weather);
    }

    #[rstest]
    fn out_of_range_values_are_rejected(settings_file: SettingsFile) {
        write(&settings_file, &json!({"scoring": {"neutral_score": 3.0}}));
        match load_settings(&settings_file.path).expect_err("out of range") {
            DataError::InvalidSettings {
                source: OverrideError::Schema(_),
                ..
            } => {}
            other => panic!("expected a schema failure, found {other:?}"),
        }
    }

    #[rstest]
    fn type_mismatches_are_rejected(settings_file: SettingsFile) {
        write(&settings_file, &json!({"scoring": {"top_n_default": "ten"}}));
        assert!(matches!(
            load_settings(&settings_file.path),
            Err(DataError::InvalidSettings {
                source: OverrideError::TypeMismatch { .. },
                ..
            })
        ));
    }

    #[rstest]
    #[case("/data/catalog.json", "/data/catalog.json")]
    #[case("catalog.json", "/etc/tripscore/catalog.json")]
    #[case("../shared/catalog.json", "/etc/tripscore/../shared/catalog.json")]
    fn configured_paths_follow_the_settings_file(#[case] configured: &str, #[case] expected: &str) {
        let origin = Utf8Path::new("/etc/tripscore/settings.json");
        assert_eq!(resolve_relative(origin, configured), Utf8PathBuf::from(expected));
    }
}
