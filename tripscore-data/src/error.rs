//! Errors raised while loading data files.

use camino::Utf8PathBuf;
use thiserror::Error;
use tripscore_core::{OverrideError, SettingsError};

/// Errors raised by the file-backed loaders.
#[derive(Debug, Error)]
pub enum DataError {
    /// Opening a data file failed.
    #[error("failed to open {what} at {path:?}: {source}")]
    Open {
        /// Kind of file being read.
        what: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Underlying IO failure.
        #[source]
        source: std::io::Error,
    },
    /// A data file was not valid JSON or did not match the expected shape.
    #[error("failed to parse {what} JSON at {path:?}: {source}")]
    Parse {
        /// Kind of file being read.
        what: &'static str,
        /// Offending path.
        path: Utf8PathBuf,
        /// Decoder failure, including line and column.
        #[source]
        source: serde_json::Error,
    },
    /// Two catalogue entries share an identifier.
    #[error("catalog at {path:?} lists destination '{id}' more than once")]
    DuplicateDestination {
        /// Catalogue path.
        path: Utf8PathBuf,
        /// Repeated identifier.
        id: String,
    },
    /// A district factor row was out of range or blank.
    #[error("district factors in {path:?} are invalid: {source}")]
    InvalidDistrictFactors {
        /// Table path.
        path: Utf8PathBuf,
        /// Validation failure.
        #[source]
        source: SettingsError,
    },
    /// A settings file did not layer cleanly over the defaults.
    #[error("settings in {path:?} are invalid: {source}")]
    InvalidSettings {
        /// Settings path.
        path: Utf8PathBuf,
        /// Merge or validation failure.
        #[source]
        source: OverrideError,
    },
}
