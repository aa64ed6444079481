//! Errors a caller can observe from [`Recommender::recommend`].
//!
//! [`Recommender::recommend`]: crate::Recommender::recommend

use thiserror::Error;
use tripscore_core::{OverrideError, PreferencesError, SettingsError};

/// A malformed request, reported before any scoring work begins.
///
/// Collaborator failures never appear here; they degrade to
/// "dataset unavailable" and surface as warnings instead.
#[derive(Debug, Error)]
pub enum RecommendError {
    /// The request failed range or window validation.
    #[error("invalid request: {0}")]
    Preferences(#[from] PreferencesError),
    /// The settings override patch was rejected.
    #[error(transparent)]
    Overrides(#[from] OverrideError),
    /// The request named a preset that is not configured.
    #[error("unknown preset '{name}'")]
    UnknownPreset {
        /// Name as supplied by the caller.
        name: String,
    },
    /// The effective settings could not be interpreted.
    #[error("invalid settings: {0}")]
    Settings(#[from] SettingsError),
}
