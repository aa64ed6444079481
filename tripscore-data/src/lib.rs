//! File-backed data access for the TripScore engine.
//!
//! Responsibilities:
//! - Load the destination catalogue, merging optional per-destination details.
//! - Load the district crowd and family baselines.
//! - Layer a JSON settings file over the built-in defaults.
//! - Serve transit and weather datasets from a JSON snapshot file.
//!
//! Boundaries:
//! - Do not encode scoring rules (live in `tripscore-scorer`).
//! - Every path is opened with ambient authority through `cap-std`.
//!
//! Invariants:
//! - Loaded values are validated before they are returned.
//! - No global mutable state.
#![forbid(unsafe_code)]

mod catalog;
mod districts;
mod error;
pub mod fs;
mod settings;
mod snapshot;

pub use catalog::{
    DETAIL_FIELDS, DestinationDetails, load_catalog, load_catalog_with_details, load_details,
};
pub use districts::load_district_factors;
pub use error::DataError;
pub use settings::{load_settings, resolve_relative};
pub use snapshot::{CitySnapshot, Snapshot, SnapshotSource};
