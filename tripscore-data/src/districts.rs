//! District baseline table loading.

use camino::Utf8Path;
use tripscore_core::{DistrictFactor, DistrictFactors};

use crate::DataError;
use crate::fs::read_json;

/// Load the district factor table: a JSON array of rows.
///
/// Rows are validated as they are indexed; later rows replace earlier ones
/// for the same city and district.
pub fn load_district_factors(path: &Utf8Path) -> Result<DistrictFactors, DataError> {
    let rows: Vec<DistrictFactor> = read_json(path, "district factors")?;
    let table =
        DistrictFactors::from_rows(rows).map_err(|source| DataError::InvalidDistrictFactors {
            path: path.to_path_buf(),
            source,
        })?;
    log::debug!("loaded {} district factors from {path}", table.len());
    Ok(table)
}
