//! Output module for reporting on harvests
//!
//! This module handles:
//! - Status checks for a region's harvest job
//! - CSV export of harvested agents
//! - Job statistics for the `--stats` view

pub mod csv_export;
pub mod stats;
pub mod status;

pub use csv_export::{export_path, write_records, write_records_csv};
pub use stats::{load_statistics, print_statistics, HarvestStatistics};
pub use status::{check_status, StatusKind, StatusReport};

use crate::model::Region;
use crate::storage::{Storage, StorageError};
use crate::HarvestError;
use std::path::{Path, PathBuf};

/// Exports the stored agents of a region to `dir`
///
/// # Arguments
///
/// * `storage` - The storage backend holding the agents
/// * `region` - The region to export
/// * `dir` - Export directory
///
/// # Returns
///
/// * `Ok((PathBuf, usize))` - The export path and the number of agents written
/// * `Err(HarvestError)` - The region is unknown or the export failed
pub fn export_region(
    storage: &dyn Storage,
    region: &Region,
    dir: &Path,
) -> Result<(PathBuf, usize), HarvestError> {
    let region_id = storage
        .get_region_id(region)?
        .ok_or_else(|| StorageError::RegionNotFound(region.to_string()))?;

    let records = storage.load_agents(region_id)?;
    let path = export_path(dir, region);
    let written = write_records_csv(&records, &path)?;

    Ok((path, written))
}
