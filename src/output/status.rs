//! Job status reporting
//!
//! Maps a region's stored job status onto an HTTP-style code and message, so
//! a caller polling for a harvest can tell "still running" from "retry".

use crate::model::{JobStatus, Region};
use crate::storage::Storage;
use serde::Serialize;
use std::fmt;

/// What a status check found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusKind {
    /// The region was never harvested
    NotFound,
    InProgress,
    Completed,
    /// The last harvest failed and should be retried
    Failed,
    /// The stored status is not one this build knows
    Unknown,
    /// Storage could not be queried
    StorageFailure,
}

impl StatusKind {
    /// HTTP-style code for this outcome
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InProgress => 409,
            Self::Completed => 200,
            Self::Failed => 422,
            Self::Unknown => 400,
            Self::StorageFailure => 500,
        }
    }
}

/// Result of a status check
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusReport {
    pub kind: StatusKind,
    pub code: u16,
    pub message: String,
}

impl StatusReport {
    fn new(kind: StatusKind, message: String) -> Self {
        Self {
            kind,
            code: kind.code(),
            message,
        }
    }
}

impl fmt::Display for StatusReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)
    }
}

/// Reports the harvest status of a region
///
/// Never fails: storage errors are reported as a 500.
pub fn check_status(storage: &dyn Storage, region: &Region) -> StatusReport {
    let stored = storage.get_region_id(region).and_then(|id| match id {
        Some(id) => storage.get_job_status(id),
        None => Ok(None),
    });

    match stored {
        Ok(None) => StatusReport::new(
            StatusKind::NotFound,
            format!("{} has not been harvested yet", region),
        ),
        Ok(Some(raw)) => match JobStatus::from_db_string(&raw) {
            Some(JobStatus::Pending) => StatusReport::new(
                StatusKind::InProgress,
                format!("Harvest of {} is in progress", region),
            ),
            Some(JobStatus::Completed) => StatusReport::new(
                StatusKind::Completed,
                format!("Harvest of {} is complete", region),
            ),
            Some(JobStatus::Error) => StatusReport::new(
                StatusKind::Failed,
                format!("Harvest of {} failed, please retry", region),
            ),
            None => StatusReport::new(
                StatusKind::Unknown,
                format!("Unknown status '{}' for {}", raw, region),
            ),
        },
        Err(e) => {
            tracing::error!("Status check for {} failed: {}", region, e);
            StatusReport::new(StatusKind::StorageFailure, format!("Storage error: {}", e))
        }
    }
}
