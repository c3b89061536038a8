//! Job status tracking for region harvests
//!
//! `JobStatus` is what gets persisted; `JobState` adds the in-memory
//! `NotStarted` state so the orchestrator can enforce its transitions.

use crate::model::Region;
use crate::HarvestError;
use std::fmt;

/// Persisted status of a region's harvest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobStatus {
    /// Harvest announced and still running
    Pending,

    /// Harvest finished and its records were persisted
    Completed,

    /// Harvest aborted; the caller should retry
    Error,
}

impl JobStatus {
    /// Converts the status to its database string representation
    pub fn to_db_string(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Completed => "COMPLETED",
            Self::Error => "ERROR",
        }
    }

    /// Parses a status from its database string representation
    ///
    /// Returns None if the string doesn't match any known status.
    pub fn from_db_string(s: &str) -> Option<Self> {
        match s {
            "PENDING" => Some(Self::Pending),
            "COMPLETED" => Some(Self::Completed),
            "ERROR" => Some(Self::Error),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.to_db_string())
    }
}

/// In-memory lifecycle of a harvest job
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JobState {
    NotStarted,
    Pending,
    Completed,
    Error,
}

impl JobState {
    /// Checks whether moving from this state to `to` is allowed
    ///
    /// `NotStarted -> Pending -> {Completed, Error}` are the only edges. A job
    /// that fails before its PENDING announcement lands may also go straight
    /// from `NotStarted` to `Error`.
    pub fn can_transition_to(&self, to: JobState) -> bool {
        matches!(
            (self, to),
            (Self::NotStarted, Self::Pending)
                | (Self::NotStarted, Self::Error)
                | (Self::Pending, Self::Completed)
                | (Self::Pending, Self::Error)
        )
    }

    /// Persisted status for this state, if it has one
    pub fn status(&self) -> Option<JobStatus> {
        match self {
            Self::NotStarted => None,
            Self::Pending => Some(JobStatus::Pending),
            Self::Completed => Some(JobStatus::Completed),
            Self::Error => Some(JobStatus::Error),
        }
    }
}

/// A harvest job for one region
#[derive(Debug, Clone)]
pub struct HarvestJob {
    pub region: Region,
    state: JobState,
}

impl HarvestJob {
    pub fn new(region: Region) -> Self {
        Self {
            region,
            state: JobState::NotStarted,
        }
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    /// Moves the job to `to`, returning the status that should be persisted
    pub fn transition(&mut self, to: JobState) -> Result<JobStatus, HarvestError> {
        let invalid = HarvestError::InvalidTransition {
            from: self.state,
            to,
        };

        // NotStarted is never a valid target, so every allowed edge has a status
        match to.status() {
            Some(status) if self.state.can_transition_to(to) => {
                self.state = to;
                Ok(status)
            }
            _ => Err(invalid),
        }
    }
}
