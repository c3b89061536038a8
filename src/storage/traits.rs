//! Storage traits and error types
//!
//! This module defines the trait interface for storage backends and
//! associated error types.

use crate::model::{EnrichedRecord, JobStatus, Region};
use crate::storage::JobRecord;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Storage lock poisoned: {0}")]
    Lock(String),

    #[error("Region not found: {0}")]
    RegionNotFound(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// This trait defines all database operations needed by the harvester and
/// the reporting commands.
pub trait Storage {
    // ===== Job Status =====

    /// Upserts the region and overwrites its job status
    ///
    /// # Arguments
    ///
    /// * `region` - The region the job runs for
    /// * `status` - The status to record
    /// * `config_hash` - Hash of the configuration the job runs under
    ///
    /// # Returns
    ///
    /// The ID of the region row
    fn record_job_status(
        &mut self,
        region: &Region,
        status: JobStatus,
        config_hash: &str,
    ) -> StorageResult<i64>;

    /// Looks up a region's ID, if the region has ever been recorded
    fn get_region_id(&self, region: &Region) -> StorageResult<Option<i64>>;

    /// Gets the raw stored status string for a region
    ///
    /// The value is returned unparsed so callers can report unknown values.
    fn get_job_status(&self, region_id: i64) -> StorageResult<Option<String>>;

    /// Lists every job with its region and agent count
    fn list_jobs(&self) -> StorageResult<Vec<JobRecord>>;

    // ===== Agents =====

    /// Inserts or replaces agents and links them to a region
    ///
    /// Agents are keyed by their encoded zuid, falling back to the full name
    /// when the listing carried none.
    ///
    /// # Returns
    ///
    /// The number of agents written
    fn upsert_agents(&mut self, region_id: i64, records: &[EnrichedRecord]) -> StorageResult<usize>;

    /// Loads every agent linked to a region, ordered by name
    fn load_agents(&self, region_id: i64) -> StorageResult<Vec<EnrichedRecord>>;

    /// Gets a single agent by its storage key
    fn get_agent(&self, agent_key: &str) -> StorageResult<Option<EnrichedRecord>>;

    /// Gets every region an agent was harvested in
    fn get_agent_regions(&self, agent_key: &str) -> StorageResult<Vec<Region>>;
}
