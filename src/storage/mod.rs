//! Storage module for persisting harvest data
//!
//! This module handles all database operations, including:
//! - SQLite database initialization and schema management
//! - Region and job status persistence
//! - Agent records and their region links

mod schema;
mod sqlite;
mod traits;

pub use sqlite::SqliteStorage;
pub use traits::{Storage, StorageError, StorageResult};

use crate::model::Region;

/// A region's job as listed by [`Storage::list_jobs`]
#[derive(Debug, Clone, PartialEq)]
pub struct JobRecord {
    pub region_id: i64,
    pub region: Region,

    /// Raw stored status string
    pub status: String,

    pub config_hash: String,
    pub updated_at: String,

    /// Number of agents linked to the region
    pub agent_count: i64,
}
