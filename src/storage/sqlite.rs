//! SQLite storage implementation
//!
//! This module provides a SQLite-based implementation of the Storage trait.

use crate::model::{EnrichedRecord, JobStatus, Region};
use crate::storage::schema::initialize_schema;
use crate::storage::traits::{Storage, StorageResult};
use crate::storage::JobRecord;
use crate::HarvestError;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::Path;

/// SQLite storage backend
pub struct SqliteStorage {
    conn: Connection,
}

impl SqliteStorage {
    /// Creates a new SqliteStorage instance
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the SQLite database file
    ///
    /// # Returns
    ///
    /// * `Ok(SqliteStorage)` - Successfully opened/created database
    /// * `Err(HarvestError)` - Failed to open database
    pub fn new(path: &Path) -> Result<Self, HarvestError> {
        let conn = Connection::open(path)?;

        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA temp_store = MEMORY;
        ",
        )?;

        initialize_schema(&conn)?;

        Ok(Self { conn })
    }

    /// Creates an in-memory database
    pub fn new_in_memory() -> Result<Self, HarvestError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        initialize_schema(&conn)?;
        Ok(Self { conn })
    }
}

fn decode_agent(data: &str) -> StorageResult<EnrichedRecord> {
    Ok(serde_json::from_str(data)?)
}

impl Storage for SqliteStorage {
    // ===== Job Status =====

    fn record_job_status(
        &mut self,
        region: &Region,
        status: JobStatus,
        config_hash: &str,
    ) -> StorageResult<i64> {
        let (city, state) = region.storage_key();
        let now = Utc::now().to_rfc3339();

        self.conn.execute(
            "INSERT INTO regions (city, state, created_at) VALUES (?1, ?2, ?3)
             ON CONFLICT(city, state) DO NOTHING",
            params![city, state, now],
        )?;

        let region_id: i64 = self.conn.query_row(
            "SELECT id FROM regions WHERE city = ?1 AND state = ?2",
            params![city, state],
            |row| row.get(0),
        )?;

        self.conn.execute(
            "INSERT INTO job_status (region_id, status, config_hash, updated_at)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(region_id) DO UPDATE SET
                status = excluded.status,
                config_hash = excluded.config_hash,
                updated_at = excluded.updated_at",
            params![region_id, status.to_db_string(), config_hash, now],
        )?;

        tracing::debug!("Recorded {} for {} (region {})", status, region, region_id);
        Ok(region_id)
    }

    fn get_region_id(&self, region: &Region) -> StorageResult<Option<i64>> {
        let (city, state) = region.storage_key();
        let id = self
            .conn
            .query_row(
                "SELECT id FROM regions WHERE city = ?1 AND state = ?2",
                params![city, state],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    fn get_job_status(&self, region_id: i64) -> StorageResult<Option<String>> {
        let status = self
            .conn
            .query_row(
                "SELECT status FROM job_status WHERE region_id = ?1",
                params![region_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(status)
    }

    fn list_jobs(&self) -> StorageResult<Vec<JobRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.id, r.city, r.state, j.status, j.config_hash, j.updated_at,
                    (SELECT COUNT(*) FROM agent_regions ar WHERE ar.region_id = r.id)
             FROM regions r
             JOIN job_status j ON j.region_id = r.id
             ORDER BY j.updated_at DESC, r.id DESC",
        )?;

        let jobs = stmt
            .query_map([], |row| {
                Ok(JobRecord {
                    region_id: row.get(0)?,
                    region: Region::new(row.get::<_, String>(1)?, row.get::<_, String>(2)?),
                    status: row.get(3)?,
                    config_hash: row.get(4)?,
                    updated_at: row.get(5)?,
                    agent_count: row.get(6)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(jobs)
    }

    // ===== Agents =====

    fn upsert_agents(&mut self, region_id: i64, records: &[EnrichedRecord]) -> StorageResult<usize> {
        let now = Utc::now().to_rfc3339();
        let tx = self.conn.transaction()?;

        {
            let mut agent_stmt = tx.prepare(
                "INSERT INTO agents (agent_key, full_name, encoded_zuid, data, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)
                 ON CONFLICT(agent_key) DO UPDATE SET
                    full_name = excluded.full_name,
                    encoded_zuid = excluded.encoded_zuid,
                    data = excluded.data,
                    updated_at = excluded.updated_at",
            )?;
            let mut link_stmt = tx.prepare(
                "INSERT OR IGNORE INTO agent_regions (agent_key, region_id) VALUES (?1, ?2)",
            )?;

            for record in records {
                let data = serde_json::to_string(record)?;
                agent_stmt.execute(params![
                    record.storage_key(),
                    record.full_name(),
                    record.summary.encoded_zuid,
                    data,
                    now
                ])?;
                link_stmt.execute(params![record.storage_key(), region_id])?;
            }
        }

        tx.commit()?;
        Ok(records.len())
    }

    fn load_agents(&self, region_id: i64) -> StorageResult<Vec<EnrichedRecord>> {
        let mut stmt = self.conn.prepare(
            "SELECT a.data FROM agents a
             JOIN agent_regions ar ON ar.agent_key = a.agent_key
             WHERE ar.region_id = ?1
             ORDER BY a.full_name, a.agent_key",
        )?;

        let rows = stmt
            .query_map(params![region_id], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        rows.iter().map(|data| decode_agent(data)).collect()
    }

    fn get_agent(&self, agent_key: &str) -> StorageResult<Option<EnrichedRecord>> {
        let data: Option<String> = self
            .conn
            .query_row(
                "SELECT data FROM agents WHERE agent_key = ?1",
                params![agent_key],
                |row| row.get(0),
            )
            .optional()?;

        data.map(|data| decode_agent(&data)).transpose()
    }

    fn get_agent_regions(&self, agent_key: &str) -> StorageResult<Vec<Region>> {
        let mut stmt = self.conn.prepare(
            "SELECT r.city, r.state FROM regions r
             JOIN agent_regions ar ON ar.region_id = r.id
             WHERE ar.agent_key = ?1
             ORDER BY r.id",
        )?;

        let regions = stmt
            .query_map(params![agent_key], |row| {
                Ok(Region::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(regions)
    }
}
