//! Database schema definitions
//!
//! This module contains all SQL schema definitions for the harvest database.

/// SQL schema for the database
pub const SCHEMA_SQL: &str = r#"
-- Regions a harvest has been requested for, keyed by upper-cased city and state
CREATE TABLE IF NOT EXISTS regions (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    city TEXT NOT NULL,
    state TEXT NOT NULL,
    created_at TEXT NOT NULL,
    UNIQUE(city, state)
);

-- One job status row per region, overwritten on every transition
CREATE TABLE IF NOT EXISTS job_status (
    region_id INTEGER PRIMARY KEY REFERENCES regions(id),
    status TEXT NOT NULL,
    config_hash TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

-- Harvested agents with the enriched record as JSON. The key is the
-- encoded zuid, or the full name for agents listed without one.
CREATE TABLE IF NOT EXISTS agents (
    agent_key TEXT PRIMARY KEY,
    full_name TEXT NOT NULL,
    encoded_zuid TEXT,
    data TEXT NOT NULL,
    updated_at TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_agents_name ON agents(full_name);

-- Which regions an agent was harvested in
CREATE TABLE IF NOT EXISTS agent_regions (
    agent_key TEXT NOT NULL REFERENCES agents(agent_key),
    region_id INTEGER NOT NULL REFERENCES regions(id),
    PRIMARY KEY(agent_key, region_id)
);

CREATE INDEX IF NOT EXISTS idx_agent_regions_region ON agent_regions(region_id);
"#;

/// Initializes the database schema
///
/// # Arguments
///
/// * `conn` - The database connection
///
/// # Returns
///
/// * `Ok(())` - Schema initialized successfully
/// * `Err(rusqlite::Error)` - Failed to initialize schema
pub fn initialize_schema(conn: &rusqlite::Connection) -> Result<(), rusqlite::Error> {
    conn.execute_batch(SCHEMA_SQL)?;
    Ok(())
}
