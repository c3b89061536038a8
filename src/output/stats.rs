//! Statistics generation from the harvest database
//!
//! This module provides functionality for extracting and displaying
//! job statistics from the storage layer.

use crate::model::JobStatus;
use crate::storage::{JobRecord, Storage};
use crate::HarvestError;
use std::collections::BTreeMap;

/// Harvest statistics summary
#[derive(Debug, Clone)]
pub struct HarvestStatistics {
    /// Every job, most recently updated first
    pub jobs: Vec<JobRecord>,

    /// Count of jobs by raw status string
    pub jobs_by_status: BTreeMap<String, u64>,

    /// Agents linked to completed jobs
    pub completed_agents: i64,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to query
///
/// # Returns
///
/// * `Ok(HarvestStatistics)` - Successfully loaded statistics
/// * `Err(HarvestError)` - Failed to query statistics
pub fn load_statistics(storage: &dyn Storage) -> Result<HarvestStatistics, HarvestError> {
    let jobs = storage.list_jobs()?;

    let mut jobs_by_status = BTreeMap::new();
    for job in &jobs {
        *jobs_by_status.entry(job.status.clone()).or_insert(0) += 1;
    }

    let completed_agents: i64 = jobs
        .iter()
        .filter(|job| JobStatus::from_db_string(&job.status) == Some(JobStatus::Completed))
        .map(|job| job.agent_count)
        .sum();

    Ok(HarvestStatistics {
        jobs,
        jobs_by_status,
        completed_agents,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &HarvestStatistics) {
    println!("=== Harvest Statistics ===\n");

    println!("Overview:");
    println!("  Regions tracked: {}", stats.jobs.len());
    println!("  Agents in completed regions: {}", stats.completed_agents);
    println!();

    println!("Jobs by Status:");
    for (status, count) in &stats.jobs_by_status {
        println!("  {}: {}", status, count);
    }
    println!();

    if stats.jobs.is_empty() {
        println!("No harvests recorded.");
        return;
    }

    println!("Jobs:");
    for job in &stats.jobs {
        println!(
            "  {:<28} {:<10} {:>6} agents  updated {}  config {}",
            job.region.to_string(),
            job.status,
            job.agent_count,
            job.updated_at,
            short_hash(&job.config_hash)
        );
    }
}

fn short_hash(hash: &str) -> &str {
    hash.get(..12).unwrap_or(hash)
}
