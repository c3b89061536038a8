//! Harvester module for discovering and enriching agents
//!
//! This module contains the core harvesting logic, including:
//! - Fetching through a proxy transport with fixed-delay retries
//! - Extraction of the embedded page payload
//! - Pagination across agent categories
//! - Identity deduplication and profile enrichment
//! - Overall harvest coordination and job status tracking

mod dedup;
mod enricher;
mod extract;
mod orchestrator;
mod pages;
mod pool;
mod retry;
mod transport;

#[cfg(test)]
mod test_support;

pub use dedup::dedup_by_identity;
pub use enricher::{detail_url, enrich_record, fetch_details};
pub use extract::{
    extract_payload, parse_detail_page, parse_listing_entry, parse_listing_page, parse_total,
    past_sale_address, postal_code, DetailPage, ListingPage, MAX_PAGES, PAGE_SIZE,
};
pub use orchestrator::{HarvestReport, Harvester, SharedStorage};
pub use pages::{
    discovery_urls, fetch_page, fetch_page_with_retry, listing_url, page_bound, resolve_page_bound,
    resolve_page_bound_with_retry,
};
pub use retry::{with_retry, RetryPolicy};
pub use transport::{build_http_client, FetchTransport, ProxyTransport};

use crate::config::Config;
use crate::model::Region;
use crate::storage::SqliteStorage;
use crate::HarvestError;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Runs a complete harvest for one region
///
/// This is the main entry point for a harvest. It will:
/// 1. Open the storage database
/// 2. Build the proxy transport
/// 3. Announce the job, fetch, deduplicate and enrich
/// 4. Persist the agents and mark the job COMPLETED
///
/// # Arguments
///
/// * `config` - The harvest configuration
/// * `config_hash` - Hash of the configuration file, recorded with the job
/// * `region` - The region to harvest
///
/// # Returns
///
/// * `Ok(HarvestReport)` - Harvest ran; the job state tells whether it succeeded
/// * `Err(HarvestError)` - Setup or persistence failed
pub async fn run_harvest(
    config: &Config,
    config_hash: &str,
    region: &Region,
) -> Result<HarvestReport, HarvestError> {
    let storage = SqliteStorage::new(Path::new(&config.output.database_path))?;
    let transport = ProxyTransport::new(&config.transport)?;

    let harvester = Harvester::new(
        config,
        Arc::new(transport),
        Arc::new(Mutex::new(storage)),
        config_hash,
    )?;

    harvester.run(region).await
}
