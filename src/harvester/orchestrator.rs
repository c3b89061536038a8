//! Harvest orchestrator
//!
//! Drives one region through the pipeline:
//!
//! 1. Announce the job as PENDING
//! 2. Resolve each category's page bound and fetch every page in a bounded pool
//! 3. Deduplicate the merged batches by identity
//! 4. Enrich every unique record in a second bounded pool
//!
//! Failures of single pages or profiles degrade inside their own task. Only an
//! error that escapes the pipeline (storage failure, a panicked task) turns the
//! job into ERROR.

use crate::config::Config;
use crate::harvester::dedup::dedup_by_identity;
use crate::harvester::enricher::enrich_record;
use crate::harvester::pages::{fetch_page_with_retry, resolve_page_bound_with_retry};
use crate::harvester::pool::run_bounded;
use crate::harvester::retry::RetryPolicy;
use crate::harvester::FetchTransport;
use crate::model::{Category, EnrichedRecord, HarvestJob, JobState, JobStatus, Region, SummaryRecord};
use crate::storage::{Storage, StorageError};
use crate::{HarvestError, Result};
use std::sync::{Arc, Mutex, MutexGuard};
use url::Url;

/// Storage shared between the orchestrator and its caller
pub type SharedStorage = Arc<Mutex<dyn Storage + Send>>;

/// Outcome of harvesting one region
#[derive(Debug)]
pub struct HarvestReport {
    /// The job, in its final in-memory state
    pub job: HarvestJob,

    /// Enriched records in discovery order; empty when the job failed
    pub records: Vec<EnrichedRecord>,
}

impl HarvestReport {
    pub fn succeeded(&self) -> bool {
        !matches!(self.job.state(), JobState::Error)
    }
}

/// Harvests the agents of a region
pub struct Harvester {
    base_url: Url,
    categories: Vec<Category>,
    concurrency: usize,
    page_policy: RetryPolicy,
    bound_policy: RetryPolicy,
    detail_policy: RetryPolicy,
    transport: Arc<dyn FetchTransport>,
    storage: SharedStorage,
    config_hash: String,
}

impl Harvester {
    /// Creates a harvester
    ///
    /// # Arguments
    ///
    /// * `config` - The validated configuration
    /// * `transport` - Transport every page and profile is fetched through
    /// * `storage` - Where job status and agents are persisted
    /// * `config_hash` - Hash recorded with every job status
    pub fn new(
        config: &Config,
        transport: Arc<dyn FetchTransport>,
        storage: SharedStorage,
        config_hash: impl Into<String>,
    ) -> Result<Self> {
        Ok(Self {
            base_url: Url::parse(&config.source.base_url)?,
            categories: config.harvester.categories(),
            concurrency: config.harvester.max_concurrent_tasks as usize,
            page_policy: config.retry.page_policy(),
            bound_policy: config.retry.bound_policy(),
            detail_policy: config.retry.detail_policy(),
            transport,
            storage,
            config_hash: config_hash.into(),
        })
    }

    /// Categories harvested, in harvest order
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Harvests a region without persisting its records
    ///
    /// The job is left PENDING on success. On failure it is marked ERROR
    /// (persisted best-effort) and the report carries no records.
    pub async fn harvest(&self, region: &Region) -> HarvestReport {
        let mut job = HarvestJob::new(region.clone());

        match self.try_harvest(&mut job).await {
            Ok(records) => HarvestReport { job, records },
            Err(e) => {
                tracing::error!("Harvest of {} failed: {}", region, e);
                self.mark_error(&mut job);
                HarvestReport {
                    job,
                    records: Vec::new(),
                }
            }
        }
    }

    /// Harvests a region, persists its agents and marks the job COMPLETED
    ///
    /// # Returns
    ///
    /// * `Ok(HarvestReport)` - The harvest ran; check the job state for ERROR
    /// * `Err(HarvestError)` - The records could not be persisted (job marked ERROR)
    pub async fn run(&self, region: &Region) -> Result<HarvestReport> {
        let mut report = self.harvest(region).await;
        if report.job.state() != JobState::Pending {
            return Ok(report);
        }

        if let Err(e) = self.complete(&mut report) {
            tracing::error!("Failed to persist harvest of {}: {}", region, e);
            self.mark_error(&mut report.job);
            return Err(e);
        }

        tracing::info!(
            "Harvest of {} completed with {} agents",
            region,
            report.records.len()
        );
        Ok(report)
    }

    async fn try_harvest(&self, job: &mut HarvestJob) -> Result<Vec<EnrichedRecord>> {
        let status = job.transition(JobState::Pending)?;
        self.record_status(&job.region, status)?;
        tracing::info!("Harvesting {} across {} categories", job.region, self.categories.len());

        let summaries = self.collect_summaries(&job.region).await?;
        let discovered = summaries.len();
        let unique = dedup_by_identity(summaries);
        tracing::info!(
            "Discovered {} agents in {} ({} unique)",
            discovered,
            job.region,
            unique.len()
        );

        self.enrich_all(unique).await
    }

    /// Fetches every listing page of every category, in category then page order
    async fn collect_summaries(&self, region: &Region) -> Result<Vec<SummaryRecord>> {
        let mut pages: Vec<(Category, u32)> = Vec::new();
        for &category in &self.categories {
            let bound = resolve_page_bound_with_retry(
                self.transport.as_ref(),
                &self.base_url,
                region,
                category,
                self.bound_policy,
            )
            .await;
            pages.extend((1..=bound).map(|page| (category, page)));
        }

        let transport = self.transport.clone();
        let base = self.base_url.clone();
        let region = region.clone();
        let policy = self.page_policy;

        let batches = run_bounded(self.concurrency, pages, move |(category, page)| {
            let transport = transport.clone();
            let base = base.clone();
            let region = region.clone();
            async move {
                fetch_page_with_retry(transport.as_ref(), &base, &region, category, page, policy)
                    .await
            }
        })
        .await?;

        Ok(batches.into_iter().flatten().collect())
    }

    async fn enrich_all(&self, summaries: Vec<SummaryRecord>) -> Result<Vec<EnrichedRecord>> {
        let transport = self.transport.clone();
        let base = self.base_url.clone();
        let policy = self.detail_policy;

        run_bounded(self.concurrency, summaries, move |summary| {
            let transport = transport.clone();
            let base = base.clone();
            async move { enrich_record(transport.as_ref(), &base, policy, summary).await }
        })
        .await
    }

    fn complete(&self, report: &mut HarvestReport) -> Result<()> {
        let region = report.job.region.clone();
        {
            let mut storage = self.lock_storage()?;
            let region_id = storage
                .get_region_id(&region)?
                .ok_or_else(|| StorageError::RegionNotFound(region.to_string()))?;
            let written = storage.upsert_agents(region_id, &report.records)?;
            tracing::debug!("Persisted {} agents for {}", written, region);
        }

        let status = report.job.transition(JobState::Completed)?;
        self.record_status(&region, status)?;
        Ok(())
    }

    fn mark_error(&self, job: &mut HarvestJob) {
        match job.transition(JobState::Error) {
            Ok(status) => {
                if let Err(e) = self.record_status(&job.region, status) {
                    tracing::warn!("Could not record ERROR for {}: {}", job.region, e);
                }
            }
            Err(e) => tracing::warn!("{}", e),
        }
    }

    fn record_status(&self, region: &Region, status: JobStatus) -> Result<i64> {
        let mut storage = self.lock_storage()?;
        Ok(storage.record_job_status(region, status, &self.config_hash)?)
    }

    fn lock_storage(&self) -> Result<MutexGuard<'_, dyn Storage + Send + 'static>> {
        self.storage
            .lock()
            .map_err(|e| HarvestError::from(StorageError::Lock(e.to_string())))
    }
}
