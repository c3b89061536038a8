//! Profile enrichment
//!
//! Follows an agent's profile link and merges the detail page into the
//! summary record. Enrichment never fails: an agent without a link, or whose
//! profile cannot be fetched, is kept with its detail fields left empty.

use crate::harvester::extract::{parse_detail_page, DetailPage};
use crate::harvester::retry::{with_retry, RetryPolicy};
use crate::harvester::FetchTransport;
use crate::model::{EnrichedRecord, SummaryRecord};
use crate::HarvestError;
use url::Url;

/// Resolves a relative profile link against the source base URL
pub fn detail_url(base: &Url, profile_link: &str) -> Result<Url, HarvestError> {
    Ok(base.join(profile_link.trim())?)
}

/// Fetches and parses an agent's profile page
pub async fn fetch_details(
    transport: &dyn FetchTransport,
    base: &Url,
    profile_link: &str,
    subject: &str,
) -> Result<DetailPage, HarvestError> {
    let url = detail_url(base, profile_link)?;
    let body = transport.fetch(&url).await?;
    Ok(parse_detail_page(&body, subject)?)
}

/// Enriches one summary record from its profile page
///
/// # Arguments
///
/// * `transport` - Fetch transport
/// * `base` - Base URL profile links are resolved against
/// * `policy` - Retry policy for the profile fetch
/// * `summary` - The record to enrich
pub async fn enrich_record(
    transport: &dyn FetchTransport,
    base: &Url,
    policy: RetryPolicy,
    summary: SummaryRecord,
) -> EnrichedRecord {
    let Some(link) = summary.profile_link.clone() else {
        tracing::debug!("No profile link for {}, skipping enrichment", summary.full_name);
        return EnrichedRecord::unenriched(summary);
    };

    let label = format!("profile of {}", summary.full_name);
    let details = with_retry(policy, &label, None, || async {
        fetch_details(transport, base, &link, &summary.full_name)
            .await
            .map(Some)
    })
    .await;

    match details {
        Some(details) => merge_details(summary, details),
        None => EnrichedRecord::unenriched(summary),
    }
}

fn merge_details(summary: SummaryRecord, details: DetailPage) -> EnrichedRecord {
    EnrichedRecord {
        summary,
        phones: details.phones,
        email: details.email,
        for_sale: details.for_sale,
        for_rent: details.for_rent,
        past_sales: details.past_sales,
        websites: details.websites,
    }
}
