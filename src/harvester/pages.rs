//! Listing page fetching and pagination bounds
//!
//! A category's results are spread over pages of [`PAGE_SIZE`]. The bound
//! resolver reads the total from page 1 to decide how many pages to request;
//! the page fetcher then turns each page into a batch of summary records.

use crate::harvester::extract::{parse_listing_page, parse_total, MAX_PAGES, PAGE_SIZE};
use crate::harvester::retry::{with_retry, RetryPolicy};
use crate::harvester::FetchTransport;
use crate::model::{Category, Region, SummaryRecord};
use crate::{ExtractError, HarvestError};
use url::Url;

/// Builds the listing page URL for a region, category and page
///
/// # Example
///
/// ```
/// use agent_harvest::harvester::listing_url;
/// use agent_harvest::{Category, Region};
/// use url::Url;
///
/// let base = Url::parse("https://www.zillow.com").unwrap();
/// let url = listing_url(&base, &Region::new("Austin", "TX"), Category::BuyersAgent, 3).unwrap();
/// assert_eq!(
///     url.as_str(),
///     "https://www.zillow.com/professionals/real-estate-agent-reviews/austin-tx/?specialties=BuyersAgent&page=3"
/// );
/// ```
pub fn listing_url(
    base: &Url,
    region: &Region,
    category: Category,
    page: u32,
) -> Result<Url, HarvestError> {
    let mut url = base.join(&format!(
        "/professionals/real-estate-agent-reviews/{}/",
        region.slug()
    ))?;

    url.query_pairs_mut()
        .clear()
        .append_pair("specialties", category.query_value())
        .append_pair("page", &page.to_string());

    Ok(url)
}

/// First listing page of every category, in the order given
pub fn discovery_urls(
    base: &Url,
    region: &Region,
    categories: &[Category],
) -> Result<Vec<Url>, HarvestError> {
    categories
        .iter()
        .map(|&category| listing_url(base, region, category, 1))
        .collect()
}

/// Number of pages to harvest for `total` results, capped at [`MAX_PAGES`]
pub fn page_bound(total: u64) -> u32 {
    total.div_ceil(PAGE_SIZE).min(u64::from(MAX_PAGES)) as u32
}

/// Fetches one listing page and extracts its summary records
///
/// # Returns
///
/// * `Ok(Vec<SummaryRecord>)` - Records on the page, in page order
/// * `Err(HarvestError::PageUnavailable)` - The page had no embedded payload
/// * `Err(HarvestError)` - Transport or other extraction failure
pub async fn fetch_page(
    transport: &dyn FetchTransport,
    base: &Url,
    region: &Region,
    category: Category,
    page: u32,
) -> Result<Vec<SummaryRecord>, HarvestError> {
    let url = listing_url(base, region, category, page)?;
    let body = transport.fetch(&url).await?;

    match parse_listing_page(&body, category, page) {
        Ok(listing) => {
            tracing::info!(
                "Initial scrape for page {} of {} in {}: {} agents",
                page,
                category,
                region,
                listing.records.len()
            );
            Ok(listing.records)
        }
        Err(ExtractError::MissingPayload) => Err(HarvestError::PageUnavailable { category, page }),
        Err(e) => Err(e.into()),
    }
}

/// [`fetch_page`] under `policy`; an exhausted page contributes an empty batch
pub async fn fetch_page_with_retry(
    transport: &dyn FetchTransport,
    base: &Url,
    region: &Region,
    category: Category,
    page: u32,
    policy: RetryPolicy,
) -> Vec<SummaryRecord> {
    let label = format!("{} page {} in {}", category, page, region);
    with_retry(policy, &label, Vec::new(), || {
        fetch_page(transport, base, region, category, page)
    })
    .await
}

/// Reads the category's total from page 1 and derives the page bound
pub async fn resolve_page_bound(
    transport: &dyn FetchTransport,
    base: &Url,
    region: &Region,
    category: Category,
) -> Result<u32, HarvestError> {
    let url = listing_url(base, region, category, 1)?;
    let body = transport.fetch(&url).await?;

    let total = match parse_total(&body) {
        Ok(total) => total,
        Err(ExtractError::MissingPayload) => {
            return Err(HarvestError::PageUnavailable { category, page: 1 })
        }
        Err(e) => return Err(e.into()),
    };

    let bound = page_bound(total);
    tracing::info!(
        "{} in {}: {} agents across {} pages",
        category,
        region,
        total,
        bound
    );
    Ok(bound)
}

/// [`resolve_page_bound`] under `policy`; an exhausted lookup falls back to one page
pub async fn resolve_page_bound_with_retry(
    transport: &dyn FetchTransport,
    base: &Url,
    region: &Region,
    category: Category,
    policy: RetryPolicy,
) -> u32 {
    let label = format!("page bound of {} in {}", category, region);
    with_retry(policy, &label, 1, || {
        resolve_page_bound(transport, base, region, category)
    })
    .await
}
