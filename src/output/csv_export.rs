//! CSV export of harvested agents
//!
//! One row per agent. The profile phone numbers are spread over `cell`,
//! `business` and `brokerage` columns, websites collapse to a comma-joined
//! URL list, and listing vectors are written as JSON cells.

use crate::model::{EnrichedRecord, ListingRecord, Region};
use crate::HarvestError;
use serde::Serialize;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Serialize)]
struct CsvRow<'a> {
    full_name: &'a str,
    encoded_zuid: Option<&'a str>,
    business_name: Option<&'a str>,
    phone_number: Option<&'a str>,
    location: Option<&'a str>,
    profile_link: Option<&'a str>,
    review_rating: Option<f64>,
    review_count: Option<u32>,
    categories: String,
    rank: u32,
    page: u32,
    email: Option<&'a str>,
    for_sale: String,
    for_rent: String,
    past_sales: String,
    websites: String,
    cell: Option<&'a str>,
    business: Option<&'a str>,
    brokerage: Option<&'a str>,
}

impl<'a> CsvRow<'a> {
    fn from_record(record: &'a EnrichedRecord) -> Result<Self, HarvestError> {
        let summary = &record.summary;
        let phones = record.phones.as_ref();

        Ok(Self {
            full_name: &summary.full_name,
            encoded_zuid: summary.encoded_zuid.as_deref(),
            business_name: summary.business_name.as_deref(),
            phone_number: summary.phone_number.as_deref(),
            location: summary.location.as_deref(),
            profile_link: summary.profile_link.as_deref(),
            review_rating: summary.review_rating,
            review_count: summary.review_count,
            categories: summary
                .categories
                .iter()
                .map(|c| c.query_value())
                .collect::<Vec<_>>()
                .join(";"),
            rank: summary.rank,
            page: summary.page,
            email: record.email.as_deref(),
            for_sale: listings_cell(&record.for_sale)?,
            for_rent: listings_cell(&record.for_rent)?,
            past_sales: listings_cell(&record.past_sales)?,
            websites: record
                .websites
                .iter()
                .map(|w| w.url.as_str())
                .collect::<Vec<_>>()
                .join(","),
            cell: phones.and_then(|p| p.cell.as_deref()),
            business: phones.and_then(|p| p.business.as_deref()),
            brokerage: phones.and_then(|p| p.brokerage.as_deref()),
        })
    }
}

fn listings_cell(listings: &[ListingRecord]) -> Result<String, HarvestError> {
    if listings.is_empty() {
        return Ok(String::new());
    }
    Ok(serde_json::to_string(listings)?)
}

/// Writes records as CSV, header first
///
/// # Returns
///
/// The number of rows written
pub fn write_records<W: Write>(records: &[EnrichedRecord], writer: W) -> Result<usize, HarvestError> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    for record in records {
        csv_writer.serialize(CsvRow::from_record(record)?)?;
    }

    csv_writer.flush()?;
    Ok(records.len())
}

/// Writes records to a CSV file, creating parent directories as needed
///
/// Nothing is written when `records` is empty.
pub fn write_records_csv(records: &[EnrichedRecord], path: &Path) -> Result<usize, HarvestError> {
    if records.is_empty() {
        tracing::info!("No agents to write to {}", path.display());
        return Ok(0);
    }

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let written = write_records(records, File::create(path)?)?;
    tracing::info!("Wrote {} agents to {}", written, path.display());
    Ok(written)
}

/// Export file for a region inside `dir`
pub fn export_path(dir: &Path, region: &Region) -> PathBuf {
    dir.join(format!("{}.csv", region.file_stem()))
}
