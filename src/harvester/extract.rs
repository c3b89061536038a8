//! Structured payload extraction
//!
//! Both listing and profile pages embed their data as JSON in a
//! `<script id="__NEXT_DATA__">` block. This module locates that block and
//! turns it into typed records:
//! - Listing-page mode: the page's result list and the category's total count
//! - Detail-page mode: phones, email, listings, past sales and websites
//!
//! In detail mode every sub-section is optional and every entry is parsed on
//! its own, so one malformed listing only costs that listing.

use crate::model::{
    Address, Category, ListingRecord, ListingType, Phones, SummaryRecord, Website,
};
use crate::model::listing::{lenient_price, listing_id};
use crate::{ExtractError, ExtractResult};
use scraper::{Html, Selector};
use serde::Deserialize;
use serde_json::Value;
use std::sync::OnceLock;
use url::Url;

/// Results shown per listing page
pub const PAGE_SIZE: u64 = 15;

/// Upper bound on pages harvested per category
pub const MAX_PAGES: u32 = 25;

const PAYLOAD_SELECTOR: &str = "script#__NEXT_DATA__";
const RESULTS_PATH: &str = "/props/pageProps/proResults/results";
const PAGE_PROPS_PATH: &str = "/props/pageProps";

/// One parsed listing page
#[derive(Debug, Clone, PartialEq)]
pub struct ListingPage {
    /// Total results for the category across all pages
    pub total: u64,

    /// Records on this page, in page order
    pub records: Vec<SummaryRecord>,
}

/// Everything a profile page contributed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetailPage {
    pub phones: Option<Phones>,
    pub email: Option<String>,
    pub for_sale: Vec<ListingRecord>,
    pub for_rent: Vec<ListingRecord>,
    pub past_sales: Vec<ListingRecord>,
    pub websites: Vec<Website>,
}

/// Result entry as it appears in the listing payload
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProfessionalEntry {
    full_name: String,
    #[serde(default)]
    encoded_zuid: Option<String>,
    #[serde(default)]
    business_name: Option<String>,
    #[serde(default)]
    phone_number: Option<String>,
    #[serde(default)]
    location: Option<String>,
    #[serde(default)]
    profile_link: Option<String>,
    #[serde(rename = "reviewStarsRating", default)]
    review_rating: Option<f64>,
    #[serde(rename = "numTotalReviews", default)]
    review_count: Option<u32>,
}

/// Listing or past-sale entry as it appears in the profile payload
#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(deserialize_with = "listing_id")]
    zpid: String,
    #[serde(default)]
    address: Option<Address>,
    #[serde(default, deserialize_with = "lenient_price")]
    price: Option<f64>,
    #[serde(default)]
    bedrooms: Option<f64>,
    #[serde(default)]
    bathrooms: Option<f64>,
    #[serde(default, alias = "homeType")]
    home_type: Option<String>,
    #[serde(default, alias = "soldDate")]
    sold_date: Option<String>,
    #[serde(default)]
    represented: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawWebsite {
    url: String,
    #[serde(default)]
    text: Option<String>,
}

/// Locates and parses the embedded `__NEXT_DATA__` payload
///
/// # Returns
///
/// * `Ok(Value)` - The parsed payload
/// * `Err(ExtractError::MissingPayload)` - No payload block in the page
/// * `Err(ExtractError::MalformedPayload)` - The block is not valid JSON
pub fn extract_payload(body: &str) -> ExtractResult<Value> {
    let selector = payload_selector()?;
    let document = Html::parse_document(body);

    let script = document
        .select(selector)
        .next()
        .ok_or(ExtractError::MissingPayload)?;

    let json: String = script.text().collect();
    Ok(serde_json::from_str(&json)?)
}

/// The payload selector, parsed on first use
fn payload_selector() -> ExtractResult<&'static Selector> {
    static SELECTOR: OnceLock<Result<Selector, String>> = OnceLock::new();

    SELECTOR
        .get_or_init(|| Selector::parse(PAYLOAD_SELECTOR).map_err(|e| e.to_string()))
        .as_ref()
        .map_err(|message| ExtractError::InvalidSelector {
            selector: PAYLOAD_SELECTOR,
            message: message.clone(),
        })
}

/// Parses a listing page in listing-page mode
///
/// Each result becomes a [`SummaryRecord`] stamped with `category`, its 1-based
/// rank on the page, and `page`. A result that fails to parse is logged and
/// skipped; it still occupies its rank.
///
/// # Arguments
///
/// * `body` - The raw page body
/// * `category` - Category the page was requested for
/// * `page` - 1-based page index
pub fn parse_listing_page(body: &str, category: Category, page: u32) -> ExtractResult<ListingPage> {
    let payload = extract_payload(body)?;
    let results = payload
        .pointer(RESULTS_PATH)
        .ok_or(ExtractError::MissingField("props.pageProps.proResults.results"))?;

    let total = read_total(results)?;

    let entries = results
        .get("professionals")
        .and_then(Value::as_array)
        .ok_or(ExtractError::MissingField(
            "props.pageProps.proResults.results.professionals",
        ))?;

    let mut records = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let rank = index as u32 + 1;
        match parse_professional(entry, category, rank, page) {
            Ok(record) => records.push(record),
            Err(e) => {
                tracing::warn!(
                    "Skipping result {} on {} page {}: {}",
                    rank,
                    category,
                    page,
                    e
                );
            }
        }
    }

    Ok(ListingPage { total, records })
}

/// Reads only the category's total result count from a listing page
pub fn parse_total(body: &str) -> ExtractResult<u64> {
    let payload = extract_payload(body)?;
    let results = payload
        .pointer(RESULTS_PATH)
        .ok_or(ExtractError::MissingField("props.pageProps.proResults.results"))?;
    read_total(results)
}

fn read_total(results: &Value) -> ExtractResult<u64> {
    let total = results
        .get("total")
        .ok_or(ExtractError::MissingField("props.pageProps.proResults.results.total"))?;

    total
        .as_u64()
        .or_else(|| total.as_f64().filter(|t| *t >= 0.0).map(|t| t as u64))
        .ok_or_else(|| ExtractError::Validation {
            section: "result total",
            message: format!("expected a non-negative number, got {}", total),
        })
}

fn parse_professional(
    entry: &Value,
    category: Category,
    rank: u32,
    page: u32,
) -> ExtractResult<SummaryRecord> {
    let raw = ProfessionalEntry::deserialize(entry).map_err(|e| ExtractError::Validation {
        section: "professional",
        message: e.to_string(),
    })?;

    let full_name = raw.full_name.trim().to_string();
    if full_name.is_empty() {
        return Err(ExtractError::Validation {
            section: "professional",
            message: "fullName is empty".to_string(),
        });
    }

    Ok(SummaryRecord {
        full_name,
        encoded_zuid: raw.encoded_zuid,
        business_name: raw.business_name,
        phone_number: raw.phone_number,
        location: raw.location,
        profile_link: raw.profile_link.filter(|link| !link.trim().is_empty()),
        review_rating: raw.review_rating,
        review_count: raw.review_count,
        categories: vec![category],
        rank,
        page,
    })
}

/// Parses a profile page in detail-page mode
///
/// Only a missing or malformed payload (or a payload without `pageProps`)
/// fails the whole page. Every sub-section is attempted independently and
/// bad entries are logged against `subject` and dropped.
///
/// # Arguments
///
/// * `body` - The raw page body
/// * `subject` - Name of the agent, used in log lines
pub fn parse_detail_page(body: &str, subject: &str) -> ExtractResult<DetailPage> {
    let payload = extract_payload(body)?;
    let props = payload
        .pointer(PAGE_PROPS_PATH)
        .ok_or(ExtractError::MissingField("props.pageProps"))?;

    let display_user = props.get("displayUser");

    Ok(DetailPage {
        phones: parse_phones(subject, display_user),
        email: parse_email(subject, display_user),
        for_sale: collect_entries(
            subject,
            "for-sale listing",
            props.pointer("/forSaleListings/listings"),
            |entry| parse_listing_entry(entry, ListingType::Sale),
        ),
        for_rent: collect_entries(
            subject,
            "for-rent listing",
            props.pointer("/forRentListings/listings"),
            |entry| parse_listing_entry(entry, ListingType::Rent),
        ),
        past_sales: collect_entries(
            subject,
            "past sale",
            props.pointer("/pastSales/past_sales"),
            |entry| parse_listing_entry(entry, ListingType::Past),
        ),
        websites: parse_websites(subject, props.get("professionalInformation")),
    })
}

/// Parses a single listing entry, stamping it with `listing_type`
///
/// Past sales carry their address as flat fields; it is rebuilt here with the
/// postal code taken from the combined `city_state_zipcode` string.
pub fn parse_listing_entry(entry: &Value, listing_type: ListingType) -> ExtractResult<ListingRecord> {
    let raw = RawListing::deserialize(entry).map_err(|e| ExtractError::Validation {
        section: section_name(listing_type),
        message: e.to_string(),
    })?;

    let address = match listing_type {
        ListingType::Past => Some(past_sale_address(entry)?),
        ListingType::Sale | ListingType::Rent => raw.address,
    };

    Ok(ListingRecord {
        listing_type,
        zpid: raw.zpid,
        address,
        price: raw.price,
        bedrooms: raw.bedrooms,
        bathrooms: raw.bathrooms,
        home_type: raw.home_type,
        sold_date: raw.sold_date,
        represented: raw.represented,
    })
}

/// Builds the address of a past sale from its flat fields
pub fn past_sale_address(entry: &Value) -> ExtractResult<Address> {
    let text = |key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);

    let combined = entry
        .get("city_state_zipcode")
        .and_then(Value::as_str)
        .ok_or_else(|| ExtractError::Validation {
            section: "past sale",
            message: "missing city_state_zipcode".to_string(),
        })?;

    Ok(Address {
        line1: text("street_address"),
        city: text("city"),
        state_or_province: text("state"),
        postal_code: Some(postal_code(combined)?),
    })
}

/// Takes the postal code out of a `"city, state, zip"` string
///
/// The code is the third comma-separated token; fewer tokens is a validation
/// failure.
pub fn postal_code(combined: &str) -> ExtractResult<String> {
    let tokens: Vec<&str> = combined.split(',').map(str::trim).collect();

    match tokens.get(2) {
        Some(zip) if !zip.is_empty() => Ok(zip.to_string()),
        _ => Err(ExtractError::Validation {
            section: "past sale",
            message: format!("expected \"city, state, zip\", got {:?}", combined),
        }),
    }
}

fn parse_phones(subject: &str, display_user: Option<&Value>) -> Option<Phones> {
    let raw = display_user?.get("phoneNumbers")?;
    if raw.is_null() || raw.as_object().map_or(false, |o| o.is_empty()) {
        return None;
    }

    match Phones::deserialize(raw) {
        Ok(phones) if !phones.is_empty() => Some(phones),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!("Error extracting phone numbers for {}: {}", subject, e);
            None
        }
    }
}

fn parse_email(subject: &str, display_user: Option<&Value>) -> Option<String> {
    match display_user?.get("email")? {
        Value::Null => None,
        Value::String(email) if email.trim().is_empty() => None,
        Value::String(email) => Some(email.trim().to_string()),
        other => {
            tracing::warn!("Error extracting email for {}: unexpected {}", subject, other);
            None
        }
    }
}

fn parse_websites(subject: &str, professional_info: Option<&Value>) -> Vec<Website> {
    let sections = professional_info
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    sections
        .iter()
        .filter(|info| info.get("term").and_then(Value::as_str) == Some("Websites"))
        .flat_map(|info| collect_entries(subject, "website", info.get("links"), parse_website))
        .collect()
}

fn parse_website(entry: &Value) -> ExtractResult<Website> {
    let raw = RawWebsite::deserialize(entry).map_err(|e| ExtractError::Validation {
        section: "website",
        message: e.to_string(),
    })?;

    let url = raw.url.trim();
    Url::parse(url).map_err(|e| ExtractError::Validation {
        section: "website",
        message: format!("{:?}: {}", url, e),
    })?;

    Ok(Website {
        url: url.to_string(),
        text: raw.text,
    })
}

/// Parses every entry of an optional array, logging and dropping failures
fn collect_entries<T, F>(
    subject: &str,
    section: &str,
    entries: Option<&Value>,
    parse: F,
) -> Vec<T>
where
    F: Fn(&Value) -> ExtractResult<T>,
{
    let entries = entries
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();

    entries
        .iter()
        .filter_map(|entry| match parse(entry) {
            Ok(value) => Some(value),
            Err(e) => {
                tracing::warn!("Error processing {} for {}: {}", section, subject, e);
                None
            }
        })
        .collect()
}

fn section_name(listing_type: ListingType) -> &'static str {
    match listing_type {
        ListingType::Sale => "for-sale listing",
        ListingType::Rent => "for-rent listing",
        ListingType::Past => "past sale",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn page_with(payload: Value) -> String {
        format!(
            r#"<html><head><title>Agents</title></head><body><div id="__next"></div><script id="__NEXT_DATA__" type="application/json">{}</script></body></html>"#,
            payload
        )
    }

    fn listing_payload(total: u64, professionals: Value) -> Value {
        json!({
            "props": { "pageProps": { "proResults": { "results": {
                "total": total,
                "professionals": professionals
            }}}}
        })
    }

    #[test]
    fn test_missing_payload() {
        let html = "<html><body><script>var x = 1;</script></body></html>";
        assert!(matches!(
            extract_payload(html),
            Err(ExtractError::MissingPayload)
        ));
    }

    #[test]
    fn test_payload_selector_is_parsed_once() {
        let first = payload_selector().unwrap();
        let second = payload_selector().unwrap();
        assert!(std::ptr::eq(first, second));
    }

    #[test]
    fn test_payload_without_selector_match_is_missing_not_invalid() {
        let html = r#"<html><body><script id="__NEXT_DATA_OLD__">{}</script></body></html>"#;
        let err = extract_payload(html).unwrap_err();
        assert!(matches!(err, ExtractError::MissingPayload));
        assert!(!matches!(err, ExtractError::InvalidSelector { .. }));
    }

    #[test]
    fn test_malformed_payload() {
        let html = r#"<html><body><script id="__NEXT_DATA__">{"props": </script></body></html>"#;
        assert!(matches!(
            extract_payload(html),
            Err(ExtractError::MalformedPayload(_))
        ));
    }

    #[test]
    fn test_listing_page_stamps_rank_page_and_category() {
        let html = page_with(listing_payload(
            20,
            json!([
                { "fullName": "Jane Doe", "profileLink": "/profile/jane-doe/", "encodedZuid": "X1" },
                { "fullName": "John Roe", "businessName": "Roe Realty", "numTotalReviews": 12 }
            ]),
        ));

        let page = parse_listing_page(&html, Category::ListingAgent, 2).unwrap();
        assert_eq!(page.total, 20);
        assert_eq!(page.records.len(), 2);

        let jane = &page.records[0];
        assert_eq!(jane.full_name, "Jane Doe");
        assert_eq!(jane.rank, 1);
        assert_eq!(jane.page, 2);
        assert_eq!(jane.categories, vec![Category::ListingAgent]);
        assert_eq!(jane.profile_link.as_deref(), Some("/profile/jane-doe/"));
        assert_eq!(jane.encoded_zuid.as_deref(), Some("X1"));

        let john = &page.records[1];
        assert_eq!(john.rank, 2);
        assert_eq!(john.business_name.as_deref(), Some("Roe Realty"));
        assert_eq!(john.review_count, Some(12));
        assert_eq!(john.profile_link, None);
    }

    #[test]
    fn test_listing_page_skips_bad_entry_but_keeps_rank() {
        let html = page_with(listing_payload(
            3,
            json!([
                { "fullName": "Jane Doe" },
                { "businessName": "No Name Realty" },
                { "fullName": "John Roe" }
            ]),
        ));

        let page = parse_listing_page(&html, Category::BuyersAgent, 1).unwrap();
        let ranks: Vec<u32> = page.records.iter().map(|r| r.rank).collect();
        assert_eq!(ranks, vec![1, 3]);
    }

    #[test]
    fn test_empty_profile_link_is_absent() {
        let html = page_with(listing_payload(
            1,
            json!([{ "fullName": "Jane Doe", "profileLink": "" }]),
        ));
        let page = parse_listing_page(&html, Category::BuyersAgent, 1).unwrap();
        assert_eq!(page.records[0].profile_link, None);
    }

    #[test]
    fn test_listing_page_missing_results() {
        let html = page_with(json!({ "props": { "pageProps": {} } }));
        assert!(matches!(
            parse_listing_page(&html, Category::BuyersAgent, 1),
            Err(ExtractError::MissingField(_))
        ));
    }

    #[test]
    fn test_parse_total() {
        let html = page_with(listing_payload(370, json!([])));
        assert_eq!(parse_total(&html).unwrap(), 370);
    }

    #[test]
    fn test_postal_code_third_token() {
        assert_eq!(postal_code("Austin, TX, 78701").unwrap(), "78701");
    }

    #[test]
    fn test_postal_code_missing_zip() {
        assert!(matches!(
            postal_code("Austin, TX"),
            Err(ExtractError::Validation { .. })
        ));
        assert!(postal_code("Austin, TX, ").is_err());
    }

    #[test]
    fn test_sale_listing_keeps_payload_address() {
        let entry = json!({
            "zpid": 123,
            "price": 450000,
            "homeType": "SINGLE_FAMILY",
            "address": { "line1": "1 Main St", "city": "Austin", "stateOrProvince": "TX", "postalCode": "78701" }
        });

        let listing = parse_listing_entry(&entry, ListingType::Sale).unwrap();
        assert_eq!(listing.listing_type, ListingType::Sale);
        assert_eq!(listing.zpid, "123");
        assert_eq!(listing.price, Some(450_000.0));
        assert_eq!(listing.home_type.as_deref(), Some("SINGLE_FAMILY"));
        assert_eq!(
            listing.address.unwrap().state_or_province.as_deref(),
            Some("TX")
        );
    }

    #[test]
    fn test_listing_without_zpid_fails_validation() {
        let entry = json!({ "price": 1000 });
        assert!(matches!(
            parse_listing_entry(&entry, ListingType::Rent),
            Err(ExtractError::Validation { section: "for-rent listing", .. })
        ));
    }

    #[test]
    fn test_past_sale_synthesizes_address() {
        let entry = json!({
            "zpid": "987",
            "street_address": "500 Congress Ave",
            "city": "Austin",
            "state": "TX",
            "city_state_zipcode": "Austin, TX, 78701",
            "price": "$350,000",
            "sold_date": "2023-04-01",
            "represented": "Buyer"
        });

        let listing = parse_listing_entry(&entry, ListingType::Past).unwrap();
        let address = listing.address.unwrap();
        assert_eq!(listing.listing_type, ListingType::Past);
        assert_eq!(address.line1.as_deref(), Some("500 Congress Ave"));
        assert_eq!(address.city.as_deref(), Some("Austin"));
        assert_eq!(address.state_or_province.as_deref(), Some("TX"));
        assert_eq!(address.postal_code.as_deref(), Some("78701"));
        assert_eq!(listing.price, Some(350_000.0));
        assert_eq!(listing.sold_date.as_deref(), Some("2023-04-01"));
    }

    #[test]
    fn test_detail_page_drops_only_bad_past_sale() {
        let html = page_with(json!({
            "props": { "pageProps": {
                "displayUser": {
                    "email": "jane@example.com",
                    "phoneNumbers": { "cell": "512-555-0100", "brokerage": "512-555-0199" }
                },
                "forSaleListings": { "listings": [ { "zpid": 1 }, { "price": 5 } ] },
                "pastSales": { "past_sales": [
                    { "zpid": 2, "city_state_zipcode": "Austin, TX, 78701" },
                    { "zpid": 3, "city_state_zipcode": "Austin, TX" },
                    { "zpid": 4, "city_state_zipcode": "Round Rock, TX, 78664" }
                ]},
                "professionalInformation": [
                    { "term": "Broker", "description": "Doe Realty" },
                    { "term": "Websites", "links": [
                        { "text": "Website", "url": "https://janedoe.example.com" },
                        { "text": "Broken", "url": "not a url" }
                    ]}
                ]
            }}
        }));

        let detail = parse_detail_page(&html, "Jane Doe").unwrap();

        assert_eq!(detail.email.as_deref(), Some("jane@example.com"));
        let phones = detail.phones.unwrap();
        assert_eq!(phones.cell.as_deref(), Some("512-555-0100"));
        assert_eq!(phones.business, None);

        assert_eq!(detail.for_sale.len(), 1);
        assert!(detail.for_rent.is_empty());

        let zpids: Vec<&str> = detail.past_sales.iter().map(|l| l.zpid.as_str()).collect();
        assert_eq!(zpids, vec!["2", "4"]);

        assert_eq!(detail.websites.len(), 1);
        assert_eq!(detail.websites[0].url, "https://janedoe.example.com");
    }

    #[test]
    fn test_detail_page_with_no_sections() {
        let html = page_with(json!({ "props": { "pageProps": {} } }));
        assert_eq!(parse_detail_page(&html, "Jane Doe").unwrap(), DetailPage::default());
    }

    #[test]
    fn test_detail_page_empty_phone_object_is_absent() {
        let html = page_with(json!({
            "props": { "pageProps": { "displayUser": { "phoneNumbers": {} } } }
        }));
        assert_eq!(parse_detail_page(&html, "Jane Doe").unwrap().phones, None);
    }
}
