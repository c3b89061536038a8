//! Integration tests for the harvester
//!
//! These tests use wiremock to stand in for the fetch proxy and drive the
//! full harvest cycle end-to-end: configuration file, proxy transport,
//! SQLite storage, status checks and CSV export.

use agent_harvest::config::{load_config_with_hash, Config};
use agent_harvest::harvester::{run_harvest, FetchTransport, ProxyTransport};
use agent_harvest::model::JobState;
use agent_harvest::output::{check_status, export_region, StatusKind};
use agent_harvest::storage::{SqliteStorage, Storage};
use agent_harvest::{Category, HarvestError, Region};
use serde_json::{json, Value};
use std::path::Path;
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const API_KEY: &str = "test-key";
const SOURCE: &str = "https://www.zillow.com";

/// Writes a config pointing at the mock proxy and loads it back
fn write_config(dir: &TempDir, proxy: &MockServer, categories: &str) -> (Config, String) {
    let config_path = dir.path().join("harvest.toml");
    let content = format!(
        r#"
[harvester]
max-concurrent-tasks = 4
categories = {categories}

[retry]
attempts = 3
page-delay-ms = 1
bound-delay-ms = 1
detail-delay-ms = 1

[source]
base-url = "{SOURCE}"

[transport]
endpoint = "{endpoint}/"
api-key = "{API_KEY}"
timeout-secs = 5

[output]
database-path = "{db}"
export-dir = "{exports}"
"#,
        endpoint = proxy.uri(),
        db = dir.path().join("harvest.db").display(),
        exports = dir.path().join("exports").display(),
    );
    std::fs::write(&config_path, content).expect("Failed to write config");
    load_config_with_hash(&config_path).expect("Failed to load config")
}

fn page_with(payload: Value) -> String {
    format!(
        r#"<html><head><title>Agents</title></head><body>
        <script id="__NEXT_DATA__" type="application/json">{}</script>
        </body></html>"#,
        payload
    )
}

fn listing_page(total: u64, professionals: Value) -> String {
    page_with(json!({
        "props": { "pageProps": { "proResults": { "results": {
            "total": total,
            "professionals": professionals
        }}}}
    }))
}

fn listing_target(slug: &str, category: &str, page: u32) -> String {
    format!(
        "{SOURCE}/professionals/real-estate-agent-reviews/{slug}/?specialties={category}&page={page}"
    )
}

/// Mounts a proxied response for `target`
async fn mount_target(server: &MockServer, target: &str, response: ResponseTemplate) {
    Mock::given(method("GET"))
        .and(path("/"))
        .and(query_param("api_key", API_KEY))
        .and(query_param("url", target))
        .respond_with(response)
        .mount(server)
        .await;
}

async fn mount_body(server: &MockServer, target: &str, body: String) {
    mount_target(
        server,
        target,
        ResponseTemplate::new(200)
            .set_body_string(body)
            .insert_header("content-type", "text/html"),
    )
    .await;
}

fn open_storage(config: &Config) -> SqliteStorage {
    SqliteStorage::new(Path::new(&config.output.database_path)).expect("Failed to open storage")
}

#[tokio::test]
async fn test_full_harvest_two_categories() {
    let proxy = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &proxy, r#"["buyers-agent", "listing-agent"]"#);
    let austin = Region::new("Austin", "TX");

    // Buyer's agents: 20 results over two pages, the second one failing
    mount_body(
        &proxy,
        &listing_target("austin-tx", "BuyersAgent", 1),
        listing_page(
            20,
            json!([
                {
                    "fullName": "Jane Doe",
                    "encodedZuid": "X1-jane",
                    "businessName": "Acme Realty",
                    "phoneNumber": "(512) 555-0100",
                    "profileLink": "/profile/jane-doe/",
                    "reviewStarsRating": 4.8,
                    "numTotalReviews": 52
                },
                { "fullName": "John Roe", "profileLink": null }
            ]),
        ),
    )
    .await;

    Mock::given(method("GET"))
        .and(query_param("url", listing_target("austin-tx", "BuyersAgent", 2).as_str()))
        .respond_with(ResponseTemplate::new(500))
        .expect(3)
        .mount(&proxy)
        .await;

    // Listing agents: 5 results on one page, Jane again
    mount_body(
        &proxy,
        &listing_target("austin-tx", "ListingAgent", 1),
        listing_page(
            5,
            json!([
                { "fullName": "Jane Doe", "profileLink": "/profile/jane-doe/" },
                { "fullName": "Mary Major", "profileLink": "/profile/mary-major/" }
            ]),
        ),
    )
    .await;

    mount_body(
        &proxy,
        &format!("{SOURCE}/profile/jane-doe/"),
        page_with(json!({
            "props": { "pageProps": {
                "displayUser": {
                    "email": "jane@acme.example",
                    "phoneNumbers": { "cell": "(512) 555-0101", "brokerage": "(512) 555-0199" }
                },
                "forSaleListings": { "listings": [
                    { "zpid": 111, "price": "$525,000", "bedrooms": 3, "bathrooms": 2,
                      "address": { "line1": "9 Elm St", "city": "Austin",
                                   "stateOrProvince": "TX", "postalCode": "78704" } }
                ]},
                "pastSales": { "past_sales": [
                    { "zpid": 222, "street_address": "1 Main St", "city": "Austin",
                      "state": "TX", "city_state_zipcode": "Austin, TX, 78701" },
                    { "zpid": 333, "street_address": "2 Main St", "city": "Austin",
                      "state": "TX", "city_state_zipcode": "Austin, TX" }
                ]},
                "professionalInformation": [
                    { "term": "Websites", "links": [
                        { "url": "https://jane.example.com", "text": "Website" }
                    ]}
                ]
            }}
        })),
    )
    .await;

    // Mary's profile has no embedded payload
    Mock::given(method("GET"))
        .and(query_param("url", format!("{SOURCE}/profile/mary-major/").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html><body>Blocked</body></html>"))
        .expect(3)
        .mount(&proxy)
        .await;

    let report = run_harvest(&config, &hash, &austin)
        .await
        .expect("Harvest should succeed");

    assert_eq!(report.job.state(), JobState::Completed);

    let names: Vec<&str> = report.records.iter().map(|r| r.full_name()).collect();
    assert_eq!(names, vec!["Jane Doe", "John Roe", "Mary Major"]);

    let jane = &report.records[0];
    assert_eq!(
        jane.summary.categories,
        vec![Category::BuyersAgent, Category::ListingAgent]
    );
    assert_eq!(jane.summary.review_count, Some(52));
    assert_eq!(jane.email.as_deref(), Some("jane@acme.example"));
    assert_eq!(
        jane.phones.as_ref().and_then(|p| p.cell.as_deref()),
        Some("(512) 555-0101")
    );
    assert_eq!(jane.for_sale.len(), 1);
    assert_eq!(jane.for_sale[0].price, Some(525_000.0));
    assert_eq!(jane.past_sales.len(), 1, "sale without a zip is dropped");
    assert_eq!(
        jane.past_sales[0]
            .address
            .as_ref()
            .and_then(|a| a.postal_code.as_deref()),
        Some("78701")
    );
    assert_eq!(jane.websites.len(), 1);

    assert!(!report.records[1].has_details());
    assert!(!report.records[2].has_details());

    // Persisted state
    let storage = open_storage(&config);
    let status = check_status(&storage, &austin);
    assert_eq!(status.kind, StatusKind::Completed);
    assert_eq!(status.code, 200);

    let region_id = storage.get_region_id(&austin).unwrap().unwrap();
    assert_eq!(storage.load_agents(region_id).unwrap().len(), 3);
    assert_eq!(
        storage.get_agent("X1-jane").unwrap().as_ref(),
        Some(jane)
    );
    assert_eq!(
        storage.get_agent_regions(jane.storage_key()).unwrap(),
        vec![Region::new("AUSTIN", "TX")]
    );

    let jobs = storage.list_jobs().unwrap();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].config_hash, hash);
    assert_eq!(jobs[0].agent_count, 3);

    // Export
    let exports = dir.path().join("exports");
    let (csv_path, written) = export_region(&storage, &austin, &exports).unwrap();
    assert_eq!(written, 3);
    assert!(csv_path.ends_with("austin-tx.csv"));

    let mut reader = csv::Reader::from_path(&csv_path).unwrap();
    let headers = reader.headers().unwrap().clone();
    assert!(headers.iter().any(|h| h == "cell"));
    assert_eq!(reader.records().count(), 3);
}

#[tokio::test]
async fn test_status_before_and_after_harvest() {
    let proxy = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &proxy, r#"["relocation"]"#);
    let region = Region::new("San Antonio", "TX");

    {
        let storage = open_storage(&config);
        assert_eq!(check_status(&storage, &region).code, 404);
    }

    mount_body(
        &proxy,
        &listing_target("san-antonio-tx", "Relocation", 1),
        listing_page(0, json!([])),
    )
    .await;

    let report = run_harvest(&config, &hash, &region).await.unwrap();
    assert!(report.records.is_empty());
    assert_eq!(report.job.state(), JobState::Completed);

    let storage = open_storage(&config);
    assert_eq!(check_status(&storage, &region).kind, StatusKind::Completed);
}

#[tokio::test]
async fn test_unreachable_proxy_degrades_to_empty_harvest() {
    let proxy = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, hash) = write_config(&dir, &proxy, r#"["foreclosure"]"#);
    let region = Region::new("Waco", "TX");

    // Bound lookup and the single fallback page both exhaust their retries
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(6)
        .mount(&proxy)
        .await;

    let report = run_harvest(&config, &hash, &region).await.unwrap();

    assert!(report.records.is_empty());
    assert_eq!(report.job.state(), JobState::Completed);
}

#[tokio::test]
async fn test_proxy_transport_failure_hides_api_key() {
    let proxy = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    let (config, _) = write_config(&dir, &proxy, r#"["consulting"]"#);

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&proxy)
        .await;

    let transport = ProxyTransport::new(&config.transport).unwrap();
    let target = Url::parse(&format!("{SOURCE}/profile/someone/")).unwrap();

    match transport.fetch(&target).await {
        Err(HarvestError::Transport { url, message }) => {
            assert_eq!(url, target.as_str());
            assert!(message.contains("403"));
            assert!(!message.contains(API_KEY));
        }
        other => panic!("Expected transport failure, got {:?}", other),
    }
}
