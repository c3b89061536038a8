//! In-memory transport and page builders for harvester unit tests

use crate::harvester::{FetchTransport, RetryPolicy};
use crate::HarvestError;
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use url::Url;

/// Serves canned bodies keyed by target URL; anything else is a transport failure
#[derive(Default)]
pub struct MapTransport {
    bodies: HashMap<String, String>,
    calls: Mutex<Vec<String>>,
}

impl MapTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, target: &Url, body: String) -> Self {
        self.bodies.insert(target.to_string(), body);
        self
    }

    /// Number of fetches issued for `target`
    pub fn calls_to(&self, target: &Url) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|url| url.as_str() == target.as_str())
            .count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl FetchTransport for MapTransport {
    async fn fetch(&self, target: &Url) -> Result<String, HarvestError> {
        self.calls.lock().unwrap().push(target.to_string());
        self.bodies
            .get(target.as_str())
            .cloned()
            .ok_or_else(|| HarvestError::Transport {
                url: target.to_string(),
                message: "no canned body".to_string(),
            })
    }
}

pub fn quick_policy() -> RetryPolicy {
    RetryPolicy::new(3, Duration::from_millis(1))
}

pub fn base_url() -> Url {
    Url::parse("https://www.zillow.com").unwrap()
}

/// Wraps a payload in a page the way the listing source embeds it
pub fn page_with(payload: Value) -> String {
    format!(
        r#"<html><body><script id="__NEXT_DATA__" type="application/json">{}</script></body></html>"#,
        payload
    )
}

/// A listing page with `total` results, showing `agents` as `(name, profile link)`
pub fn listing_body(total: u64, agents: &[(&str, Option<&str>)]) -> String {
    let professionals: Vec<Value> = agents
        .iter()
        .map(|(name, link)| json!({ "fullName": name, "profileLink": link }))
        .collect();

    page_with(json!({
        "props": { "pageProps": { "proResults": { "results": {
            "total": total,
            "professionals": professionals
        }}}}
    }))
}

/// A profile page with an email address and a single past sale
pub fn detail_body(email: &str) -> String {
    page_with(json!({
        "props": { "pageProps": {
            "displayUser": { "email": email },
            "pastSales": { "past_sales": [
                { "zpid": 1, "city_state_zipcode": "Austin, TX, 78701" }
            ]}
        }}
    }))
}
