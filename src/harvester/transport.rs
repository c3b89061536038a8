//! Outbound fetch transport
//!
//! Pages are not requested directly: every target URL is handed to a fetch
//! proxy as a query parameter together with the API key. The harvester only
//! sees the [`FetchTransport`] trait, so tests can swap in canned bodies.

use crate::config::TransportConfig;
use crate::HarvestError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches the body of a target page
#[async_trait]
pub trait FetchTransport: Send + Sync {
    /// Returns the body text of `target`, or a transport failure
    async fn fetch(&self, target: &Url) -> Result<String, HarvestError>;
}

/// Builds the HTTP client used to talk to the fetch proxy
///
/// # Arguments
///
/// * `config` - The transport configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
pub fn build_http_client(config: &TransportConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(concat!("agent-harvest/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(config.timeout_secs))
        .connect_timeout(Duration::from_secs(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Transport that routes every request through a fetch proxy
///
/// A request for `target` becomes `GET {endpoint}?api_key={key}&url={target}`.
pub struct ProxyTransport {
    client: Client,
    endpoint: Url,
    api_key: String,
}

impl ProxyTransport {
    /// Creates a proxy transport from configuration
    pub fn new(config: &TransportConfig) -> Result<Self, HarvestError> {
        let client = build_http_client(config)?;
        let endpoint = Url::parse(&config.endpoint)?;

        Ok(Self {
            client,
            endpoint,
            api_key: config.api_key.clone(),
        })
    }

    /// Returns the proxy URL that fetches `target`
    pub fn proxy_url(&self, target: &Url) -> Url {
        let mut url = self.endpoint.clone();
        url.query_pairs_mut()
            .append_pair("api_key", &self.api_key)
            .append_pair("url", target.as_str());
        url
    }
}

#[async_trait]
impl FetchTransport for ProxyTransport {
    async fn fetch(&self, target: &Url) -> Result<String, HarvestError> {
        tracing::debug!("Fetching {} via proxy", target);

        // Errors are reported against the target; the proxy URL carries the API key
        let failure = |message: String| HarvestError::Transport {
            url: target.to_string(),
            message,
        };

        let response = self
            .client
            .get(self.proxy_url(target))
            .send()
            .await
            .map_err(|e| failure(classify_error(e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(failure(format!("proxy returned HTTP {}", status.as_u16())));
        }

        response
            .text()
            .await
            .map_err(|e| failure(classify_error(e)))
    }
}

/// Describes a reqwest error without echoing the request URL
fn classify_error(e: reqwest::Error) -> String {
    if e.is_timeout() {
        "Request timeout".to_string()
    } else if e.is_connect() {
        "Connection refused".to_string()
    } else {
        e.without_url().to_string()
    }
}
