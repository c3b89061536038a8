use crate::harvester::RetryPolicy;
use crate::model::Category;
use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Agent-Harvest
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub harvester: HarvesterConfig,
    #[serde(default)]
    pub retry: RetryConfig,
    #[serde(default)]
    pub source: SourceConfig,
    pub transport: TransportConfig,
    pub output: OutputConfig,
}

/// Harvest behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterConfig {
    /// Maximum number of page or profile fetches in flight at once
    #[serde(rename = "max-concurrent-tasks", default = "default_max_concurrent_tasks")]
    pub max_concurrent_tasks: u32,

    /// Categories to harvest; all of them when omitted
    #[serde(default)]
    pub categories: Option<Vec<Category>>,
}

impl HarvesterConfig {
    /// Returns the categories to harvest in their fixed harvest order
    pub fn categories(&self) -> Vec<Category> {
        match &self.categories {
            Some(selected) => Category::all()
                .into_iter()
                .filter(|c| selected.contains(c))
                .collect(),
            None => Category::all(),
        }
    }
}

impl Default for HarvesterConfig {
    fn default() -> Self {
        Self {
            max_concurrent_tasks: default_max_concurrent_tasks(),
            categories: None,
        }
    }
}

/// Retry settings for each kind of fetch
#[derive(Debug, Clone, Deserialize)]
pub struct RetryConfig {
    /// Attempts per operation, including the first
    #[serde(default = "default_attempts")]
    pub attempts: u32,

    /// Delay between listing page attempts (milliseconds)
    #[serde(rename = "page-delay-ms", default = "default_page_delay_ms")]
    pub page_delay_ms: u64,

    /// Delay between page bound attempts (milliseconds)
    #[serde(rename = "bound-delay-ms", default = "default_bound_delay_ms")]
    pub bound_delay_ms: u64,

    /// Delay between profile page attempts (milliseconds)
    #[serde(rename = "detail-delay-ms", default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,
}

impl RetryConfig {
    pub fn page_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.page_delay_ms))
    }

    pub fn bound_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.bound_delay_ms))
    }

    pub fn detail_policy(&self) -> RetryPolicy {
        RetryPolicy::new(self.attempts, Duration::from_millis(self.detail_delay_ms))
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            attempts: default_attempts(),
            page_delay_ms: default_page_delay_ms(),
            bound_delay_ms: default_bound_delay_ms(),
            detail_delay_ms: default_detail_delay_ms(),
        }
    }
}

/// Listing source configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SourceConfig {
    /// Origin that listing and profile paths are resolved against
    #[serde(rename = "base-url", default = "default_base_url")]
    pub base_url: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

/// Fetch proxy configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TransportConfig {
    /// Proxy endpoint that receives `api_key` and `url` query parameters
    pub endpoint: String,

    /// Proxy API key
    #[serde(rename = "api-key")]
    pub api_key: String,

    /// Per-request timeout (seconds)
    #[serde(rename = "timeout-secs", default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
pub struct OutputConfig {
    /// Path to the SQLite database file
    #[serde(rename = "database-path")]
    pub database_path: String,

    /// Directory CSV exports are written to
    #[serde(rename = "export-dir", default)]
    pub export_dir: Option<String>,
}

fn default_max_concurrent_tasks() -> u32 {
    20
}

fn default_attempts() -> u32 {
    3
}

fn default_page_delay_ms() -> u64 {
    2_000
}

fn default_bound_delay_ms() -> u64 {
    5_000
}

fn default_detail_delay_ms() -> u64 {
    2_000
}

fn default_base_url() -> String {
    "https://www.zillow.com".to_string()
}

fn default_timeout_secs() -> u64 {
    70
}
