//! Agent-Harvest: a regional directory harvester
//!
//! This crate discovers real-estate professionals for a region from a paginated
//! listing source, follows each profile link to enrich the record with contact
//! numbers, listings, past sales and websites, and tracks the harvest job status
//! in SQLite.

pub mod config;
pub mod harvester;
pub mod model;
pub mod output;
pub mod storage;

use thiserror::Error;

/// Main error type for Agent-Harvest operations
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Transport failure for {url}: {message}")]
    Transport { url: String, message: String },

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    #[error("Listing page {page} for {category} has no embedded payload")]
    PageUnavailable {
        category: model::Category,
        page: u32,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] storage::StorageError),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Invalid job transition: {from:?} -> {to:?}")]
    InvalidTransition {
        from: model::JobState,
        to: model::JobState,
    },

    #[error("Worker task failed: {0}")]
    TaskFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] ::url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Errors raised while pulling structured data out of a fetched page
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("No embedded __NEXT_DATA__ payload in page")]
    MissingPayload,

    #[error("Invalid selector {selector:?}: {message}")]
    InvalidSelector {
        selector: &'static str,
        message: String,
    },

    #[error("Embedded payload is not valid JSON: {0}")]
    MalformedPayload(#[from] serde_json::Error),

    #[error("Payload is missing {0}")]
    MissingField(&'static str),

    #[error("Invalid {section} entry: {message}")]
    Validation {
        section: &'static str,
        message: String,
    },
}

/// Result type alias for Agent-Harvest operations
pub type Result<T> = std::result::Result<T, HarvestError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for extraction operations
pub type ExtractResult<T> = std::result::Result<T, ExtractError>;

// Re-export commonly used types
pub use config::Config;
pub use harvester::{HarvestReport, Harvester};
pub use model::{Category, EnrichedRecord, JobStatus, Region, SummaryRecord};
