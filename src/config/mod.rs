//! Configuration module for Agent-Harvest
//!
//! This module handles loading, parsing, and validating TOML configuration files.
//!
//! # Example
//!
//! ```no_run
//! use agent_harvest::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("harvest.toml")).unwrap();
//! println!("Harvesting with {} workers", config.harvester.max_concurrent_tasks);
//! ```

mod parser;
mod types;
pub mod validation;

// Re-export types
pub use types::{
    Config, HarvesterConfig, OutputConfig, RetryConfig, SourceConfig, TransportConfig,
};

// Re-export parser functions
pub use parser::{compute_config_hash, load_config, load_config_with_hash, parse_config};
