use crate::config::types::{
    Config, HarvesterConfig, OutputConfig, RetryConfig, SourceConfig, TransportConfig,
};
use crate::ConfigError;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_harvester_config(&config.harvester)?;
    validate_retry_config(&config.retry)?;
    validate_source_config(&config.source)?;
    validate_transport_config(&config.transport)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates harvester configuration
fn validate_harvester_config(config: &HarvesterConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_tasks < 1 || config.max_concurrent_tasks > 100 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_tasks must be between 1 and 100, got {}",
            config.max_concurrent_tasks
        )));
    }

    if let Some(categories) = &config.categories {
        if categories.is_empty() {
            return Err(ConfigError::Validation(
                "categories cannot be empty when given; omit it to harvest every category"
                    .to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for category in categories {
            if !seen.insert(category) {
                return Err(ConfigError::Validation(format!(
                    "category '{}' is listed more than once",
                    category
                )));
            }
        }
    }

    Ok(())
}

/// Validates retry configuration
fn validate_retry_config(config: &RetryConfig) -> Result<(), ConfigError> {
    if config.attempts < 1 || config.attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "retry attempts must be between 1 and 10, got {}",
            config.attempts
        )));
    }

    Ok(())
}

/// Validates listing source configuration
fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)
}

/// Validates transport configuration
fn validate_transport_config(config: &TransportConfig) -> Result<(), ConfigError> {
    validate_http_url("endpoint", &config.endpoint)?;

    if config.api_key.trim().is_empty() {
        return Err(ConfigError::Validation("api_key cannot be empty".to_string()));
    }

    if config.timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "timeout_secs must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    if let Some(dir) = &config.export_dir {
        if dir.is_empty() {
            return Err(ConfigError::Validation(
                "export_dir cannot be empty when given".to_string(),
            ));
        }
    }

    Ok(())
}

/// Checks that `value` is an absolute http(s) URL
fn validate_http_url(field: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid {}: {}", field, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            field, value
        )));
    }

    Ok(())
}
