use reqwest::header::{HeaderName, HeaderValue};
use scraper::Selector;

use crate::config::types::{CrawlConfig, SourceRule, SubdirectoryRule};
use crate::ConfigError;

/// Validates a normalized configuration, failing fast before any fetch.
pub fn validate(config: &CrawlConfig) -> Result<(), ConfigError> {
    if config.urls.is_empty() {
        return Err(ConfigError::NoUrls);
    }

    if config.default_filename.is_empty() {
        return Err(ConfigError::Validation(
            "defaultFilename cannot be empty".to_string(),
        ));
    }

    if config.concurrency < 1 {
        return Err(ConfigError::Validation(format!(
            "concurrency must be >= 1, got {}",
            config.concurrency
        )));
    }

    validate_sources(&config.sources)?;

    if let Some(rules) = &config.subdirectories {
        validate_subdirectories(rules)?;
    }

    validate_headers(config)?;

    Ok(())
}

/// Every selector must compile and every rule must name an attribute.
fn validate_sources(sources: &[SourceRule]) -> Result<(), ConfigError> {
    for rule in sources {
        Selector::parse(&rule.selector).map_err(|e| ConfigError::InvalidSelector {
            selector: rule.selector.clone(),
            message: e.to_string(),
        })?;

        if rule.attr.is_empty() {
            return Err(ConfigError::Validation(format!(
                "source rule '{}' has an empty attribute name",
                rule.selector
            )));
        }
    }
    Ok(())
}

fn validate_subdirectories(rules: &[SubdirectoryRule]) -> Result<(), ConfigError> {
    for rule in rules {
        if rule.directory.is_empty() {
            return Err(ConfigError::Validation(
                "subdirectory rule has an empty directory name".to_string(),
            ));
        }

        if rule.extensions.is_empty() {
            return Err(ConfigError::Validation(format!(
                "subdirectory rule '{}' has no extensions",
                rule.directory
            )));
        }
    }
    Ok(())
}

/// Header names and values must be valid HTTP tokens; rejecting them here
/// keeps client construction infallible at crawl time.
fn validate_headers(config: &CrawlConfig) -> Result<(), ConfigError> {
    for (name, value) in &config.request.headers {
        HeaderName::from_bytes(name.as_bytes()).map_err(|e| ConfigError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;

        HeaderValue::from_str(value).map_err(|e| ConfigError::InvalidHeader {
            name: name.clone(),
            message: e.to_string(),
        })?;
    }
    Ok(())
}
