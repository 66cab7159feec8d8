//! Sitegrab: a recursive web-resource crawler
//!
//! Given one or more seed URLs, sitegrab fetches each page, extracts embedded
//! sub-resources (images, stylesheets, scripts, links) through a configurable
//! extraction pipeline, optionally follows discovered page links up to a depth
//! limit, and produces a resolved graph of resources with deterministic local
//! filenames.

pub mod config;
pub mod crawler;
pub mod naming;
pub mod pipeline;
pub mod resource;
pub mod save;

use thiserror::Error;

/// Main error type for sitegrab operations
#[derive(Debug, Error)]
pub enum SitegrabError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Save error: {0}")]
    Save(#[from] save::SaveError),
}

/// Configuration-specific errors
///
/// All of these are raised while normalizing caller options, before any
/// network activity begins.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("No seed URLs were provided")]
    NoUrls,

    #[error("Invalid seed URL '{url}': {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Invalid source selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("Invalid request header '{name}': {message}")]
    InvalidHeader { name: String, message: String },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Failed to read options file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse options document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Per-resource fetch failure
///
/// Recorded on the failing resource and never fatal to the crawl as a whole.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP status {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Transport error for {url}: {source}")]
    Transport { url: String, source: reqwest::Error },
}

impl FetchError {
    /// The URL the failed fetch was addressed to.
    pub fn url(&self) -> &str {
        match self {
            Self::Status { url, .. } | Self::Timeout { url } | Self::Transport { url, .. } => url,
        }
    }
}

/// Extraction failure for a single resource
///
/// The affected resource resolves with zero children; its fetched content is
/// still part of the output graph.
#[derive(Debug, Error)]
#[error("Failed to compile selector '{selector}': {message}")]
pub struct ExtractionError {
    pub selector: String,
    pub message: String,
}

/// Result type alias for sitegrab operations
pub type Result<T> = std::result::Result<T, SitegrabError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{CrawlConfig, Defaults, ScrapeOptions, Setting, SourceRule, SubdirectoryRule};
pub use crawler::{run_crawl, CancelHandle, CrawlEngine, CrawlOutcome, HttpClient, RequestClient};
pub use resource::{CrawlGraph, Resource, ResourceId, ResourceState};
