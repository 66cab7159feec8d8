//! Crawl orchestration
//!
//! The request capability ([`RequestClient`], [`HttpClient`]) and the crawl
//! engine ([`CrawlEngine`]) that drives fetching, extraction, and graph
//! assembly.

mod client;
mod engine;

pub use client::{FetchedResponse, HttpClient, RequestClient};
pub use engine::{CancelHandle, CrawlEngine, CrawlOutcome};

use crate::config::{CrawlConfig, ScrapeOptions};
use crate::SitegrabError;

/// Normalizes `options`, binds the HTTP client, and runs the crawl.
///
/// # Example
///
/// ```no_run
/// use sitegrab::config::ScrapeOptions;
/// use sitegrab::crawler::run_crawl;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let options: ScrapeOptions =
///     serde_json::from_str(r#"{"urls": "http://example.com", "recursive": true}"#)?;
/// let outcome = run_crawl(options).await?;
/// println!("{} resources", outcome.graph.len());
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(options: ScrapeOptions) -> Result<CrawlOutcome, SitegrabError> {
    let config = CrawlConfig::from_options(options)?;
    let engine = CrawlEngine::new(config)?;
    Ok(engine.run().await)
}
