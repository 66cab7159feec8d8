//! Options and crawl configuration
//!
//! Callers describe a crawl with [`ScrapeOptions`] (every field optional,
//! deserializable from a JSON options document); [`normalize`] merges the
//! options with a [`Defaults`] source and validates the result into an
//! immutable [`CrawlConfig`].

mod defaults;
mod normalize;
mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{
    CrawlConfig, RequestConfig, RequestOverrides, ScrapeOptions, SeedDescriptor, SeedEntry,
    Setting, SourceRule, SubdirectoryRule, UrlInput,
};

// Re-export normalization entry points
pub use defaults::{link_follow_rules, Defaults};
pub use normalize::normalize;
pub use parser::load_options;
