//! Built-in defaults merged under caller options during normalization

use std::collections::BTreeMap;

use crate::config::types::{RequestConfig, SourceRule, SubdirectoryRule};

/// Defaults source consumed by the option normalizer
///
/// Tests may construct their own instance to observe how normalization
/// combines caller options with an arbitrary defaults set.
#[derive(Debug, Clone)]
pub struct Defaults {
    pub default_filename: String,
    pub sources: Vec<SourceRule>,
    pub subdirectories: Option<Vec<SubdirectoryRule>>,
    pub request: RequestConfig,
    pub concurrency: usize,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            default_filename: "index.html".to_string(),
            sources: vec![
                SourceRule::new("img", "src"),
                SourceRule::new("link[rel=\"stylesheet\"]", "href"),
                SourceRule::new("script[src]", "src"),
            ],
            subdirectories: Some(vec![
                SubdirectoryRule::new(
                    "images",
                    &[".png", ".jpg", ".jpeg", ".gif", ".svg", ".ico", ".webp"],
                ),
                SubdirectoryRule::new("js", &[".js"]),
                SubdirectoryRule::new("css", &[".css"]),
                SubdirectoryRule::new("fonts", &[".woff", ".woff2", ".ttf", ".otf", ".eot"]),
            ]),
            request: RequestConfig {
                headers: BTreeMap::new(),
                timeout_secs: 30,
                connect_timeout_secs: 10,
                redirect_limit: 10,
            },
            concurrency: 8,
        }
    }
}

/// Rules appended to `sources` when recursion is enabled, so that recursion
/// always has a source of child pages even when the caller supplied only
/// asset-extraction rules.
pub fn link_follow_rules() -> Vec<SourceRule> {
    vec![SourceRule::new("a", "href")]
}
