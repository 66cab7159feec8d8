use serde::{Deserialize, Deserializer};
use std::collections::{BTreeMap, HashSet};
use std::path::PathBuf;
use std::time::Duration;
use url::Url;

use crate::config::{normalize, Defaults};
use crate::ConfigResult;

/// Tri-state option value distinguishing an absent field from an explicit null.
///
/// In a JSON options document a missing key deserializes to `Unset` (via
/// `#[serde(default)]`) while `null` deserializes to `Null`. Normalization
/// replaces `Unset` with the defaults value and preserves `Null` verbatim.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Setting<T> {
    /// Field was not provided; defaults apply.
    #[default]
    Unset,
    /// Field was explicitly null.
    Null,
    /// Field carried a value.
    Value(T),
}

impl<'de, T> Deserialize<'de> for Setting<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => Setting::Value(value),
            None => Setting::Null,
        })
    }
}

/// One caller-supplied seed: a bare URL string or a `{url, filename}` descriptor
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum SeedEntry {
    Bare(String),
    Described {
        url: String,
        #[serde(default)]
        filename: Option<String>,
    },
}

impl SeedEntry {
    pub fn url(&self) -> &str {
        match self {
            Self::Bare(url) => url,
            Self::Described { url, .. } => url,
        }
    }

    pub fn filename(&self) -> Option<&str> {
        match self {
            Self::Bare(_) => None,
            Self::Described { filename, .. } => filename.as_deref(),
        }
    }
}

impl From<&str> for SeedEntry {
    fn from(url: &str) -> Self {
        Self::Bare(url.to_string())
    }
}

/// Seed input shape: one entry or a sequence of entries
///
/// A single string or single descriptor is normalized to a one-element
/// sequence; caller-supplied sequences are taken in order.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum UrlInput {
    One(SeedEntry),
    Many(Vec<SeedEntry>),
}

impl UrlInput {
    pub fn into_entries(self) -> Vec<SeedEntry> {
        match self {
            Self::One(entry) => vec![entry],
            Self::Many(entries) => entries,
        }
    }
}

impl Default for UrlInput {
    fn default() -> Self {
        Self::Many(Vec::new())
    }
}

impl From<&str> for UrlInput {
    fn from(url: &str) -> Self {
        Self::One(SeedEntry::from(url))
    }
}

impl From<Vec<&str>> for UrlInput {
    fn from(urls: Vec<&str>) -> Self {
        Self::Many(urls.into_iter().map(SeedEntry::from).collect())
    }
}

/// One extraction rule: find elements by CSS selector, read one attribute
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SourceRule {
    pub selector: String,
    pub attr: String,
}

impl SourceRule {
    pub fn new(selector: impl Into<String>, attr: impl Into<String>) -> Self {
        Self {
            selector: selector.into(),
            attr: attr.into(),
        }
    }
}

/// Extension-to-directory routing rule for local filename assignment
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SubdirectoryRule {
    pub directory: String,
    pub extensions: Vec<String>,
}

impl SubdirectoryRule {
    pub fn new(directory: impl Into<String>, extensions: &[&str]) -> Self {
        Self {
            directory: directory.into(),
            extensions: extensions.iter().map(|ext| ext.to_string()).collect(),
        }
    }
}

/// Caller overrides for the request configuration
///
/// Merged over the defaults field by field; `headers` merges key by key with
/// caller values winning per key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RequestOverrides {
    #[serde(default)]
    pub headers: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub connect_timeout_secs: Option<u64>,
    #[serde(default)]
    pub redirect_limit: Option<usize>,
}

/// Fully merged request configuration, bound once per crawl
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestConfig {
    pub headers: BTreeMap<String, String>,
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub redirect_limit: usize,
}

impl RequestConfig {
    /// Produces a new configuration with `overrides` applied on top.
    ///
    /// Top-level fields are replaced when the caller specified them; the
    /// nested `headers` map is merged key by key so unspecified default
    /// headers survive.
    pub fn merged_with(&self, overrides: &RequestOverrides) -> RequestConfig {
        let mut headers = self.headers.clone();
        if let Some(extra) = &overrides.headers {
            for (name, value) in extra {
                headers.insert(name.clone(), value.clone());
            }
        }

        RequestConfig {
            headers,
            timeout_secs: overrides.timeout_secs.unwrap_or(self.timeout_secs),
            connect_timeout_secs: overrides
                .connect_timeout_secs
                .unwrap_or(self.connect_timeout_secs),
            redirect_limit: overrides.redirect_limit.unwrap_or(self.redirect_limit),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

/// Raw, partially specified caller options
///
/// Field names follow the JSON options document (camelCase). Every field is
/// optional; normalization fills the gaps from [`Defaults`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ScrapeOptions {
    pub urls: UrlInput,
    pub directory: Option<PathBuf>,
    pub default_filename: Option<String>,
    pub sources: Option<Vec<SourceRule>>,
    pub subdirectories: Setting<Vec<SubdirectoryRule>>,
    pub request: RequestOverrides,
    pub recursive: bool,
    pub max_depth: Option<u32>,
    pub concurrency: Option<usize>,
}

/// One normalized seed descriptor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedDescriptor {
    pub url: Url,
    pub filename: Option<String>,
}

/// Complete, internally consistent crawl configuration
///
/// Built once per crawl by [`normalize`] and immutable thereafter.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    /// Seed descriptors in caller order.
    pub urls: Vec<SeedDescriptor>,
    /// Output directory exactly as the caller gave it.
    pub directory: Option<PathBuf>,
    /// `directory` resolved against the working directory; unset when no
    /// directory was configured.
    pub absolute_directory_path: Option<PathBuf>,
    /// Fallback local filename for resources without a derivable name.
    pub default_filename: String,
    /// Extraction rules in application order.
    pub sources: Vec<SourceRule>,
    /// Indices into `sources` that follow page links (depth-limited).
    pub link_rule_indices: HashSet<usize>,
    /// Subdirectory routing rules; `None` means routing is disabled.
    pub subdirectories: Option<Vec<SubdirectoryRule>>,
    /// Merged request configuration, bound once for every fetch.
    pub request: RequestConfig,
    pub recursive: bool,
    /// Depth cap for link-following rules; `None` is unbounded.
    pub max_depth: Option<u32>,
    /// Maximum concurrent in-flight fetches.
    pub concurrency: usize,
}

impl CrawlConfig {
    /// Normalizes `options` against the built-in defaults.
    pub fn from_options(options: ScrapeOptions) -> ConfigResult<Self> {
        normalize(options, &Defaults::default())
    }

    /// Whether the rule at `rule_index` is a link-following rule subject to
    /// the depth policy.
    pub fn is_link_rule(&self, rule_index: usize) -> bool {
        self.link_rule_indices.contains(&rule_index)
    }
}
