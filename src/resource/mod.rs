//! Resources and the resolved crawl graph
//!
//! A [`Resource`] is one URL-addressable unit tracked by the crawl. Resources
//! live in a [`CrawlGraph`] arena and reference each other by [`ResourceId`],
//! which lets a shared asset appear as a child of many parents without
//! ownership cycles.

use std::borrow::Cow;
use std::fmt;

use url::Url;

use crate::FetchError;

/// Handle to a resource inside a [`CrawlGraph`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(pub(crate) usize);

impl ResourceId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Lifecycle state of a resource
///
/// `Pending -> Fetching -> Fetched | Failed`; resources whose content was
/// extracted move on to `Resolved` once every reference has been linked or
/// enqueued. Non-eligible fetched resources stay `Fetched`, which is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceState {
    /// Claimed in the visited set, waiting in the frontier.
    Pending,
    /// A fetch is in flight.
    Fetching,
    /// Body attached; not eligible for extraction.
    Fetched,
    /// Fetch failed; the error is recorded on the resource.
    Failed,
    /// Extraction complete, all references processed.
    Resolved,
}

impl ResourceState {
    /// True once no further processing will happen for this resource.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Fetched | Self::Failed | Self::Resolved)
    }

    pub fn is_active(&self) -> bool {
        !self.is_terminal()
    }

    /// True if the resource carries successfully fetched content.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Fetched | Self::Resolved)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetching => "fetching",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
            Self::Resolved => "resolved",
        }
    }
}

impl fmt::Display for ResourceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Body and metadata captured from a completed fetch
#[derive(Debug, Clone)]
pub struct FetchedBody {
    pub body: Vec<u8>,
    pub status: u16,
    pub content_type: String,
}

impl FetchedBody {
    /// Whether the content type admits the extraction pipeline.
    pub fn is_html(&self) -> bool {
        self.content_type.to_ascii_lowercase().contains("text/html")
    }

    /// Body decoded as text, lossily for non-UTF-8 content.
    pub fn text(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// One URL-addressable unit tracked by the crawl
#[derive(Debug)]
pub struct Resource {
    pub id: ResourceId,
    /// Fetch URL; stable identity for the resource's lifetime.
    pub url: Url,
    /// Assigned local path, relative to the output directory.
    pub filename: String,
    /// Distance from the seed that discovered this resource.
    pub depth: u32,
    pub state: ResourceState,
    /// Present after a successful fetch.
    pub content: Option<FetchedBody>,
    /// Present after a failed fetch.
    pub error: Option<FetchError>,
    /// Children in pipeline emission order, deduplicated per parent.
    pub children: Vec<ResourceId>,
}

/// Resolved output graph of a crawl
///
/// Arena of resources plus the seed roots in input order.
#[derive(Debug, Default)]
pub struct CrawlGraph {
    resources: Vec<Resource>,
    roots: Vec<ResourceId>,
}

impl CrawlGraph {
    pub(crate) fn insert(&mut self, url: Url, filename: String, depth: u32, root: bool) -> ResourceId {
        let id = ResourceId(self.resources.len());
        self.resources.push(Resource {
            id,
            url,
            filename,
            depth,
            state: ResourceState::Pending,
            content: None,
            error: None,
            children: Vec::new(),
        });
        if root {
            self.roots.push(id);
        }
        id
    }

    pub fn get(&self, id: ResourceId) -> &Resource {
        &self.resources[id.0]
    }

    pub(crate) fn get_mut(&mut self, id: ResourceId) -> &mut Resource {
        &mut self.resources[id.0]
    }

    /// Seed resources in input order.
    pub fn roots(&self) -> &[ResourceId] {
        &self.roots
    }

    pub fn resources(&self) -> impl Iterator<Item = &Resource> {
        self.resources.iter()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }

    pub fn count_in_state(&self, state: ResourceState) -> usize {
        self.resources.iter().filter(|r| r.state == state).count()
    }

    /// Looks a resource up by its exact URL.
    pub fn find_by_url(&self, url: &Url) -> Option<&Resource> {
        self.resources.iter().find(|r| &r.url == url)
    }
}
