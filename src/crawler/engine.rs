//! Crawl engine: breadth-first resolution of the resource graph
//!
//! The engine owns the whole crawl run:
//! - builds the initial resource set from the seed descriptors
//! - fetches each frontier wave concurrently, bounded by the configured
//!   concurrency limit, while preserving discovery order
//! - runs the source pipeline over eligible fetched content
//! - claims discovered URLs in the visited set (first claim wins) so cyclic
//!   link graphs terminate and shared assets resolve to a single resource
//! - assigns local filenames at creation, in discovery order
//! - absorbs per-resource fetch and extraction failures without aborting
//!   sibling resources
//! - honors cooperative cancellation, abandoning in-flight fetches

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::stream::{self, StreamExt};
use tokio::sync::Notify;
use url::Url;

use crate::config::CrawlConfig;
use crate::crawler::client::{FetchedResponse, HttpClient, RequestClient};
use crate::naming::FilenameAssigner;
use crate::pipeline::{extract_references, resolve_reference};
use crate::resource::{CrawlGraph, FetchedBody, ResourceId, ResourceState};
use crate::{FetchError, SitegrabError};

/// Cooperative cancellation handle for a running crawl
///
/// Cloneable; any clone may request cancellation. The engine stops dequeuing
/// pending resources, abandons in-flight fetches, and returns the partially
/// resolved graph.
#[derive(Clone, Default)]
pub struct CancelHandle {
    inner: Arc<CancelState>,
}

#[derive(Default)]
struct CancelState {
    flag: AtomicBool,
    notify: Notify,
}

impl CancelHandle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation of the crawl this handle belongs to.
    pub fn cancel(&self) {
        self.inner.flag.store(true, Ordering::SeqCst);
        self.inner.notify.notify_waiters();
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.flag.load(Ordering::SeqCst)
    }

    /// Resolves once cancellation has been requested.
    pub async fn cancelled(&self) {
        loop {
            let notified = self.inner.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_cancelled() {
                return;
            }
            notified.await;
        }
    }
}

/// Result of a completed or cancelled crawl
#[derive(Debug)]
pub struct CrawlOutcome {
    pub graph: CrawlGraph,
    /// True when the crawl stopped early due to cancellation. The graph is a
    /// well-defined partial result: no resource is left mid-fetch.
    pub cancelled: bool,
}

/// Orchestrates fetching, extraction, naming, and graph assembly
pub struct CrawlEngine<C: RequestClient> {
    config: Arc<CrawlConfig>,
    client: Arc<C>,
    cancel: CancelHandle,
}

impl CrawlEngine<HttpClient> {
    /// Builds an engine with the reqwest-backed client bound to the
    /// configuration's request settings.
    pub fn new(config: CrawlConfig) -> Result<Self, SitegrabError> {
        let client = HttpClient::new(&config.request)?;
        Ok(Self::with_client(config, client))
    }
}

impl<C: RequestClient> CrawlEngine<C> {
    /// Builds an engine around a caller-supplied request capability.
    pub fn with_client(config: CrawlConfig, client: C) -> Self {
        Self {
            config: Arc::new(config),
            client: Arc::new(client),
            cancel: CancelHandle::new(),
        }
    }

    /// Handle for cancelling this crawl from another task.
    pub fn cancel_handle(&self) -> CancelHandle {
        self.cancel.clone()
    }

    /// Runs the crawl until the frontier drains or cancellation is requested.
    pub async fn run(self) -> CrawlOutcome {
        let run = CrawlRun {
            assigner: FilenameAssigner::from_config(&self.config),
            config: self.config,
            client: self.client,
            cancel: self.cancel,
            graph: CrawlGraph::default(),
            visited: HashMap::new(),
            frontier: VecDeque::new(),
        };
        run.execute().await
    }
}

/// Mutable state of one crawl execution
struct CrawlRun<C: RequestClient> {
    config: Arc<CrawlConfig>,
    client: Arc<C>,
    cancel: CancelHandle,
    graph: CrawlGraph,
    /// Normalized URL -> claimed resource. First claim wins; later
    /// discoveries reuse the claimed resource as a child link.
    visited: HashMap<String, ResourceId>,
    assigner: FilenameAssigner,
    frontier: VecDeque<ResourceId>,
}

impl<C: RequestClient> CrawlRun<C> {
    async fn execute(mut self) -> CrawlOutcome {
        self.seed();
        tracing::info!(
            "starting crawl: {} seed(s), concurrency {}",
            self.frontier.len(),
            self.config.concurrency
        );

        let mut cancelled = false;
        while !self.frontier.is_empty() && !cancelled {
            if self.cancel.is_cancelled() {
                cancelled = true;
                break;
            }

            let wave: Vec<(ResourceId, Url)> = self
                .frontier
                .drain(..)
                .map(|id| (id, self.graph.get(id).url.clone()))
                .collect();
            for (id, _) in &wave {
                self.graph.get_mut(*id).state = ResourceState::Fetching;
            }

            tracing::debug!("fetching wave of {} resource(s)", wave.len());
            let results = self.fetch_wave(wave).await;

            for (id, outcome) in results {
                match outcome {
                    // Fetch abandoned by cancellation before completing.
                    None => {
                        self.graph.get_mut(id).state = ResourceState::Pending;
                        cancelled = true;
                    }
                    Some(Err(error)) => {
                        tracing::warn!("fetch failed for {}: {}", self.graph.get(id).url, error);
                        let resource = self.graph.get_mut(id);
                        resource.error = Some(error);
                        resource.state = ResourceState::Failed;
                    }
                    Some(Ok(response)) => {
                        self.attach(id, response);
                        if self.cancel.is_cancelled() {
                            // Keep the fetched content but stop discovering.
                            cancelled = true;
                        } else {
                            self.expand(id);
                        }
                    }
                }
            }
        }

        cancelled = cancelled || self.cancel.is_cancelled();
        tracing::info!(
            "crawl {}: {} resource(s), {} fetched, {} failed",
            if cancelled { "cancelled" } else { "finished" },
            self.graph.len(),
            self.graph.count_in_state(ResourceState::Resolved)
                + self.graph.count_in_state(ResourceState::Fetched),
            self.graph.count_in_state(ResourceState::Failed)
        );

        CrawlOutcome {
            graph: self.graph,
            cancelled,
        }
    }

    /// Creates one resource per seed descriptor, in input order. Duplicate
    /// seed URLs collapse onto the first occurrence.
    fn seed(&mut self) {
        let seeds = self.config.urls.clone();
        for seed in seeds {
            let key = visited_key(&seed.url);
            if self.visited.contains_key(&key) {
                continue;
            }
            let filename = self.assigner.assign(&seed.url, seed.filename.as_deref());
            let id = self.graph.insert(seed.url, filename, 0, true);
            self.visited.insert(key, id);
            self.frontier.push_back(id);
        }
    }

    /// Fetches a wave concurrently, bounded by the concurrency limit, with
    /// results in wave order. Each fetch races cancellation; an abandoned
    /// fetch yields `None`.
    async fn fetch_wave(
        &self,
        wave: Vec<(ResourceId, Url)>,
    ) -> Vec<(ResourceId, Option<Result<FetchedResponse, FetchError>>)> {
        stream::iter(wave.into_iter().map(|(id, url)| {
            let client = Arc::clone(&self.client);
            let cancel = self.cancel.clone();
            async move {
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => (id, None),
                    result = client.fetch(&url) => (id, Some(result)),
                }
            }
        }))
        .buffered(self.config.concurrency)
        .collect()
        .await
    }

    fn attach(&mut self, id: ResourceId, response: FetchedResponse) {
        let content_type = response.content_type().to_string();
        let resource = self.graph.get_mut(id);
        resource.content = Some(FetchedBody {
            body: response.body,
            status: response.status,
            content_type,
        });
        resource.state = ResourceState::Fetched;
    }

    /// Runs the pipeline over a fetched resource and links or enqueues every
    /// discovered child. Non-HTML resources stay `Fetched`.
    fn expand(&mut self, id: ResourceId) {
        let (depth, parent_url, html) = {
            let resource = self.graph.get(id);
            let Some(content) = &resource.content else {
                return;
            };
            if !content.is_html() {
                return;
            }
            (resource.depth, resource.url.clone(), content.text().into_owned())
        };

        let refs = match extract_references(&html, &self.config.sources) {
            Ok(refs) => refs,
            Err(error) => {
                tracing::warn!("extraction failed for {}: {}", parent_url, error);
                self.graph.get_mut(id).state = ResourceState::Resolved;
                return;
            }
        };

        let depth_exhausted = self
            .config
            .max_depth
            .is_some_and(|max| depth >= max);

        let mut children: Vec<ResourceId> = Vec::new();
        for reference in refs {
            if depth_exhausted && self.config.is_link_rule(reference.rule_index) {
                tracing::trace!(
                    "depth limit reached, not following '{}' from {}",
                    reference.raw,
                    parent_url
                );
                continue;
            }

            let Some(child_url) = resolve_reference(&parent_url, &reference.raw) else {
                continue;
            };

            let child_id = self.claim(child_url, depth + 1);
            if !children.contains(&child_id) {
                children.push(child_id);
            }
        }

        let resource = self.graph.get_mut(id);
        resource.children = children;
        resource.state = ResourceState::Resolved;
    }

    /// Claims `url` in the visited set. The first claim creates a pending
    /// resource, assigns its filename, and enqueues it; later claims return
    /// the existing resource without re-enqueueing.
    fn claim(&mut self, url: Url, depth: u32) -> ResourceId {
        let key = visited_key(&url);
        if let Some(&existing) = self.visited.get(&key) {
            return existing;
        }

        let filename = self.assigner.assign(&url, None);
        let id = self.graph.insert(url, filename, depth, false);
        self.visited.insert(key, id);
        self.frontier.push_back(id);
        id
    }
}

/// Key for the visited set: the absolute URL without its fragment.
fn visited_key(url: &Url) -> String {
    let mut key = url.clone();
    key.set_fragment(None);
    key.into()
}
