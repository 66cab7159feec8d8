//! Persistence boundary for resolved crawl graphs
//!
//! The engine produces an in-memory [`CrawlGraph`]; persistence is a
//! collaborator behind the [`ResourceSaver`] trait. [`FsSaver`] is the
//! filesystem implementation: it writes every terminal resource with content
//! to its assigned local path under a root directory.

use std::path::PathBuf;

use async_trait::async_trait;
use thiserror::Error;

use crate::resource::CrawlGraph;

/// Errors surfaced by persistence implementations
#[derive(Debug, Error)]
pub enum SaveError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Result type alias for save operations
pub type SaveResult<T> = std::result::Result<T, SaveError>;

/// Summary of one save pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveReport {
    /// Resources written to disk.
    pub saved: usize,
    /// Resources without persistable content (failed or never fetched).
    pub skipped: usize,
}

/// Consumer of a fully resolved resource graph
#[async_trait]
pub trait ResourceSaver {
    async fn save(&self, graph: &CrawlGraph) -> SaveResult<SaveReport>;
}

/// Writes resources under a root directory using their assigned local paths
pub struct FsSaver {
    root: PathBuf,
}

impl FsSaver {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

#[async_trait]
impl ResourceSaver for FsSaver {
    async fn save(&self, graph: &CrawlGraph) -> SaveResult<SaveReport> {
        let mut report = SaveReport::default();

        for resource in graph.resources() {
            let content = if resource.state.is_terminal() {
                resource.content.as_ref()
            } else {
                None
            };
            let Some(content) = content else {
                report.skipped += 1;
                continue;
            };

            let path = self.root.join(&resource.filename);
            if let Some(parent) = path.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|source| SaveError::CreateDir {
                        path: parent.to_path_buf(),
                        source,
                    })?;
            }

            tokio::fs::write(&path, &content.body)
                .await
                .map_err(|source| SaveError::Write {
                    path: path.clone(),
                    source,
                })?;

            tracing::debug!("saved {} -> {}", resource.url, path.display());
            report.saved += 1;
        }

        Ok(report)
    }
}
