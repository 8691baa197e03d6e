// madj-core/src/sync.rs
//! Keeps the application files under the install root current.
//!
//! Each resource is fetched on its own; a failure falls back to a local copy and, failing
//! that, leaves whatever is already on disk in place. Only an unusable install root is fatal.

use std::fs;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use madj_common::error::{MadjError, Result};
use madj_common::model::SourceResource;
use madj_net::{verify_sha256, HttpFetcher};
use tracing::{debug, info, warn};

use crate::fsutil::atomic_write;

#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

#[async_trait]
impl SourceFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        self.fetch_bytes(url).await
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Fetched,
    FallbackCopied(PathBuf),
    /// Fetch failed, no fallback; the previous file is still there.
    KeptStale(String),
    /// Fetch failed, no fallback, and there was nothing there before either.
    Missing(String),
}

#[derive(Debug, Clone)]
pub struct SyncEntry {
    pub destination: PathBuf,
    pub status: SyncStatus,
}

#[derive(Debug, Clone, Default)]
pub struct SyncReport {
    pub entries: Vec<SyncEntry>,
}

impl SyncReport {
    pub fn degraded(&self) -> bool {
        self.entries
            .iter()
            .any(|e| matches!(e.status, SyncStatus::KeptStale(_) | SyncStatus::Missing(_)))
    }

    pub fn warnings(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter_map(|e| match &e.status {
                SyncStatus::KeptStale(reason) => Some(format!(
                    "{} not updated ({reason}); keeping the existing copy",
                    e.destination.display()
                )),
                SyncStatus::Missing(reason) => Some(format!(
                    "{} could not be fetched ({reason}) and no local copy exists",
                    e.destination.display()
                )),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&SyncStatus) -> bool) -> usize {
        self.entries.iter().filter(|e| pred(&e.status)).count()
    }
}

pub struct SourceSynchronizer<F> {
    fetcher: F,
    base_url: Option<String>,
    fallback_dir: Option<PathBuf>,
    offline: bool,
}

impl<F: SourceFetcher> SourceSynchronizer<F> {
    pub fn new(fetcher: F, base_url: Option<String>, fallback_dir: Option<PathBuf>) -> Self {
        Self {
            fetcher,
            base_url,
            fallback_dir,
            offline: false,
        }
    }

    /// Skip the network entirely; every resource goes straight to the fallback lookup.
    pub fn offline(mut self, offline: bool) -> Self {
        self.offline = offline;
        self
    }

    pub async fn sync(&self, root: &Path, resources: &[SourceResource]) -> Result<SyncReport> {
        fs::create_dir_all(root).map_err(|e| {
            MadjError::Generic(format!(
                "Failed to create install root {}: {e}",
                root.display()
            ))
        })?;

        let mut report = SyncReport::default();
        for resource in resources {
            let destination = root.join(&resource.destination);
            let status = self.sync_one(resource, &destination).await;
            report.entries.push(SyncEntry {
                destination,
                status,
            });
        }

        info!(
            "Synchronized {} file(s): {} fetched, {} from fallback, {} not updated",
            report.entries.len(),
            report.count(|s| *s == SyncStatus::Fetched),
            report.count(|s| matches!(s, SyncStatus::FallbackCopied(_))),
            report.count(|s| matches!(s, SyncStatus::KeptStale(_) | SyncStatus::Missing(_))),
        );
        Ok(report)
    }

    /// Never fails: local write errors are classified like fetch errors so the remaining
    /// resources still get their turn.
    async fn sync_one(&self, resource: &SourceResource, destination: &Path) -> SyncStatus {
        let failure = match self.fetch_remote(resource).await {
            Ok(bytes) => match write_destination(destination, &bytes) {
                Ok(()) => {
                    debug!("Updated {} from {}", destination.display(), resource.remote);
                    return SyncStatus::Fetched;
                }
                Err(e) => {
                    warn!("Could not write {}: {}", destination.display(), e);
                    e
                }
            },
            Err(e) => {
                warn!("Could not fetch {}: {}", resource.remote, e);
                e
            }
        };

        if let Some(fallback) = self.find_fallback(resource, destination) {
            match fs::read(&fallback)
                .map_err(MadjError::from)
                .and_then(|bytes| write_destination(destination, &bytes))
            {
                Ok(()) => {
                    info!(
                        "Using local copy {} for {}",
                        fallback.display(),
                        destination.display()
                    );
                    return SyncStatus::FallbackCopied(fallback);
                }
                Err(e) => warn!(
                    "Could not copy {} to {}: {}",
                    fallback.display(),
                    destination.display(),
                    e
                ),
            }
        }

        let reason = failure.to_string();
        if destination.is_file() {
            warn!(
                "No usable fallback for {}; leaving the existing file in place",
                destination.display()
            );
            SyncStatus::KeptStale(reason)
        } else {
            warn!(
                "No usable fallback for {}; the file is missing",
                destination.display()
            );
            SyncStatus::Missing(reason)
        }
    }

    async fn fetch_remote(&self, resource: &SourceResource) -> Result<Vec<u8>> {
        if self.offline {
            return Err(MadjError::Generic("offline mode".to_string()));
        }
        let url = resource
            .resolve_url(self.base_url.as_deref())
            .ok_or_else(|| MadjError::Config("no source URL configured".to_string()))?;
        let bytes = self.fetcher.fetch(&url).await?;
        if let Some(expected) = &resource.sha256 {
            verify_sha256(&bytes, expected, &resource.remote)?;
        }
        Ok(bytes)
    }

    /// `<fallback>/<destination>` first, then `<fallback>/<file name>`.
    fn find_fallback(&self, resource: &SourceResource, destination: &Path) -> Option<PathBuf> {
        let dir = self.fallback_dir.as_ref()?;
        let mut candidates = vec![dir.join(&resource.destination)];
        if let Some(name) = resource.destination.file_name() {
            candidates.push(dir.join(name));
        }
        candidates
            .into_iter()
            .filter(|c| c.is_file())
            .find(|c| !same_file(c, destination))
    }
}

fn write_destination(destination: &Path, bytes: &[u8]) -> Result<()> {
    if let Some(parent) = destination.parent() {
        fs::create_dir_all(parent)?;
    }
    atomic_write(destination, bytes)
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
