//! Existing-file filter in front of the download queue.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::sync::mpsc;

use crate::error::{Error, Result};
use crate::fs::destination_path;
use crate::media::DownloadTask;
use crate::output::Stats;

/// Result of offering a URL to the filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A download task was queued.
    Queued,
    /// The destination file already exists.
    AlreadyExists,
    /// No destination filename could be derived from the URL.
    Unusable,
}

/// Queues media URLs whose destination file does not exist yet.
///
/// The check is a plain existence probe; existing files are never
/// re-verified.
#[derive(Clone)]
pub struct QueueFilter {
    root: PathBuf,
    stats: Arc<Stats>,
    sender: mpsc::Sender<DownloadTask>,
}

impl QueueFilter {
    pub fn new(root: PathBuf, stats: Arc<Stats>, sender: mpsc::Sender<DownloadTask>) -> Self {
        Self {
            root,
            stats,
            sender,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Queue `url` for `source` unless it was already downloaded.
    ///
    /// The blog's expected-work counter is raised before the task is sent,
    /// so the bar can briefly count tasks still waiting for queue space.
    pub async fn offer(
        &self,
        source: &str,
        url: String,
        unix_timestamp: i64,
        progress: &ProgressBar,
    ) -> Result<Admission> {
        let path = match destination_path(&self.root, source, &url) {
            Ok(path) => path,
            Err(e) => {
                tracing::warn!("Skipping {}: {}", url, e);
                return Ok(Admission::Unusable);
            }
        };

        if path.exists() {
            self.stats.record_existing();
            tracing::debug!("Skipping existing file: {}", path.display());
            return Ok(Admission::AlreadyExists);
        }

        progress.inc_length(1);
        self.stats.record_found();

        let task = DownloadTask {
            source: source.to_string(),
            url,
            unix_timestamp,
            progress: progress.clone(),
        };

        self.sender
            .send(task)
            .await
            .map_err(|_| Error::QueueClosed(source.to_string()))?;

        Ok(Admission::Queued)
    }
}
