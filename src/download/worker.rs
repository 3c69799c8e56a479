//! Download workers draining a blog's queue.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use futures::{stream, StreamExt, TryStreamExt};
use reqwest::StatusCode;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::api::client::is_retryable_status;
use crate::api::TumblrApi;
use crate::error::{Error, Result};
use crate::fs::destination_path;
use crate::media::DownloadTask;
use crate::output::Stats;

/// Outcome of one download attempt.
enum Attempt {
    /// Body written to the temporary file.
    Done(u64),
    /// Transient failure; try again.
    Retry(String),
    /// The server refused the file for good.
    Rejected(StatusCode),
}

/// Downloads queued media files with bounded concurrency.
pub struct Downloader {
    api: Arc<TumblrApi>,
    root: PathBuf,
    stats: Arc<Stats>,
    workers: usize,
}

impl Downloader {
    pub fn new(api: Arc<TumblrApi>, root: PathBuf, stats: Arc<Stats>, workers: usize) -> Self {
        Self {
            api,
            root,
            stats,
            workers: workers.max(1),
        }
    }

    /// Download every task from `queue` until it closes.
    ///
    /// Returns the number of files written. A local write failure stops
    /// the run; `shutdown` abandons it with [`Error::Interrupted`].
    pub async fn run(
        &self,
        mut queue: mpsc::Receiver<DownloadTask>,
        shutdown: &CancellationToken,
    ) -> Result<u64> {
        let written = Arc::new(std::sync::atomic::AtomicU64::new(0));

        let tasks = stream::poll_fn(move |cx| queue.poll_recv(cx)).map(Ok::<_, Error>);
        let drain = tasks.try_for_each_concurrent(self.workers, |task| {
            let written = Arc::clone(&written);
            async move {
                if self.download(&task).await? {
                    written.fetch_add(1, std::sync::atomic::Ordering::Relaxed);
                }
                Ok::<(), Error>(())
            }
        });

        tokio::select! {
            _ = shutdown.cancelled() => Err(Error::Interrupted),
            result = drain => {
                result?;
                Ok(written.load(std::sync::atomic::Ordering::Relaxed))
            }
        }
    }

    /// Download one task. Returns whether a file was written.
    async fn download(&self, task: &DownloadTask) -> Result<bool> {
        let dest = destination_path(&self.root, &task.source, &task.url)?;
        if let Some(dir) = dest.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        let tmp = temp_path(&dest);

        let mut attempt_no: u32 = 0;
        let bytes = loop {
            attempt_no += 1;

            match self.attempt(&task.url, &tmp).await {
                Ok(Attempt::Done(bytes)) => break bytes,
                Ok(Attempt::Retry(reason)) => {
                    tracing::warn!(
                        "Download of {} failed (attempt {}): {}",
                        task.url,
                        attempt_no,
                        reason
                    );
                    self.api.pause().await;
                }
                Ok(Attempt::Rejected(status)) => {
                    tracing::warn!("Skipping {}: HTTP {}", task, status);
                    discard(&tmp).await;
                    task.progress.inc(1);
                    return Ok(false);
                }
                Err(e) => {
                    discard(&tmp).await;
                    return Err(Error::Download(format!(
                        "Failed to write {}: {}",
                        dest.display(),
                        e
                    )));
                }
            }
        };

        tokio::fs::rename(&tmp, &dest).await?;
        set_modified(dest, task.unix_timestamp).await;

        tracing::debug!("Downloaded {} ({} bytes)", task, bytes);
        task.progress.inc(1);
        self.stats.record_download(bytes);
        Ok(true)
    }

    /// Stream one response into `tmp`. Only local I/O failures are errors.
    async fn attempt(&self, url: &str, tmp: &Path) -> Result<Attempt> {
        let response = match self.api.download_file(url).await {
            Ok(response) => response,
            Err(e) => return Ok(Attempt::Retry(e.to_string())),
        };

        let status = response.status();
        if is_retryable_status(status) {
            return Ok(Attempt::Retry(format!("HTTP {}", status)));
        }
        if !status.is_success() {
            return Ok(Attempt::Rejected(status));
        }

        let mut file = File::create(tmp).await?;
        let mut body = response.bytes_stream();
        let mut written: u64 = 0;

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return Ok(Attempt::Retry(format!("stream error: {}", e))),
            };
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        file.flush().await?;
        Ok(Attempt::Done(written))
    }
}

/// Hidden sibling of `dest` that receives the body before the rename.
fn temp_path(dest: &Path) -> PathBuf {
    let name = dest
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    dest.with_file_name(format!(".{}.part-{}", name, Uuid::new_v4()))
}

async fn discard(tmp: &Path) {
    if let Err(e) = tokio::fs::remove_file(tmp).await {
        if e.kind() != std::io::ErrorKind::NotFound {
            tracing::debug!("Could not remove {}: {}", tmp.display(), e);
        }
    }
}

/// Stamp the file with the post time.
async fn set_modified(path: PathBuf, unix_timestamp: i64) {
    let Ok(secs) = u64::try_from(unix_timestamp) else {
        return;
    };
    let time = SystemTime::UNIX_EPOCH + Duration::from_secs(secs);

    let stamped = tokio::task::spawn_blocking(move || {
        std::fs::File::options()
            .write(true)
            .open(&path)
            .and_then(|file| file.set_modified(time))
            .map_err(|e| format!("{}: {}", path.display(), e))
    })
    .await;

    match stamped {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!("Could not set modification time of {}", e),
        Err(e) => tracing::warn!("Modification time task failed: {}", e),
    }
}
