//! Download task representation.

use std::fmt;

use chrono::{DateTime, Utc};
use indicatif::ProgressBar;

use crate::error::Result;
use crate::fs::url_basename;

/// One media file to download.
///
/// Created by the queue filter and consumed exactly once by a download
/// worker.
#[derive(Clone)]
pub struct DownloadTask {
    /// Blog the media was found on.
    pub source: String,

    /// Direct media URL.
    pub url: String,

    /// Publication time of the post, in seconds.
    pub unix_timestamp: i64,

    /// Progress bar of the blog; its length already counts this task.
    pub progress: ProgressBar,
}

impl DownloadTask {
    /// Name of the file on disk.
    pub fn filename(&self) -> Result<String> {
        url_basename(&self.url)
    }

    /// Post time, if the timestamp is representable.
    pub fn posted_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.unix_timestamp, 0)
    }
}

impl fmt::Display for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let date = self
            .posted_at()
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| "unknown date".to_string());
        let name = self.filename().unwrap_or_else(|_| self.url.clone());

        write!(f, "{} - {} - {}", self.source, date, name)
    }
}

impl fmt::Debug for DownloadTask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadTask")
            .field("source", &self.source)
            .field("url", &self.url)
            .field("unix_timestamp", &self.unix_timestamp)
            .finish_non_exhaustive()
    }
}
