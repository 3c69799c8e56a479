//! Process-wide counters and their report.

use std::sync::atomic::{AtomicU64, Ordering};

use console::style;

/// Independent counters shared by every crawl and download worker.
///
/// Reads taken while work is in flight are snapshots only.
#[derive(Debug, Default)]
pub struct Stats {
    already_exists: AtomicU64,
    total_found: AtomicU64,
    files_downloaded: AtomicU64,
    bytes_downloaded: AtomicU64,
}

impl Stats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a URL whose file is already on disk.
    pub fn record_existing(&self) {
        self.already_exists.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a URL queued for download.
    pub fn record_found(&self) {
        self.total_found.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a finished download of `bytes` bytes.
    pub fn record_download(&self, bytes: u64) {
        self.files_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn already_exists(&self) -> u64 {
        self.already_exists.load(Ordering::Relaxed)
    }

    pub fn total_found(&self) -> u64 {
        self.total_found.load(Ordering::Relaxed)
    }

    pub fn files_downloaded(&self) -> u64 {
        self.files_downloaded.load(Ordering::Relaxed)
    }

    pub fn bytes_downloaded(&self) -> u64 {
        self.bytes_downloaded.load(Ordering::Relaxed)
    }
}

/// Print the end-of-run summary.
pub fn print_summary(stats: &Stats, blogs: usize, failed: usize) {
    println!();
    println!("{}", style("═".repeat(50)).dim());
    println!("{}", style("Summary:").bold());
    println!("  Blogs crawled:  {}", blogs);
    if failed > 0 {
        println!("  Blogs failed:   {}", style(failed).red());
    }
    println!("  Found:          {}", style(stats.total_found()).green());
    println!("  Downloaded:     {}", style(stats.files_downloaded()).green());
    println!(
        "  Already exist:  {}",
        style(stats.already_exists()).yellow()
    );
    println!(
        "  Transferred:    {}",
        indicatif::HumanBytes(stats.bytes_downloaded())
    );
    println!("{}", style("═".repeat(50)).dim());
}
