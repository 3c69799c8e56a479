//! Download module.
//!
//! Drains each blog's queue with a bounded pool of concurrent downloads.

pub mod worker;

pub use worker::Downloader;
