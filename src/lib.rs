//! Tumblr Downloader - download photos and videos from Tumblr blogs
//!
//! This library crawls the paginated read API of one or more blogs, extracts
//! the media URLs of every post and hands new files to a bounded download
//! queue.
//!
//! # Features
//!
//! - Photo posts, galleries and inline images in text and answers
//! - Tumblr-hosted videos and Gfycat links in captions
//! - Skipping of files already on disk
//! - Update mode that stops at the last post seen by a previous run
//! - Process-wide request rate limiting and unlimited transport retries
//!
//! # Example
//!
//! ```no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use tumblr_downloader::{Config, TumblrApi};
//!
//! # async fn run() -> tumblr_downloader::Result<()> {
//! let config = Config::load(Path::new("config.toml"))?;
//! let api = Arc::new(TumblrApi::new(&config.api, config.retry_delay())?);
//!
//! // ... build a Crawler and a Downloader per blog
//! # Ok(())
//! # }
//! ```

pub mod api;
pub mod cli;
pub mod config;
pub mod crawl;
pub mod dedup;
pub mod download;
pub mod error;
pub mod fs;
pub mod media;
pub mod output;

// Re-exports for convenience
pub use api::{PostId, TumblrApi};
pub use config::Config;
pub use crawl::{CrawlReport, Crawler, CursorStore, RateLimiter, Source, TomlCursorStore};
pub use dedup::QueueFilter;
pub use download::Downloader;
pub use error::{Error, Result};
pub use media::{DownloadTask, ExtractOptions, Extractor};
