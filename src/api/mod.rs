//! Remote API module.
//!
//! This module provides:
//! - HTTP client for the Tumblr read API and the Gfycat lookup
//! - The fetcher and resolver seams used by the crawler
//! - API response types

pub mod client;
pub mod traits;
pub mod types;

pub use client::{TumblrApi, PAGE_SIZE};
pub use traits::{FetchedPage, MediaResolver, PageFetcher};
pub use types::*;
