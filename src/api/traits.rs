//! Seams between the crawler and the remote services.

use async_trait::async_trait;

use crate::api::types::Post;
use crate::error::Result;

/// Outcome of fetching one page of a blog.
#[derive(Debug)]
pub enum FetchedPage {
    /// Posts in page order. An empty list marks the end of pagination.
    Posts(Vec<Post>),
    /// The body could not be deserialized.
    Malformed,
}

/// Retrieves pages of a blog.
///
/// Implementations retry transport failures themselves and only return
/// once the page has been received.
#[async_trait]
pub trait PageFetcher: Send + Sync {
    async fn fetch_page(&self, blog: &str, tag: Option<&str>, page: u32) -> FetchedPage;
}

/// Resolves short-link media references to direct URLs.
#[async_trait]
pub trait MediaResolver: Send + Sync {
    /// Returns `Ok(None)` when the referenced media does not exist.
    async fn resolve(&self, slug: &str) -> Result<Option<String>>;
}
