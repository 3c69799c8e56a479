//! Paging loop and per-page extraction for one blog.

use std::sync::Arc;

use indicatif::ProgressBar;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::api::{FetchedPage, PageFetcher, Post, PostId};
use crate::config::BlogConfig;
use crate::crawl::cursor::CursorState;
use crate::crawl::rate_limit::RateLimiter;
use crate::crawl::signal::StopSignal;
use crate::crawl::store::CursorStore;
use crate::dedup::QueueFilter;
use crate::error::{Error, Result};
use crate::media::Extractor;

/// Default number of consecutive malformed pages tolerated before the
/// crawl treats pagination as ended.
pub const DEFAULT_MAX_MALFORMED_PAGES: u32 = 3;

/// One blog to crawl.
#[derive(Debug, Clone)]
pub struct Source {
    pub name: String,
    pub tag: Option<String>,
    /// Highest post seen by the previous crawl of this source.
    pub last_cursor: Option<PostId>,
    pub progress: ProgressBar,
}

impl Source {
    /// Build a source from its configuration, reading the stored cursor.
    pub fn new(blog: &BlogConfig, store: &dyn CursorStore, progress: ProgressBar) -> Self {
        let key = cursor_key(&blog.name, blog.tag.as_deref());
        Self {
            name: blog.name.clone(),
            tag: blog.tag.clone(),
            last_cursor: store.load(&key),
            progress,
        }
    }

    /// Key under which the cursor of this source is stored.
    ///
    /// A tagged crawl only sees part of the blog, so it keeps its own cursor.
    pub fn key(&self) -> String {
        cursor_key(&self.name, self.tag.as_deref())
    }
}

fn cursor_key(name: &str, tag: Option<&str>) -> String {
    match tag {
        Some(tag) => format!("{}:{}", name, tag),
        None => name.to_string(),
    }
}

/// Phases of a crawl, reported at debug level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlPhase {
    Paging,
    AwaitRateLimit,
    Extracting,
    Draining,
    Done,
}

/// Outcome of a crawl that did not fail.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlReport {
    /// Fetches that returned, including empty and malformed pages.
    pub pages_fetched: u32,
    /// Highest post identifier seen.
    pub highest: Option<PostId>,
    /// The crawl reached a post already covered by the stored cursor.
    pub stopped_early: bool,
    /// The process shutdown interrupted the crawl.
    pub interrupted: bool,
    /// The highest identifier was written to the cursor store.
    pub persisted: bool,
}

/// Drives the crawl of a blog: rate-limited paging, concurrent per-page
/// extraction, and the cursor bookkeeping for incremental runs.
pub struct Crawler {
    fetcher: Arc<dyn PageFetcher>,
    extractor: Arc<Extractor>,
    limiter: Arc<RateLimiter>,
    store: Arc<dyn CursorStore>,
    update_mode: bool,
    max_malformed_pages: u32,
}

/// State shared by the extraction tasks of one crawl.
struct PageContext {
    source: Source,
    extractor: Arc<Extractor>,
    filter: QueueFilter,
    cursor: CursorState,
    stop: StopSignal,
    update_mode: bool,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn PageFetcher>,
        extractor: Arc<Extractor>,
        limiter: Arc<RateLimiter>,
        store: Arc<dyn CursorStore>,
    ) -> Self {
        Self {
            fetcher,
            extractor,
            limiter,
            store,
            update_mode: false,
            max_malformed_pages: DEFAULT_MAX_MALFORMED_PAGES,
        }
    }

    /// Stop paging once a post covered by the stored cursor is reached.
    pub fn update_mode(mut self, enabled: bool) -> Self {
        self.update_mode = enabled;
        self
    }

    pub fn max_malformed_pages(mut self, limit: u32) -> Self {
        self.max_malformed_pages = limit.max(1);
        self
    }

    /// Crawl `source` until its pages run out, the incremental stop fires,
    /// or `shutdown` is cancelled.
    ///
    /// Every discovered download goes through `filter`. The filter is
    /// dropped once all extraction tasks have finished, which closes the
    /// download queue.
    pub async fn crawl(
        &self,
        source: Source,
        filter: QueueFilter,
        shutdown: &CancellationToken,
    ) -> Result<CrawlReport> {
        let key = source.key();
        let ctx = Arc::new(PageContext {
            stop: StopSignal::new(shutdown),
            cursor: CursorState::new(),
            extractor: Arc::clone(&self.extractor),
            filter,
            update_mode: self.update_mode,
            source,
        });

        tracing::info!(
            "Crawling {} (last cursor: {})",
            key,
            ctx.source
                .last_cursor
                .map_or_else(|| "none".to_string(), |id| id.to_string())
        );

        let mut tasks = JoinSet::new();
        let mut report = CrawlReport::default();
        let mut page = 1u32;
        let mut malformed_run = 0u32;

        loop {
            if ctx.stop.is_triggered() {
                break;
            }

            phase(&key, CrawlPhase::AwaitRateLimit);
            tokio::select! {
                biased;
                _ = ctx.stop.wait() => break,
                _ = self.limiter.acquire() => {}
            }

            phase(&key, CrawlPhase::Paging);
            ctx.source.progress.set_message(format!("page {}", page));
            let fetched = tokio::select! {
                biased;
                _ = ctx.stop.wait() => break,
                fetched = self.fetcher.fetch_page(&ctx.source.name, ctx.source.tag.as_deref(), page) => fetched,
            };
            report.pages_fetched += 1;

            match fetched {
                FetchedPage::Malformed => {
                    malformed_run += 1;
                    if malformed_run >= self.max_malformed_pages {
                        tracing::warn!(
                            "{} malformed pages in a row for {}, treating page {} as the end",
                            malformed_run,
                            key,
                            page
                        );
                        break;
                    }
                    tracing::warn!("Skipping malformed page {} of {}", page, key);
                }
                FetchedPage::Posts(posts) if posts.is_empty() => {
                    tracing::debug!("Page {} of {} is empty, no more pages", page, key);
                    break;
                }
                FetchedPage::Posts(posts) => {
                    malformed_run = 0;
                    phase(&key, CrawlPhase::Extracting);
                    tracing::debug!("Page {} of {}: {} posts", page, key, posts.len());
                    tasks.spawn(extract_page(Arc::clone(&ctx), page, posts));
                }
            }

            page += 1;
        }

        phase(&key, CrawlPhase::Draining);
        let mut failure = None;
        while let Some(joined) = tasks.join_next().await {
            let outcome = joined.map_err(Error::from).and_then(|r| r);
            if let Err(e) = outcome {
                failure.get_or_insert(e);
            }
        }

        report.highest = ctx.cursor.highest();
        report.stopped_early = ctx.stop.was_triggered_locally();
        report.interrupted = shutdown.is_cancelled();

        // Last reference to the filter goes here, closing the queue.
        drop(ctx);

        let outcome = self.finish(&key, report, failure).await;
        phase(&key, CrawlPhase::Done);
        outcome
    }

    /// Persist the cursor of a crawl that ran to completion.
    async fn finish(
        &self,
        key: &str,
        mut report: CrawlReport,
        failure: Option<Error>,
    ) -> Result<CrawlReport> {
        if report.interrupted {
            if let Some(e) = failure {
                tracing::debug!("Crawl of {} interrupted with: {}", key, e);
            }
            tracing::info!("Crawl of {} interrupted, cursor not saved", key);
            return Ok(report);
        }

        if let Some(e) = failure {
            tracing::error!("Crawl of {} failed: {}", key, e);
            return Err(e);
        }

        if let Some(highest) = report.highest {
            self.store.save(key, highest).await?;
            report.persisted = true;
        }

        tracing::info!(
            "Finished crawling {} after {} page(s)",
            key,
            report.pages_fetched
        );
        Ok(report)
    }
}

fn phase(key: &str, phase: CrawlPhase) {
    tracing::debug!("{}: {:?}", key, phase);
}

/// Extract and queue the media of one page, in post order.
///
/// A failure fires the stop signal so no further pages are requested.
async fn extract_page(ctx: Arc<PageContext>, page: u32, posts: Vec<Post>) -> Result<()> {
    let result = process_posts(&ctx, page, posts).await;
    if result.is_err() {
        ctx.stop.trigger();
    }
    result
}

async fn process_posts(ctx: &PageContext, page: u32, posts: Vec<Post>) -> Result<()> {
    let source = &ctx.source;

    for post in posts {
        let id = match post.post_id() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!("Skipping post on page {} of {}: {}", page, source.name, e);
                continue;
            }
        };

        ctx.cursor.observe(id);

        if ctx.update_mode && source.last_cursor.is_some_and(|last| id <= last) {
            if ctx.stop.trigger() {
                tracing::info!(
                    "Reached already downloaded post {} of {} on page {}",
                    id,
                    source.name,
                    page
                );
            }
            break;
        }

        for url in ctx.extractor.extract(&post).await? {
            ctx.filter
                .offer(&source.name, url, post.unix_timestamp, &source.progress)
                .await?;
        }
    }

    Ok(())
}
