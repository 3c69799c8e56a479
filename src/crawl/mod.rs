//! Crawl module.
//!
//! Drives the paging of each blog and the concurrent extraction of its
//! pages, together with the pieces shared between them:
//! - Stop signal for incremental runs and shutdown
//! - Highest-seen cursor and its persistence
//! - Process-wide request rate limiting

pub mod coordinator;
pub mod cursor;
pub mod rate_limit;
pub mod signal;
pub mod store;

pub use coordinator::{CrawlPhase, CrawlReport, Crawler, Source, DEFAULT_MAX_MALFORMED_PAGES};
pub use cursor::CursorState;
pub use rate_limit::RateLimiter;
pub use signal::StopSignal;
pub use store::{CursorStore, MemoryCursorStore, TomlCursorStore};
