//! Deduplication module.
//!
//! Provides the existing-file filter that decides which discovered media
//! URLs reach the download queue.

pub mod filter;

pub use filter::{Admission, QueueFilter};
