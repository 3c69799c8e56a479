//! Media module for URL extraction and download tasks.

pub mod item;
pub mod parser;

pub use item::DownloadTask;
pub use parser::{default_video_rules, ExtractOptions, Extractor, VideoRule};
