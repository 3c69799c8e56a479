//! Filesystem module.
//!
//! Provides:
//! - Destination path construction
//! - Filename derivation and sanitizing

pub mod naming;
pub mod paths;

pub use naming::{sanitize_filename, sanitize_path_component, url_basename};
pub use paths::{destination_path, ensure_dir, source_dir};
