//! Path and directory management.

use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::fs::naming::{sanitize_path_component, url_basename};

/// Get the download folder of a blog.
pub fn source_dir(root: &Path, source: &str) -> Result<PathBuf> {
    Ok(root.join(sanitize_path_component(source)?))
}

/// Get the destination of a media URL: `<root>/<source>/<basename>`.
pub fn destination_path(root: &Path, source: &str, url: &str) -> Result<PathBuf> {
    Ok(source_dir(root, source)?.join(url_basename(url)?))
}

/// Ensure a directory exists, creating it if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        std::fs::create_dir_all(path)?;
    }
    Ok(())
}
