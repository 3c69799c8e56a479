//! Persistence of the last seen post of every blog.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::api::PostId;
use crate::error::{Error, Result};

/// Storage for per-blog cursors, read at crawl start and written at the end.
#[async_trait]
pub trait CursorStore: Send + Sync {
    fn load(&self, source: &str) -> Option<PostId>;
    async fn save(&self, source: &str, id: PostId) -> Result<()>;
}

/// On-disk layout of the cursor file.
#[derive(Debug, Default, Serialize, Deserialize)]
struct CursorFile {
    #[serde(default)]
    cursors: BTreeMap<String, PostId>,
}

/// Cursor store backed by a TOML file with a `[cursors]` table.
///
/// The whole file is rewritten on every save. Saves are serialized so the
/// last write always carries every cursor saved before it.
#[derive(Debug)]
pub struct TomlCursorStore {
    path: PathBuf,
    cursors: Mutex<BTreeMap<String, PostId>>,
    writing: tokio::sync::Mutex<()>,
}

impl TomlCursorStore {
    /// Open the store, starting empty if the file does not exist yet.
    pub fn open(path: &Path) -> Result<Self> {
        let cursors = match fs::read_to_string(path) {
            Ok(content) => toml::from_str::<CursorFile>(&content)
                .map_err(|e| {
                    Error::Config(format!(
                        "Cursor file {} is corrupt: {}",
                        path.display(),
                        e
                    ))
                })?
                .cursors,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(Error::Io(e)),
        };

        tracing::debug!(
            "Loaded {} cursor(s) from {}",
            cursors.len(),
            path.display()
        );

        Ok(Self {
            path: path.to_path_buf(),
            cursors: Mutex::new(cursors),
            writing: tokio::sync::Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl CursorStore for TomlCursorStore {
    fn load(&self, source: &str) -> Option<PostId> {
        let cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
        cursors.get(source).copied()
    }

    async fn save(&self, source: &str, id: PostId) -> Result<()> {
        let _writing = self.writing.lock().await;

        let content = {
            let mut cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
            cursors.insert(source.to_string(), id);
            toml::to_string_pretty(&CursorFile {
                cursors: cursors.clone(),
            })?
        };

        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        tokio::fs::write(&tmp, content).await?;
        tokio::fs::rename(&tmp, &self.path).await?;

        Ok(())
    }
}

/// Cursor store that lives only as long as the process.
#[derive(Debug, Default)]
pub struct MemoryCursorStore {
    cursors: Mutex<BTreeMap<String, PostId>>,
}

impl MemoryCursorStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CursorStore for MemoryCursorStore {
    fn load(&self, source: &str) -> Option<PostId> {
        let cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
        cursors.get(source).copied()
    }

    async fn save(&self, source: &str, id: PostId) -> Result<()> {
        let mut cursors = self.cursors.lock().unwrap_or_else(|e| e.into_inner());
        cursors.insert(source.to_string(), id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TomlCursorStore::open(&dir.path().join("cursors.toml")).unwrap();
        assert_eq!(store.load("staff"), None);
    }

    #[tokio::test]
    async fn test_saved_cursor_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("cursors.toml");

        let store = TomlCursorStore::open(&path).unwrap();
        store.save("staff", PostId(105)).await.unwrap();
        store.save("art-blog", PostId(7)).await.unwrap();
        store.save("staff", PostId(110)).await.unwrap();

        let reopened = TomlCursorStore::open(&path).unwrap();
        assert_eq!(reopened.load("staff"), Some(PostId(110)));
        assert_eq!(reopened.load("art-blog"), Some(PostId(7)));
        assert!(!path.with_extension("toml.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursors.toml");
        fs::write(&path, "[cursors]\nstaff = \"not a number\"\n").unwrap();

        assert!(matches!(
            TomlCursorStore::open(&path),
            Err(Error::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_concurrent_saves_keep_every_cursor() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cursors.toml");
        let store = std::sync::Arc::new(TomlCursorStore::open(&path).unwrap());

        let handles: Vec<_> = (0..8u64)
            .map(|n| {
                let store = std::sync::Arc::clone(&store);
                tokio::spawn(async move { store.save(&format!("blog{}", n), PostId(n)).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let reopened = TomlCursorStore::open(&path).unwrap();
        for n in 0..8u64 {
            assert_eq!(reopened.load(&format!("blog{}", n)), Some(PostId(n)));
        }
    }

    #[tokio::test]
    async fn test_memory_store() {
        let store = MemoryCursorStore::new();
        assert_eq!(store.load("staff"), None);
        store.save("staff", PostId(3)).await.unwrap();
        assert_eq!(store.load("staff"), Some(PostId(3)));
    }
}
