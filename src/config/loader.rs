//! Configuration structures and loading logic.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Main configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Blogs to crawl.
    #[serde(default)]
    pub blogs: Vec<BlogConfig>,

    #[serde(default)]
    pub options: OptionsConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub state: StateConfig,
}

/// A blog to crawl, optionally restricted to one tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlogConfig {
    pub name: String,

    #[serde(default)]
    pub tag: Option<String>,
}

impl BlogConfig {
    /// Parse a command-line target of the form `name` or `name:tag`.
    pub fn parse(input: &str) -> Self {
        let input = input.trim();
        match input.split_once(':') {
            Some((name, tag)) if !tag.trim().is_empty() => Self {
                name: name.trim().to_string(),
                tag: Some(tag.trim().to_string()),
            },
            Some((name, _)) => Self {
                name: name.trim().to_string(),
                tag: None,
            },
            None => Self {
                name: input.to_string(),
                tag: None,
            },
        }
    }
}

/// Crawl and download options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptionsConfig {
    /// Base directory for downloads.
    #[serde(default)]
    pub download_directory: Option<PathBuf>,

    /// Stop each crawl once posts from a previous run are reached.
    #[serde(default)]
    pub update_mode: bool,

    /// Skip photos, including inline images in text and answer posts.
    #[serde(default)]
    pub ignore_photos: bool,

    /// Skip videos, including Gfycat links in captions.
    #[serde(default)]
    pub ignore_videos: bool,

    /// Page requests per second, shared by every blog. Resolver calls
    /// and file downloads are not limited.
    #[serde(default = "default_request_rate")]
    pub request_rate: u32,

    /// Concurrent file downloads per blog.
    #[serde(default = "default_download_workers")]
    pub download_workers: usize,

    /// Capacity of each blog's download queue.
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// Delay before retrying a failed request, in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,

    /// Consecutive unparseable pages tolerated before a crawl ends.
    #[serde(default = "default_max_malformed_pages")]
    pub max_malformed_pages: u32,

    /// Whether to render progress bars.
    #[serde(default = "default_true")]
    pub show_progress: bool,
}

impl Default for OptionsConfig {
    fn default() -> Self {
        Self {
            download_directory: None,
            update_mode: false,
            ignore_photos: false,
            ignore_videos: false,
            request_rate: default_request_rate(),
            download_workers: default_download_workers(),
            queue_capacity: default_queue_capacity(),
            retry_delay_ms: default_retry_delay_ms(),
            max_malformed_pages: default_max_malformed_pages(),
            show_progress: true,
        }
    }
}

/// Remote endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Read API endpoint; `{blog}` is replaced by the blog name.
    #[serde(default = "default_blog_url")]
    pub blog_url: String,

    /// Gfycat lookup endpoint; `{slug}` is replaced by the link identifier.
    #[serde(default = "default_gfycat_url")]
    pub gfycat_url: String,

    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            blog_url: default_blog_url(),
            gfycat_url: default_gfycat_url(),
            user_agent: default_user_agent(),
        }
    }
}

/// Persisted crawl state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateConfig {
    /// File holding the last seen post of every blog.
    #[serde(default)]
    pub cursor_file: Option<PathBuf>,
}

fn default_request_rate() -> u32 {
    4
}

fn default_download_workers() -> usize {
    10
}

fn default_queue_capacity() -> usize {
    1000
}

fn default_retry_delay_ms() -> u64 {
    1000
}

fn default_max_malformed_pages() -> u32 {
    3
}

fn default_true() -> bool {
    true
}

fn default_blog_url() -> String {
    "https://{blog}.tumblr.com/api/read/json".to_string()
}

fn default_gfycat_url() -> String {
    "https://gfycat.com/cajax/get/{slug}".to_string()
}

fn default_user_agent() -> String {
    concat!("tumblr-downloader/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                Error::Config(format!("Configuration file not found: {}", path.display()))
            } else {
                Error::Io(e)
            }
        })?;

        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to a TOML file.
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    /// Get the effective download directory.
    pub fn download_directory(&self) -> PathBuf {
        self.options
            .download_directory
            .clone()
            .unwrap_or_else(|| PathBuf::from("downloads"))
    }

    /// Get the effective cursor file, preferring the platform data directory.
    pub fn cursor_file(&self) -> PathBuf {
        if let Some(path) = &self.state.cursor_file {
            return path.clone();
        }

        directories::ProjectDirs::from("", "", "tumblr-downloader")
            .map(|dirs| dirs.data_dir().join("cursors.toml"))
            .unwrap_or_else(|| self.download_directory().join(".cursors.toml"))
    }

    pub fn retry_delay(&self) -> Duration {
        Duration::from_millis(self.options.retry_delay_ms)
    }
}
