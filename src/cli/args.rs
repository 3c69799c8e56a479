//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::{BlogConfig, Config};

/// Tumblr blog downloader CLI.
#[derive(Parser, Debug)]
#[command(
    name = "tumblr-downloader",
    version,
    about = "Download photos and videos from Tumblr blogs",
    long_about = "A CLI tool to download photos and videos from Tumblr blogs.\n\n\
                  Blogs are given as NAME or NAME:TAG. In update mode only posts newer \
                  than the previous run are fetched."
)]
pub struct Args {
    /// Blogs to download, as NAME or NAME:TAG.
    /// Replaces the blogs listed in the configuration file.
    #[arg(value_name = "BLOG")]
    pub blogs: Vec<String>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Path to configuration file.
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Stop at the first post already seen by a previous run.
    #[arg(short, long)]
    pub update: bool,

    /// Don't download photos or inline images.
    #[arg(long)]
    pub ignore_photos: bool,

    /// Don't download videos or Gfycat links.
    #[arg(long)]
    pub ignore_videos: bool,

    /// Page requests per second, shared by all blogs.
    #[arg(long, env = "TUMBLR_REQUEST_RATE")]
    pub rate: Option<u32>,

    /// Concurrent downloads per blog.
    #[arg(short, long)]
    pub workers: Option<usize>,

    /// File holding the last seen post of every blog.
    #[arg(long)]
    pub cursor_file: Option<PathBuf>,

    /// Hide progress bars.
    #[arg(long)]
    pub no_progress: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into an existing config, overriding where specified.
    pub fn merge_into_config(self, config: &mut Config) {
        if !self.blogs.is_empty() {
            config.blogs = self.blogs.iter().map(|b| BlogConfig::parse(b)).collect();
        }

        if let Some(dir) = self.download_directory {
            config.options.download_directory = Some(dir);
        }

        if let Some(rate) = self.rate {
            config.options.request_rate = rate;
        }

        if let Some(workers) = self.workers {
            config.options.download_workers = workers;
        }

        if let Some(path) = self.cursor_file {
            config.state.cursor_file = Some(path);
        }

        // Boolean flags (only override if set to non-default)
        if self.update {
            config.options.update_mode = true;
        }

        if self.ignore_photos {
            config.options.ignore_photos = true;
        }

        if self.ignore_videos {
            config.options.ignore_videos = true;
        }

        if self.no_progress {
            config.options.show_progress = false;
        }
    }
}
