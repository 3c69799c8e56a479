//! Tumblr Downloader - CLI entry point.

use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use tumblr_downloader::{
    api::TumblrApi,
    cli::Args,
    config::{validate_config, Config},
    crawl::{Crawler, CursorStore, RateLimiter, Source, TomlCursorStore},
    dedup::QueueFilter,
    download::Downloader,
    error::{exit_codes, Error, Result},
    fs::ensure_dir,
    media::{ExtractOptions, Extractor},
    output::{
        create_blog_bar, create_multi_progress, print_banner, print_config_summary, print_error,
        print_info, print_summary, print_warning, Stats,
    },
};

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(e) => {
            print_error(&format!("{}", e));
            match e {
                Error::Config(_) | Error::ConfigValidation { .. } | Error::MissingConfig(_) => {
                    ExitCode::from(exit_codes::CONFIG_ERROR as u8)
                }
                Error::Api(_) | Error::MalformedResolverResponse { .. } | Error::Http(_) => {
                    ExitCode::from(exit_codes::API_ERROR as u8)
                }
                Error::Download(_) | Error::QueueClosed(_) | Error::Io(_) => {
                    ExitCode::from(exit_codes::DOWNLOAD_ERROR as u8)
                }
                Error::Interrupted => ExitCode::from(exit_codes::INTERRUPTED as u8),
                _ => ExitCode::from(exit_codes::UNEXPECTED_ERROR as u8),
            }
        }
    }
}

async fn run() -> Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Set up logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    fmt().with_env_filter(filter).with_target(false).init();

    // Print banner
    print_banner();

    // Load configuration
    let config_path = args.config.clone();
    let mut config = if config_path.exists() {
        Config::load(&config_path)?
    } else {
        print_warning(&format!(
            "Configuration file not found: {}",
            config_path.display()
        ));
        print_info("Using default configuration with CLI arguments");
        Config::default()
    };

    // Merge CLI arguments into config
    args.merge_into_config(&mut config);

    // Validate configuration
    validate_config(&config)?;

    let root = config.download_directory();
    let names: Vec<String> = config
        .blogs
        .iter()
        .map(|b| match &b.tag {
            Some(tag) => format!("{}:{}", b.name, tag),
            None => b.name.clone(),
        })
        .collect();
    print_config_summary(&names, config.options.update_mode, &root.display().to_string());

    ensure_dir(&root)?;

    // Shared services
    let api = Arc::new(TumblrApi::new(&config.api, config.retry_delay())?);
    let cursor_file = config.cursor_file();
    tracing::debug!("Using cursor file {}", cursor_file.display());
    let store: Arc<dyn CursorStore> = Arc::new(TomlCursorStore::open(&cursor_file)?);
    let stats = Arc::new(Stats::new());
    let extractor = Arc::new(Extractor::new(
        ExtractOptions {
            photos: !config.options.ignore_photos,
            videos: !config.options.ignore_videos,
        },
        api.clone(),
    ));
    let crawler = Arc::new(
        Crawler::new(
            api.clone(),
            extractor,
            Arc::new(RateLimiter::per_second(config.options.request_rate)),
            Arc::clone(&store),
        )
        .update_mode(config.options.update_mode)
        .max_malformed_pages(config.options.max_malformed_pages),
    );

    let shutdown = CancellationToken::new();
    spawn_interrupt_handler(shutdown.clone());

    let multi = create_multi_progress(config.options.show_progress);
    let mut blogs = JoinSet::new();

    for blog in &config.blogs {
        let source = Source::new(blog, store.as_ref(), create_blog_bar(&multi, &blog.name));
        let key = source.key();
        let progress = source.progress.clone();

        let (tx, rx) = mpsc::channel(config.options.queue_capacity);
        let filter = QueueFilter::new(root.clone(), Arc::clone(&stats), tx);
        let downloader = Downloader::new(
            api.clone(),
            root.clone(),
            Arc::clone(&stats),
            config.options.download_workers,
        );
        let crawler = Arc::clone(&crawler);
        let shutdown = shutdown.clone();

        blogs.spawn(async move {
            let crawl = async {
                let result = crawler.crawl(source, filter, &shutdown).await;
                if result.is_err() {
                    shutdown.cancel();
                }
                result
            };
            let download = async {
                let result = downloader.run(rx, &shutdown).await;
                if matches!(result, Err(ref e) if !matches!(e, Error::Interrupted)) {
                    shutdown.cancel();
                }
                result
            };

            let (crawled, downloaded) = tokio::join!(crawl, download);
            progress.finish_with_message("done");
            (key, crawled, downloaded)
        });
    }

    let mut failed = 0;
    let mut first_error = None;
    let mut interrupted = false;

    while let Some(joined) = blogs.join_next().await {
        let (key, crawled, downloaded) = joined?;
        let mut blog_failed = false;

        match crawled {
            Ok(report) => {
                interrupted |= report.interrupted;
                tracing::debug!("{}: {:?}", key, report);
            }
            Err(e) => {
                print_error(&format!("Failed to crawl {}: {}", key, e));
                blog_failed = true;
                first_error.get_or_insert(e);
            }
        }

        match downloaded {
            Ok(count) => tracing::debug!("{}: {} file(s) written", key, count),
            Err(Error::Interrupted) => interrupted = true,
            Err(e) => {
                print_error(&format!("Downloads for {} failed: {}", key, e));
                blog_failed = true;
                first_error.get_or_insert(e);
            }
        }

        if blog_failed {
            failed += 1;
        }
    }

    print_summary(&stats, config.blogs.len(), failed);

    if let Some(e) = first_error {
        return Err(e);
    }
    if interrupted {
        return Err(Error::Interrupted);
    }

    Ok(())
}

/// First Ctrl+C cancels every crawl and download; a second one exits at once.
fn spawn_interrupt_handler(shutdown: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_err() {
            return;
        }
        print_warning("Interrupted, stopping (press Ctrl+C again to quit immediately)");
        shutdown.cancel();

        if tokio::signal::ctrl_c().await.is_ok() {
            std::process::exit(exit_codes::INTERRUPTED);
        }
    });
}
