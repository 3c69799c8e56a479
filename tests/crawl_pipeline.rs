//! End-to-end crawl and download of a blog served by a mock API.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use indicatif::ProgressBar;
use serde_json::json;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{method, path, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use tumblr_downloader::config::{ApiConfig, BlogConfig};
use tumblr_downloader::crawl::{CrawlReport, Crawler, CursorStore, RateLimiter, Source, TomlCursorStore};
use tumblr_downloader::output::Stats;
use tumblr_downloader::{Downloader, ExtractOptions, Extractor, PostId, QueueFilter, TumblrApi};

fn wrap(page: serde_json::Value) -> String {
    format!("var tumblr_api_read = {};", page)
}

fn photo_post(server: &MockServer, id: u64, file: &str) -> serde_json::Value {
    json!({
        "id": id.to_string(),
        "type": "photo",
        "unix-timestamp": 1_400_000_000,
        "photo-url-1280": format!("{}/media/{}", server.uri(), file),
    })
}

async fn mount_page(server: &MockServer, start: &str, body: String) {
    Mock::given(method("GET"))
        .and(path("/staff/api/read/json"))
        .and(query_param("start", start))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

async fn mount_media(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path_regex(r"^/(media/.+|tumblr_\w+\.mp4)$"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(b"media".to_vec()))
        .mount(server)
        .await;
}

async fn crawl_blog(
    server: &MockServer,
    root: &Path,
    store: Arc<dyn CursorStore>,
    stats: Arc<Stats>,
    update_mode: bool,
    period: Duration,
) -> (CrawlReport, u64) {
    let config = ApiConfig {
        blog_url: format!("{}/{{blog}}/api/read/json", server.uri()),
        gfycat_url: format!("{}/cajax/get/{{slug}}", server.uri()),
        ..ApiConfig::default()
    };
    let api = Arc::new(TumblrApi::new(&config, Duration::ZERO).unwrap());
    let extractor = Arc::new(Extractor::new(ExtractOptions::default(), api.clone()));
    let crawler = Crawler::new(
        api.clone(),
        extractor,
        Arc::new(RateLimiter::new(period)),
        Arc::clone(&store),
    )
    .update_mode(update_mode);

    let source = Source::new(&BlogConfig::parse("staff"), store.as_ref(), ProgressBar::hidden());
    let (tx, rx) = mpsc::channel(4);
    let filter = QueueFilter::new(root.to_path_buf(), Arc::clone(&stats), tx);
    let downloader = Downloader::new(api, root.to_path_buf(), stats, 2);
    let shutdown = CancellationToken::new();

    let (crawled, downloaded) = tokio::join!(
        crawler.crawl(source, filter, &shutdown),
        downloader.run(rx, &shutdown)
    );
    (crawled.unwrap(), downloaded.unwrap())
}

#[tokio::test]
async fn test_full_crawl_downloads_new_media() {
    let server = MockServer::start().await;
    let escaped = server.uri().replace('/', "\\/");

    let page = json!({
        "posts": [
            photo_post(&server, 105, "tumblr_a_1280.jpg"),
            {
                "id": "104",
                "type": "photo",
                "unix-timestamp": 1_399_000_000,
                "photos": [
                    {"photo-url-1280": format!("{}/media/tumblr_b_1280.jpg", server.uri())},
                    {"photo-url-1280": format!("{}/media/tumblr_c_1280.jpg", server.uri())}
                ],
                "photo-caption": "<a href=\"https://gfycat.com/SlowCat\">gif</a>"
            },
            {
                "id": "103",
                "type": "video",
                "unix-timestamp": 1_398_000_000,
                "video-player": format!(
                    r#"<video data-crt-options='{{"hdUrl":"{}\/tumblr_vid1","filmstrip":{{}}}}'></video>"#,
                    escaped
                )
            },
            {"id": "102", "type": "link"}
        ]
    });
    mount_page(&server, "0", wrap(page)).await;
    mount_page(&server, "50", wrap(json!({"posts": []}))).await;
    Mock::given(method("GET"))
        .and(path("/cajax/get/SlowCat"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            json!({"gfyItem": {"mp4Url": format!("{}/media/SlowCat.mp4", server.uri()), "webmUrl": ""}})
                .to_string(),
        ))
        .mount(&server)
        .await;
    mount_media(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let blog_dir = dir.path().join("staff");
    std::fs::create_dir_all(&blog_dir).unwrap();
    std::fs::write(blog_dir.join("tumblr_b_1280.jpg"), b"old").unwrap();

    let cursor_file = dir.path().join("state").join("cursors.toml");
    let store: Arc<dyn CursorStore> = Arc::new(TomlCursorStore::open(&cursor_file).unwrap());
    let stats = Arc::new(Stats::new());

    let (report, written) = crawl_blog(
        &server,
        dir.path(),
        store,
        Arc::clone(&stats),
        false,
        Duration::ZERO,
    )
    .await;

    assert_eq!(report.pages_fetched, 2);
    assert_eq!(report.highest, Some(PostId(105)));
    assert!(report.persisted);
    assert_eq!(written, 4);
    assert_eq!(stats.already_exists(), 1);
    assert_eq!(stats.total_found(), 4);

    for file in ["tumblr_a_1280.jpg", "tumblr_c_1280.jpg", "SlowCat.mp4", "tumblr_vid1.mp4"] {
        assert_eq!(std::fs::read(blog_dir.join(file)).unwrap(), b"media", "{}", file);
    }
    assert_eq!(std::fs::read(blog_dir.join("tumblr_b_1280.jpg")).unwrap(), b"old");

    let reopened = TomlCursorStore::open(&cursor_file).unwrap();
    assert_eq!(reopened.load("staff"), Some(PostId(105)));
}

#[tokio::test]
async fn test_update_mode_stops_at_known_post() {
    let server = MockServer::start().await;

    let page = json!({
        "posts": [
            photo_post(&server, 107, "tumblr_new2_1280.jpg"),
            photo_post(&server, 106, "tumblr_new1_1280.jpg"),
            photo_post(&server, 105, "tumblr_old_1280.jpg"),
            photo_post(&server, 104, "tumblr_older_1280.jpg")
        ]
    });
    mount_page(&server, "0", wrap(page)).await;
    mount_page(&server, "50", wrap(json!({"posts": [photo_post(&server, 90, "tumblr_x.jpg")]}))).await;
    mount_media(&server).await;

    let dir = tempfile::tempdir().unwrap();
    let cursor_file = dir.path().join("cursors.toml");
    let store = TomlCursorStore::open(&cursor_file).unwrap();
    store.save("staff", PostId(105)).await.unwrap();
    let store: Arc<dyn CursorStore> = Arc::new(store);
    let stats = Arc::new(Stats::new());

    let (report, written) = crawl_blog(
        &server,
        dir.path(),
        Arc::clone(&store),
        stats,
        true,
        Duration::from_millis(300),
    )
    .await;

    assert!(report.stopped_early);
    assert_eq!(report.pages_fetched, 1);
    assert_eq!(report.highest, Some(PostId(107)));
    assert_eq!(written, 2);

    let blog_dir = dir.path().join("staff");
    assert!(blog_dir.join("tumblr_new1_1280.jpg").exists());
    assert!(blog_dir.join("tumblr_new2_1280.jpg").exists());
    assert!(!blog_dir.join("tumblr_old_1280.jpg").exists());

    let requests = server.received_requests().await.unwrap();
    assert!(!requests
        .iter()
        .any(|r| r.url.query().is_some_and(|q| q.contains("start=50"))));

    assert_eq!(store.load("staff"), Some(PostId(107)));
}
