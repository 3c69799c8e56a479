//! Tumblr read API and Gfycat HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use rand::Rng;
use reqwest::{Client, Response, StatusCode};
use tokio::time::sleep;

use crate::api::traits::{FetchedPage, MediaResolver, PageFetcher};
use crate::api::types::{BlogPage, GfyResponse};
use crate::config::ApiConfig;
use crate::error::{Error, Result};

/// Posts requested per page.
pub const PAGE_SIZE: u32 = 50;

/// Script prefix wrapped around the JSON document by the read API.
const SCRIPT_PREFIX: &str = "var tumblr_api_read = ";

/// Body returned by the Gfycat lookup for unknown identifiers.
const NOT_FOUND_BODY: &str = "Not Found";

/// Longest response excerpt kept in error messages.
const BODY_EXCERPT_LEN: usize = 500;

/// HTTP client for the read API, the Gfycat lookup and media downloads.
pub struct TumblrApi {
    client: Client,
    blog_url: String,
    gfycat_url: String,
    retry_delay: Duration,
}

impl TumblrApi {
    /// Create a new API client.
    pub fn new(config: &ApiConfig, retry_delay: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .build()
            .map_err(|e| Error::Api(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            blog_url: config.blog_url.clone(),
            gfycat_url: config.gfycat_url.clone(),
            retry_delay,
        })
    }

    /// GET a URL until a non-retryable response arrives.
    ///
    /// Transport errors, 429 and 5xx responses are logged and retried after
    /// the configured delay, without limit.
    async fn get_with_retry(&self, url: &str, query: &[(&str, String)]) -> (StatusCode, String) {
        let mut attempt: u32 = 0;

        loop {
            attempt += 1;

            match self.try_get(url, query).await {
                Ok((status, _)) if is_retryable_status(status) => {
                    tracing::warn!("GET {} returned HTTP {} (attempt {})", url, status, attempt);
                }
                Ok(response) => return response,
                Err(e) => {
                    tracing::warn!("GET {} failed (attempt {}): {}", url, attempt, e);
                }
            }

            self.pause().await;
        }
    }

    async fn try_get(&self, url: &str, query: &[(&str, String)]) -> Result<(StatusCode, String)> {
        tracing::debug!("GET {} {:?}", url, query);

        let response = self.client.get(url).query(query).send().await?;
        let status = response.status();
        let text = response.text().await?;

        tracing::debug!("Response status: {}", status);
        Ok((status, text))
    }

    /// Sleep for the retry delay plus up to a quarter of it as jitter.
    pub async fn pause(&self) {
        let base = self.retry_delay.as_millis() as u64;
        let jitter = rand::thread_rng().gen_range(0..=base / 4);
        sleep(Duration::from_millis(base + jitter)).await;
    }

    /// Start downloading a media file.
    ///
    /// Only transport failures are errors; the caller judges the status.
    pub async fn download_file(&self, url: &str) -> Result<Response> {
        tracing::debug!("GET {}", url);
        Ok(self.client.get(url).send().await?)
    }
}

#[async_trait]
impl PageFetcher for TumblrApi {
    async fn fetch_page(&self, blog: &str, tag: Option<&str>, page: u32) -> FetchedPage {
        let url = self.blog_url.replace("{blog}", blog);
        let query = page_query(page, tag);

        let (status, body) = self.get_with_retry(&url, &query).await;

        if status == StatusCode::NOT_FOUND {
            tracing::error!("Blog {} not found", blog);
            return FetchedPage::Posts(Vec::new());
        }

        match parse_page(&body) {
            Ok(page) => FetchedPage::Posts(page.posts),
            Err(e) => {
                tracing::warn!(
                    "Failed to parse page {} of {} (HTTP {}): {}",
                    page,
                    blog,
                    status,
                    e
                );
                FetchedPage::Malformed
            }
        }
    }
}

#[async_trait]
impl MediaResolver for TumblrApi {
    async fn resolve(&self, slug: &str) -> Result<Option<String>> {
        let url = self.gfycat_url.replace("{slug}", slug);
        let (_, body) = self.get_with_retry(&url, &[]).await;
        parse_gfycat(slug, &body)
    }
}

/// Build the query selecting one page: `num`, `start` and optional `tagged`.
fn page_query(page: u32, tag: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![
        ("num", PAGE_SIZE.to_string()),
        ("start", (page.saturating_sub(1) * PAGE_SIZE).to_string()),
    ];

    if let Some(tag) = tag {
        query.push(("tagged", tag.to_string()));
    }

    query
}

/// Remove the script wrapper and every semicolon, then deserialize.
pub fn parse_page(body: &str) -> Result<BlogPage> {
    let json = body.replacen(SCRIPT_PREFIX, "", 1).replace(';', "");
    Ok(serde_json::from_str(json.trim())?)
}

/// Interpret a Gfycat lookup body.
///
/// Anything other than the "Not Found" marker or the documented JSON shape
/// is reported as [`Error::MalformedResolverResponse`].
pub fn parse_gfycat(slug: &str, body: &str) -> Result<Option<String>> {
    if body == NOT_FOUND_BODY {
        return Ok(None);
    }

    let gfy: GfyResponse =
        serde_json::from_str(body).map_err(|_| Error::MalformedResolverResponse {
            slug: slug.to_string(),
            body: body.chars().take(BODY_EXCERPT_LEN).collect(),
        })?;

    let url = gfy.gfy_item.mp4_url;
    Ok(if url.is_empty() { None } else { Some(url) })
}

pub(crate) fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::types::PostContent;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> TumblrApi {
        let config = ApiConfig {
            blog_url: format!("{}/{{blog}}/api/read/json", server.uri()),
            gfycat_url: format!("{}/cajax/get/{{slug}}", server.uri()),
            ..ApiConfig::default()
        };
        TumblrApi::new(&config, Duration::ZERO).unwrap()
    }

    const ONE_POST: &str = r#"var tumblr_api_read = {"posts":[{"id":"7","type":"photo","unix-timestamp":1,"photo-url-1280":"https://64.media.tumblr.com/a/tumblr_a_1280.jpg"}]};"#;

    #[test]
    fn test_page_query() {
        assert_eq!(
            page_query(1, None),
            vec![("num", "50".to_string()), ("start", "0".to_string())]
        );
        assert_eq!(
            page_query(3, Some("cats")),
            vec![
                ("num", "50".to_string()),
                ("start", "100".to_string()),
                ("tagged", "cats".to_string())
            ]
        );
    }

    #[test]
    fn test_parse_page_strips_wrapper_and_semicolons() {
        let body = r#"var tumblr_api_read = {"posts":[{"id":"1","type":"regular","regular-body":"a;b"}]};"#;
        let page = parse_page(body).unwrap();

        match &page.posts[0].content {
            PostContent::Regular { body } => assert_eq!(body.as_deref(), Some("ab")),
            other => panic!("unexpected content: {:?}", other),
        }
    }

    #[test]
    fn test_parse_page_keeps_posts_around_unreadable_one() {
        let bodies = [
            r#"var tumblr_api_read = {"posts":[
                {"id":"1","type":"regular","regular-body":"a"},
                {"id":"2","type":"photo","photo-caption":false},
                {"id":"3","type":"answer","answer":"c"}
            ]};"#,
            r#"var tumblr_api_read = {"posts":[
                {"id":"1","type":"regular","regular-body":"a"},
                {"id":"2"},
                {"id":"3","type":"answer","answer":"c"}
            ]};"#,
        ];

        for body in bodies {
            let page = parse_page(body).unwrap();
            let ids: Vec<_> = page.posts.iter().map(|p| p.id.as_str()).collect();
            assert_eq!(ids, ["1", "3"]);
        }
    }

    #[test]
    fn test_parse_gfycat() {
        assert_eq!(parse_gfycat("x", "Not Found").unwrap(), None);
        assert_eq!(
            parse_gfycat("x", r#"{"gfyItem":{"mp4Url":"https://giant.gfycat.com/X.mp4"}}"#)
                .unwrap(),
            Some("https://giant.gfycat.com/X.mp4".to_string())
        );
        assert_eq!(
            parse_gfycat("x", r#"{"gfyItem":{"mp4Url":""}}"#).unwrap(),
            None
        );
        assert!(matches!(
            parse_gfycat("x", "<html>oops</html>"),
            Err(Error::MalformedResolverResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_sends_offset_and_tag() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staff/api/read/json"))
            .and(query_param("num", "50"))
            .and(query_param("start", "50"))
            .and(query_param("tagged", "cats"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ONE_POST))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        match api.fetch_page("staff", Some("cats"), 2).await {
            FetchedPage::Posts(posts) => {
                assert_eq!(posts.len(), 1);
                assert_eq!(posts[0].id, "7");
            }
            FetchedPage::Malformed => panic!("page should parse"),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staff/api/read/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert!(matches!(
            api.fetch_page("staff", None, 1).await,
            FetchedPage::Malformed
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/staff/api/read/json"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/staff/api/read/json"))
            .respond_with(ResponseTemplate::new(200).set_body_string(ONE_POST))
            .mount(&server)
            .await;

        let api = api_for(&server);
        match api.fetch_page("staff", None, 1).await {
            FetchedPage::Posts(posts) => assert_eq!(posts.len(), 1),
            FetchedPage::Malformed => panic!("page should parse"),
        }

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_fetch_page_missing_blog_is_empty() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404).set_body_string("<html>404</html>"))
            .mount(&server)
            .await;

        let api = api_for(&server);
        match api.fetch_page("nobody", None, 1).await {
            FetchedPage::Posts(posts) => assert!(posts.is_empty()),
            FetchedPage::Malformed => panic!("missing blog should end pagination"),
        }
    }

    #[tokio::test]
    async fn test_resolve_gfycat() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cajax/get/HappyCat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"gfyItem":{"mp4Url":"https://giant.gfycat.com/HappyCat.mp4","webmUrl":"w"}}"#),
            )
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajax/get/Gone"))
            .respond_with(ResponseTemplate::new(404).set_body_string("Not Found"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajax/get/Broken"))
            .respond_with(ResponseTemplate::new(200).set_body_string("{\"gfyItem\": "))
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert_eq!(
            api.resolve("HappyCat").await.unwrap().as_deref(),
            Some("https://giant.gfycat.com/HappyCat.mp4")
        );
        assert_eq!(api.resolve("Gone").await.unwrap(), None);
        assert!(matches!(
            api.resolve("Broken").await,
            Err(Error::MalformedResolverResponse { .. })
        ));
    }

    #[tokio::test]
    async fn test_resolve_retries_server_errors() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cajax/get/SlowCat"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/cajax/get/SlowCat"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(r#"{"gfyItem":{"mp4Url":"https://giant.gfycat.com/SlowCat.mp4"}}"#),
            )
            .mount(&server)
            .await;

        let api = api_for(&server);
        assert_eq!(
            api.resolve("SlowCat").await.unwrap().as_deref(),
            Some("https://giant.gfycat.com/SlowCat.mp4")
        );

        let requests = server.received_requests().await.unwrap();
        assert_eq!(requests.len(), 3);
    }
}
