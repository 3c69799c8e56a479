//! Media URL extraction from posts.

use std::sync::Arc;

use regex::Regex;

use crate::api::traits::MediaResolver;
use crate::api::types::{Post, PostContent};
use crate::error::Result;

/// Inline images embedded in text and answer bodies.
const INLINE_PATTERN: &str =
    r"https?://\d{2}\.media\.tumblr\.com/\w{32}/tumblr_inline_\w+\.\w+";

/// Gfycat links in captions; the capture is the lookup identifier.
const GFYCAT_PATTERN: &str = r#"href="https?://(?:www\.)?gfycat\.com/(\w+)"#;

/// Extension appended to extracted video URLs.
const VIDEO_EXTENSION: &str = ".mp4";

/// Which media kinds to extract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractOptions {
    pub photos: bool,
    pub videos: bool,
}

impl Default for ExtractOptions {
    fn default() -> Self {
        Self {
            photos: true,
            videos: true,
        }
    }
}

/// A pattern locating a direct video URL in embedded player markup.
///
/// Capture group 1 holds the URL, possibly with JSON escaping.
#[derive(Debug, Clone)]
pub struct VideoRule {
    pub name: &'static str,
    pattern: Regex,
}

impl VideoRule {
    pub fn new(name: &'static str, pattern: &str) -> std::result::Result<Self, regex::Error> {
        Ok(Self {
            name,
            pattern: Regex::new(pattern)?,
        })
    }

    fn apply(&self, player: &str) -> Option<String> {
        self.pattern
            .captures(player)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().replace('\\', ""))
    }
}

/// Rules tried in order against video player markup.
///
/// The HD source comes first; the `<source>` tag is the fallback for
/// players without an HD variant.
pub fn default_video_rules() -> Vec<VideoRule> {
    vec![
        VideoRule::new("hd-url", r#""hdUrl":"([^"]*/tumblr_\w+)""#).expect("valid video rule"),
        VideoRule::new("source-tag", r#"source src="([^"]*tumblr_\w+)(?:/\d+)?" type"#)
            .expect("valid video rule"),
    ]
}

/// Maps posts to the media URLs they contain.
pub struct Extractor {
    options: ExtractOptions,
    inline: Regex,
    gfycat: Regex,
    video_rules: Vec<VideoRule>,
    resolver: Arc<dyn MediaResolver>,
}

impl Extractor {
    pub fn new(options: ExtractOptions, resolver: Arc<dyn MediaResolver>) -> Self {
        Self {
            options,
            inline: Regex::new(INLINE_PATTERN).expect("valid inline pattern"),
            gfycat: Regex::new(GFYCAT_PATTERN).expect("valid gfycat pattern"),
            video_rules: default_video_rules(),
            resolver,
        }
    }

    /// Replace the ordered video extraction rules.
    pub fn with_video_rules(mut self, rules: Vec<VideoRule>) -> Self {
        self.video_rules = rules;
        self
    }

    /// Extract the media URLs of a post, in post order.
    ///
    /// Only a malformed resolver response is an error; unsupported kinds
    /// and embeds yield nothing.
    pub async fn extract(&self, post: &Post) -> Result<Vec<String>> {
        let mut urls = Vec::new();

        match &post.content {
            PostContent::Photo {
                photo_url,
                photos,
                caption,
            } => {
                if self.options.photos {
                    if photos.is_empty() {
                        urls.extend(photo_url.iter().filter(|u| !u.is_empty()).cloned());
                    } else {
                        urls.extend(
                            photos
                                .iter()
                                .filter(|p| !p.photo_url.is_empty())
                                .map(|p| p.photo_url.clone()),
                        );
                    }
                }

                if self.options.videos {
                    self.resolve_short_links(text(caption), &mut urls).await?;
                }
            }
            PostContent::Answer { answer: body } | PostContent::Regular { body } => {
                if self.options.photos {
                    urls.extend(self.inline_urls(text(body)));
                }
            }
            PostContent::Video { player, caption } => {
                if !self.options.videos {
                    return Ok(urls);
                }

                // Anything else is an external embed (YouTube and the like).
                let Some(video_url) = self.video_url(text(player)) else {
                    tracing::debug!("Post {} has no supported video source", post.id);
                    return Ok(urls);
                };
                urls.push(video_url);

                self.resolve_short_links(text(caption), &mut urls).await?;
            }
            PostContent::Unrecognized => {}
        }

        Ok(urls)
    }

    fn inline_urls(&self, body: &str) -> Vec<String> {
        self.inline
            .find_iter(body)
            .map(|m| m.as_str().to_string())
            .collect()
    }

    fn video_url(&self, player: &str) -> Option<String> {
        self.video_rules.iter().find_map(|rule| {
            let url = rule.apply(player)?;
            tracing::trace!("Video rule {} matched", rule.name);
            Some(format!("{}{}", url, VIDEO_EXTENSION))
        })
    }

    /// Resolve every Gfycat link in `text`, left to right. Links that
    /// resolve to nothing are dropped.
    async fn resolve_short_links(&self, text: &str, urls: &mut Vec<String>) -> Result<()> {
        let slugs: Vec<String> = self
            .gfycat
            .captures_iter(text)
            .map(|caps| caps[1].to_string())
            .collect();

        for slug in slugs {
            match self.resolver.resolve(&slug).await? {
                Some(url) => urls.push(url),
                None => tracing::debug!("Gfycat {} not found", slug),
            }
        }
        Ok(())
    }
}

fn text(value: &Option<String>) -> &str {
    value.as_deref().unwrap_or("")
}
