//! API response type definitions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Numeric post identifier.
///
/// The read API serializes identifiers as decimal strings; they are parsed
/// once so that cursor comparisons are numeric rather than lexical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(pub u64);

impl FromStr for PostId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        s.trim()
            .parse::<u64>()
            .map(PostId)
            .map_err(|_| Error::InvalidPostId(s.to_string()))
    }
}

impl fmt::Display for PostId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One page of the `/api/read/json` endpoint, once the script wrapper has
/// been removed.
///
/// A post that cannot be read is logged and dropped; its siblings are kept.
#[derive(Debug, Default, Deserialize)]
pub struct BlogPage {
    #[serde(default, deserialize_with = "readable_posts")]
    pub posts: Vec<Post>,
}

/// A post from a blog page.
#[derive(Debug, Clone, Deserialize)]
pub struct Post {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(rename = "unix-timestamp", default)]
    pub unix_timestamp: i64,
    #[serde(flatten)]
    pub content: PostContent,
}

impl Post {
    /// Parse the raw identifier.
    pub fn post_id(&self) -> Result<PostId> {
        self.id.parse()
    }
}

/// Kind-specific post payload, selected by the `type` field.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum PostContent {
    #[serde(rename = "photo")]
    Photo {
        #[serde(rename = "photo-url-1280")]
        photo_url: Option<String>,
        #[serde(default)]
        photos: Vec<Photo>,
        #[serde(rename = "photo-caption")]
        caption: Option<String>,
    },
    #[serde(rename = "answer")]
    Answer { answer: Option<String> },
    #[serde(rename = "regular")]
    Regular {
        #[serde(rename = "regular-body")]
        body: Option<String>,
    },
    #[serde(rename = "video")]
    Video {
        #[serde(rename = "video-player")]
        player: Option<String>,
        #[serde(rename = "video-caption")]
        caption: Option<String>,
    },
    #[serde(other)]
    Unrecognized,
}

/// Gallery entry of a photo post.
#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    #[serde(rename = "photo-url-1280", default)]
    pub photo_url: String,
}

/// Gfycat lookup response.
#[derive(Debug, Deserialize)]
pub struct GfyResponse {
    #[serde(rename = "gfyItem")]
    pub gfy_item: GfyItem,
}

/// Media locations of a Gfycat item.
#[derive(Debug, Deserialize)]
pub struct GfyItem {
    #[serde(rename = "mp4Url", default)]
    pub mp4_url: String,
    #[serde(rename = "webmUrl", default)]
    pub webm_url: String,
}

/// Deserialize each post on its own, skipping those that don't fit [`Post`].
fn readable_posts<'de, D>(deserializer: D) -> std::result::Result<Vec<Post>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<serde_json::Value>::deserialize(deserializer)?;

    Ok(raw
        .into_iter()
        .filter_map(|value| {
            let id = value.get("id").map(|id| id.to_string());
            match serde_json::from_value::<Post>(value) {
                Ok(post) => Some(post),
                Err(e) => {
                    tracing::warn!(
                        "Skipping unreadable post {}: {}",
                        id.as_deref().unwrap_or("without id"),
                        e
                    );
                    None
                }
            }
        })
        .collect())
}

/// Accept identifiers serialized either as strings or as bare numbers.
fn string_or_number<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Text(String),
        Number(u64),
    }

    Ok(match Raw::deserialize(deserializer)? {
        Raw::Text(s) => s,
        Raw::Number(n) => n.to_string(),
    })
}
