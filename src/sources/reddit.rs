use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde_json::{json, Value};
use url::Url;

use crate::domain::{BookmarkType, Extraction, Metadata};
use crate::errors::{BookmarkError, BookmarkResult};
use crate::http::{HttpRequest, HttpTransport, USER_AGENT};
use crate::sources::text::truncate;
use crate::sources::traits::MetadataSource;

pub const MAX_DESCRIPTION_CHARS: usize = 1000;
pub const MAX_COMMENTS: usize = 5;

static POST_PATH: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"reddit\.com/r/([^/?#]+)/comments/([^/?#]+)").expect("valid reddit regex")
});

/// Subreddit and post id of a Reddit post URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedditPost {
    pub subreddit: String,
    pub post_id: String,
}

impl RedditPost {
    pub fn parse(url: &str) -> BookmarkResult<Self> {
        let caps = POST_PATH
            .captures(url)
            .ok_or_else(|| BookmarkError::Extraction("Invalid Reddit URL format".to_string()))?;

        Ok(Self {
            subreddit: caps[1].to_string(),
            post_id: caps[2].to_string(),
        })
    }
}

pub struct RedditSource {
    transport: Arc<dyn HttpTransport>,
}

impl RedditSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    /// `<post-url>.json`, without query string or trailing slash
    fn json_url(url: &str) -> BookmarkResult<String> {
        let parsed = Url::parse(url).map_err(|e| BookmarkError::InvalidUrl(e.to_string()))?;
        let host = parsed
            .host_str()
            .ok_or_else(|| BookmarkError::InvalidUrl("Missing host".to_string()))?;

        Ok(format!(
            "{}://{}{}.json",
            parsed.scheme(),
            host,
            parsed.path().trim_end_matches('/')
        ))
    }

    fn fetch_post(&self, url: &str, post: &RedditPost) -> BookmarkResult<Metadata> {
        let request = HttpRequest::get(Self::json_url(url)?).header("User-Agent", USER_AGENT);
        let response = self.transport.execute(request)?;

        if !response.is_success() {
            return Err(BookmarkError::Parse(format!(
                "Reddit returned HTTP {}",
                response.status
            )));
        }

        let listing: Value = response.json()?;
        Self::parse_listing(&listing, post)
    }

    /// Build metadata from the `[post listing, comment listing]` pair
    fn parse_listing(listing: &Value, post: &RedditPost) -> BookmarkResult<Metadata> {
        let data = listing
            .pointer("/0/data/children/0/data")
            .ok_or_else(|| BookmarkError::Parse("Unexpected Reddit response shape".to_string()))?;

        let title = str_at(data, "title");
        let body = str_at(data, "selftext").unwrap_or_default();

        let description = if body.is_empty() {
            title.clone()
        } else {
            Some(truncate(&body, MAX_DESCRIPTION_CHARS))
        };

        let thumbnail = str_at(data, "thumbnail").filter(|t| t.starts_with("http"));

        let comments: Vec<Value> = listing
            .pointer("/1/data/children")
            .and_then(Value::as_array)
            .map(|children| {
                children
                    .iter()
                    .filter(|c| c.get("kind").and_then(Value::as_str) == Some("t1"))
                    .filter_map(|c| c.get("data"))
                    .take(MAX_COMMENTS)
                    .map(|c| {
                        json!({
                            "author": c.get("author").cloned().unwrap_or(Value::Null),
                            "body": c.get("body").cloned().unwrap_or(Value::Null),
                            "score": c.get("score").cloned().unwrap_or(Value::Null),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default();

        Ok(Metadata::new(BookmarkType::Reddit)
            .with_title(title)
            .with_description(description)
            .with_author(str_at(data, "author"))
            .with_thumbnail(thumbnail)
            .with_data("subreddit", post.subreddit.clone())
            .with_data("post_id", post.post_id.clone())
            .with_data("score", data.get("score").cloned().unwrap_or(json!(0)))
            .with_data(
                "num_comments",
                data.get("num_comments").cloned().unwrap_or(json!(0)),
            )
            .with_data("full_text", body)
            .with_data("comments", comments))
    }

    fn fallback(post: &RedditPost) -> Metadata {
        let title = format!("Reddit post in r/{}", post.subreddit);
        Metadata::new(BookmarkType::Reddit)
            .with_title(Some(title.clone()))
            .with_description(Some(title))
            .with_data("subreddit", post.subreddit.clone())
            .with_data("post_id", post.post_id.clone())
    }
}

impl MetadataSource for RedditSource {
    fn bookmark_type(&self) -> BookmarkType {
        BookmarkType::Reddit
    }

    fn can_handle(&self, domain: &str) -> bool {
        domain.contains("reddit.com")
    }

    fn extract(&self, url: &str) -> BookmarkResult<Extraction> {
        // Structural check first: no request for URLs that aren't posts
        let post = RedditPost::parse(url)?;

        match self.fetch_post(url, &post) {
            Ok(metadata) => Ok(Extraction::Complete(metadata)),
            Err(e) => {
                tracing::warn!(url, error = %e, "Reddit post lookup failed");
                Ok(Extraction::degraded(Self::fallback(&post), e))
            }
        }
    }
}

fn str_at(value: &Value, key: &str) -> Option<String> {
    value.get(key).and_then(Value::as_str).map(str::to_string)
}
