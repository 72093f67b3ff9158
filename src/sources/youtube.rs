use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use url::form_urlencoded;

use crate::domain::{BookmarkType, Extraction, Metadata};
use crate::errors::{BookmarkError, BookmarkResult};
use crate::http::{HttpRequest, HttpTransport};
use crate::sources::traits::MetadataSource;

const OEMBED_ENDPOINT: &str = "https://www.youtube.com/oembed";

// youtu.be/<id>, /live/<id>, /shorts/<id>, /embed/<id>
static PATH_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtu\.be/|/live/|/shorts/|/embed/)([\w-]+)").expect("valid video id regex")
});

// watch?v=<id>
static QUERY_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]v=([\w-]+)").expect("valid video id regex"));

#[derive(Debug, Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
    author_name: Option<String>,
    thumbnail_url: Option<String>,
    provider_name: Option<String>,
    width: Option<u64>,
    height: Option<u64>,
}

/// Extract the video id from any of the supported YouTube URL shapes
pub fn extract_video_id(url: &str) -> BookmarkResult<String> {
    PATH_ID
        .captures(url)
        .or_else(|| QUERY_ID.captures(url))
        .map(|caps| caps[1].to_string())
        .ok_or_else(|| {
            BookmarkError::Extraction(format!("Could not extract YouTube video ID from {}", url))
        })
}

pub struct YouTubeSource {
    transport: Arc<dyn HttpTransport>,
}

impl YouTubeSource {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self { transport }
    }

    fn oembed_url(url: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("url", url)
            .append_pair("format", "json")
            .finish();
        format!("{}?{}", OEMBED_ENDPOINT, query)
    }

    fn fetch_oembed(&self, url: &str, video_id: &str) -> BookmarkResult<Metadata> {
        let response = self
            .transport
            .execute(HttpRequest::get(Self::oembed_url(url)))?;

        if !response.is_success() {
            return Err(BookmarkError::Parse(format!(
                "oEmbed returned HTTP {}",
                response.status
            )));
        }

        let oembed: OEmbedResponse = response.json()?;

        let mut metadata = Metadata::new(BookmarkType::Youtube)
            .with_title(oembed.title.clone())
            .with_description(oembed.title)
            .with_author(oembed.author_name)
            .with_thumbnail(oembed.thumbnail_url)
            .with_data("video_id", video_id);

        if let Some(provider) = oembed.provider_name {
            metadata = metadata.with_data("provider_name", provider);
        }
        if let Some(width) = oembed.width {
            metadata = metadata.with_data("width", width);
        }
        if let Some(height) = oembed.height {
            metadata = metadata.with_data("height", height);
        }

        Ok(metadata)
    }

    fn fallback(video_id: &str) -> Metadata {
        Metadata::new(BookmarkType::Youtube)
            .with_title(Some(format!("YouTube video {}", video_id)))
            .with_data("video_id", video_id)
    }
}

impl MetadataSource for YouTubeSource {
    fn bookmark_type(&self) -> BookmarkType {
        BookmarkType::Youtube
    }

    fn can_handle(&self, domain: &str) -> bool {
        domain.contains("youtube.com") || domain.contains("youtu.be")
    }

    fn extract(&self, url: &str) -> BookmarkResult<Extraction> {
        let video_id = extract_video_id(url)?;

        match self.fetch_oembed(url, &video_id) {
            Ok(metadata) => Ok(Extraction::Complete(metadata)),
            Err(e) => {
                tracing::warn!(url, error = %e, "YouTube oEmbed lookup failed");
                Ok(Extraction::degraded(Self::fallback(&video_id), e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::{HttpResponse, MockHttpTransport};

    fn source(transport: MockHttpTransport) -> YouTubeSource {
        YouTubeSource::new(Arc::new(transport))
    }

    #[test]
    fn test_can_handle_youtube_hosts() {
        let source = source(MockHttpTransport::new());

        assert!(source.can_handle("www.youtube.com"));
        assert!(source.can_handle("m.youtube.com"));
        assert!(source.can_handle("youtu.be"));

        assert!(!source.can_handle("example.com"));
        assert!(!source.can_handle("reddit.com"));
    }

    #[test]
    fn test_extract_video_id_shapes() {
        let cases = [
            ("https://youtu.be/abc123?x=1", "abc123"),
            ("https://youtube.com/shorts/xyz789", "xyz789"),
            ("https://www.youtube.com/live/live_42?feature=share", "live_42"),
            ("https://www.youtube.com/embed/emb-1", "emb-1"),
            ("https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=10s", "dQw4w9WgXcQ"),
            ("https://www.youtube.com/watch?feature=share&v=q1", "q1"),
        ];

        for (url, expected) in cases {
            assert_eq!(extract_video_id(url).unwrap(), expected, "url: {}", url);
        }
    }

    #[test]
    fn test_unrecognized_shape_fails_before_request() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(0);

        let result = source(transport).extract("https://www.youtube.com/@channel");
        assert!(matches!(result, Err(BookmarkError::Extraction(_))));
    }

    #[test]
    fn test_oembed_success() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|req| {
                req.url.starts_with("https://www.youtube.com/oembed?url=https%3A%2F%2Fyoutu.be%2Fabc123")
                    && req.url.ends_with("&format=json")
            })
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"{"title":"Never Gonna","author_name":"Rick","thumbnail_url":"https://i.ytimg.com/vi/abc123/hqdefault.jpg","provider_name":"YouTube","width":200,"height":113}"#,
                ))
            });

        let extraction = source(transport).extract("https://youtu.be/abc123").unwrap();
        assert!(!extraction.is_degraded());

        let metadata = extraction.metadata();
        assert_eq!(metadata.bookmark_type, BookmarkType::Youtube);
        assert_eq!(metadata.title.as_deref(), Some("Never Gonna"));
        assert_eq!(metadata.author.as_deref(), Some("Rick"));
        assert_eq!(metadata.data["video_id"], "abc123");
        assert_eq!(metadata.data["width"], 200);
    }

    #[test]
    fn test_network_failure_degrades() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Err(BookmarkError::Parse("connection reset".to_string())));

        let extraction = source(transport)
            .extract("https://www.youtube.com/watch?v=abc123")
            .unwrap();

        assert!(extraction.is_degraded());
        let metadata = extraction.metadata();
        assert_eq!(metadata.bookmark_type, BookmarkType::Youtube);
        assert!(metadata.title.as_deref().unwrap().contains("abc123"));
        assert_eq!(metadata.data["video_id"], "abc123");
    }

    #[test]
    fn test_unparseable_oembed_degrades() {
        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .returning(|_| Ok(HttpResponse::new(200, "<html>Unauthorized</html>")));

        let extraction = source(transport).extract("https://youtu.be/abc123").unwrap();
        assert_eq!(
            extraction.metadata().title.as_deref(),
            Some("YouTube video abc123")
        );
        assert!(extraction.error().is_some());
    }
}
