use std::sync::Arc;

use url::Url;

use crate::domain::{BookmarkType, Extraction, Metadata};
use crate::errors::{BookmarkError, BookmarkResult};
use crate::http::HttpTransport;
use crate::sources::article::ArticleSource;
use crate::sources::reddit::RedditSource;
use crate::sources::traits::MetadataSource;
use crate::sources::youtube::YouTubeSource;

/// Lowercased host of `url`. Scheme-less input is retried as `https://`.
pub fn domain_of(url: &str) -> Option<String> {
    let parsed = Url::parse(url)
        .ok()
        .filter(|u| u.has_host())
        .or_else(|| Url::parse(&format!("https://{}", url)).ok())?;

    parsed.host_str().map(|h| h.to_lowercase())
}

pub struct SourceRegistry {
    sources: Vec<Box<dyn MetadataSource>>,
    fallback: ArticleSource,
}

/// Handler chosen for one URL, ready to run.
pub struct SelectedSource<'a> {
    source: &'a dyn MetadataSource,
    url: String,
}

impl SelectedSource<'_> {
    pub fn extract(&self) -> BookmarkResult<Extraction> {
        self.source.extract(&self.url)
    }

    pub fn bookmark_type(&self) -> BookmarkType {
        self.source.bookmark_type()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl SourceRegistry {
    pub fn with_transport(transport: Arc<dyn HttpTransport>) -> Self {
        let mut registry = Self {
            sources: Vec::new(),
            fallback: ArticleSource::new(transport.clone()),
        };

        // Register sources in order of specificity (most specific first)
        registry.register(Box::new(YouTubeSource::new(transport.clone())));
        registry.register(Box::new(RedditSource::new(transport)));

        registry
    }

    /// Add a source ahead of the catch-all article handler
    pub fn register(&mut self, source: Box<dyn MetadataSource>) {
        self.sources.push(source);
    }

    /// Find appropriate source for URL; the article handler takes anything unclaimed
    pub fn find_source(&self, url: &str) -> &dyn MetadataSource {
        let domain = domain_of(url).unwrap_or_default();

        self.sources
            .iter()
            .find(|s| s.can_handle(&domain))
            .map(|s| s.as_ref())
            .unwrap_or(&self.fallback)
    }

    pub fn select(&self, url: &str) -> SelectedSource<'_> {
        SelectedSource {
            source: self.find_source(url),
            url: url.to_string(),
        }
    }

    /// Extract metadata for `url` with whichever source claims it
    pub fn extract(&self, url: &str) -> BookmarkResult<Extraction> {
        self.select(url).extract()
    }

    /// Like `extract`, but a URL its handler rejects still yields generic
    /// metadata tagged with the error. Other failures propagate.
    pub fn extract_or_generic(&self, url: &str) -> BookmarkResult<Extraction> {
        match self.extract(url) {
            Err(BookmarkError::Extraction(error)) => {
                tracing::warn!(url, %error, "metadata extraction failed");
                Ok(Extraction::degraded(Metadata::new(BookmarkType::Generic), error))
            }
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::BookmarkError;
    use crate::http::MockHttpTransport;

    fn registry() -> SourceRegistry {
        SourceRegistry::with_transport(Arc::new(MockHttpTransport::new()))
    }

    #[test]
    fn test_domain_of() {
        assert_eq!(
            domain_of("https://WWW.YouTube.com/watch?v=x").as_deref(),
            Some("www.youtube.com")
        );
        assert_eq!(domain_of("reddit.com/r/rust").as_deref(), Some("reddit.com"));
        assert_eq!(domain_of("").as_deref(), None);
    }

    #[test]
    fn test_youtube_detected_first() {
        let registry = registry();

        let youtube_urls = [
            "https://www.youtube.com/watch?v=abc",
            "https://youtu.be/abc",
            "https://m.youtube.com/shorts/abc",
            "https://WWW.YOUTUBE.COM/live/abc",
        ];

        for url in youtube_urls {
            assert_eq!(
                registry.select(url).bookmark_type(),
                BookmarkType::Youtube,
                "URL {} should be detected as YouTube",
                url
            );
        }
    }

    #[test]
    fn test_reddit_detected() {
        let registry = registry();

        for url in [
            "https://reddit.com/r/Python/comments/abc123/title/",
            "https://old.reddit.com/r/rust/",
        ] {
            assert_eq!(registry.select(url).bookmark_type(), BookmarkType::Reddit);
        }
    }

    #[test]
    fn test_fallback_to_article() {
        let registry = registry();

        for url in [
            "https://example.com/post",
            "https://blog.rust-lang.org/2024/01/01/x.html",
            "not a url at all",
        ] {
            assert_eq!(registry.select(url).bookmark_type(), BookmarkType::Article);
        }
    }

    #[test]
    fn test_selected_source_keeps_url() {
        let registry = registry();
        let selected = registry.select("https://youtu.be/abc");
        assert_eq!(selected.url(), "https://youtu.be/abc");
    }

    #[test]
    fn test_structural_mismatch_raises_without_request() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(0);
        let registry = SourceRegistry::with_transport(Arc::new(transport));

        let result = registry.extract("https://www.reddit.com/r/rust/");
        assert!(matches!(result, Err(BookmarkError::Extraction(_))));

        let result = registry.extract("https://www.youtube.com/feed/subscriptions");
        assert!(matches!(result, Err(BookmarkError::Extraction(_))));
    }

    #[test]
    fn test_rejected_url_degrades_to_generic_without_request() {
        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(0);
        let registry = SourceRegistry::with_transport(Arc::new(transport));

        let extraction = registry
            .extract_or_generic("https://www.reddit.com/r/rust/")
            .unwrap();

        assert!(extraction.is_degraded());
        assert_eq!(extraction.metadata().bookmark_type, BookmarkType::Generic);
        assert!(extraction.metadata().title.is_none());

        let metadata = extraction.into_metadata();
        assert!(metadata.data["error"]
            .as_str()
            .unwrap()
            .contains("Invalid Reddit URL format"));
    }

    #[test]
    fn test_extract_or_generic_propagates_other_errors() {
        let mut registry = registry();
        registry.register(Box::new(BrokenSource));

        let result = registry.extract_or_generic("https://broken.test/page");
        assert!(matches!(result, Err(BookmarkError::InvalidUrl(_))));
    }

    struct BrokenSource;

    impl MetadataSource for BrokenSource {
        fn bookmark_type(&self) -> BookmarkType {
            BookmarkType::Generic
        }

        fn can_handle(&self, domain: &str) -> bool {
            domain == "broken.test"
        }

        fn extract(&self, url: &str) -> BookmarkResult<Extraction> {
            Err(BookmarkError::InvalidUrl(url.to_string()))
        }
    }

    struct StubSource;

    impl MetadataSource for StubSource {
        fn bookmark_type(&self) -> BookmarkType {
            BookmarkType::Generic
        }

        fn can_handle(&self, domain: &str) -> bool {
            domain == "stub.test"
        }

        fn extract(&self, _url: &str) -> BookmarkResult<Extraction> {
            Ok(Extraction::Complete(Metadata::new(BookmarkType::Generic)))
        }
    }

    #[test]
    fn test_registered_source_precedes_fallback() {
        let mut registry = registry();
        registry.register(Box::new(StubSource));

        assert_eq!(
            registry.select("https://stub.test/x").bookmark_type(),
            BookmarkType::Generic
        );
        assert_eq!(
            registry.select("https://other.test/x").bookmark_type(),
            BookmarkType::Article
        );
    }
}
