use std::sync::Arc;

use serde_json::json;

use crate::domain::{BookmarkRecord, BookmarkType, Content};
use crate::errors::BookmarkResult;
use crate::http::HttpTransport;
use crate::sources::{extract_video_id, ArticleSource, TranscriptFetcher};
use crate::storage::normalizer::{self, OperationKind};
use crate::storage::ResolvedCollection;

pub const TRANSCRIPT_SOURCE: &str = "youtube_transcript";
pub const ARTICLE_SOURCE: &str = "article";

/// What a crawl stored on the bookmark.
#[derive(Debug, Clone, PartialEq)]
pub enum CrawlOutcome {
    Extracted(Content),
    /// Extraction failed; the stored content carries the error
    Degraded(Content),
}

impl CrawlOutcome {
    pub fn content(&self) -> &Content {
        match self {
            CrawlOutcome::Extracted(content) | CrawlOutcome::Degraded(content) => content,
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, CrawlOutcome::Degraded(_))
    }
}

/// Attaches full text (video transcript or article body) to stored bookmarks.
pub struct CrawlService {
    collection: ResolvedCollection,
    transcripts: TranscriptFetcher,
    articles: ArticleSource,
}

impl CrawlService {
    pub fn new(collection: ResolvedCollection, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            collection,
            transcripts: TranscriptFetcher::new(transport.clone()),
            articles: ArticleSource::new(transport),
        }
    }

    /// Read the bookmark, extract its text and write it back under `content`.
    ///
    /// Extraction problems end up in the stored content; only storage
    /// failures are returned as errors.
    pub fn crawl(&self, object_id: &str) -> BookmarkResult<CrawlOutcome> {
        let collection_id = self.collection.collection_id();
        let kind = self.collection.kind();

        let raw = self.collection.backend.read(collection_id, object_id)?;
        let bookmark = normalizer::normalize(&raw, kind, OperationKind::Read)?;

        let outcome = match bookmark.bookmark_type {
            BookmarkType::Youtube => self.transcript_content(&bookmark),
            _ => self.article_content(&bookmark),
        };

        if let CrawlOutcome::Degraded(content) = &outcome {
            tracing::warn!(object_id, error = ?content.error, "crawl degraded");
        }

        let payload = normalizer::content_update(&raw, kind, outcome.content())?;
        self.collection
            .backend
            .update(collection_id, object_id, &payload)?;

        Ok(outcome)
    }

    fn transcript_content(&self, bookmark: &BookmarkRecord) -> CrawlOutcome {
        let video_id = match bookmark.data_str("video_id") {
            Some(id) => Ok(id.to_string()),
            None => extract_video_id(&bookmark.url),
        };

        match video_id.and_then(|id| self.transcripts.fetch(&id)) {
            Ok(transcript) => CrawlOutcome::Extracted(
                Content::extracted(transcript.text, TRANSCRIPT_SOURCE)
                    .with_extra("segments", json!(transcript.segments)),
            ),
            Err(e) => CrawlOutcome::Degraded(Content::failed(
                TRANSCRIPT_SOURCE,
                "extracting transcript",
                e.to_string(),
            )),
        }
    }

    fn article_content(&self, bookmark: &BookmarkRecord) -> CrawlOutcome {
        match self.articles.fetch(&bookmark.url) {
            Ok(article) => CrawlOutcome::Extracted(
                Content::extracted(article.text, ARTICLE_SOURCE)
                    .with_extra("summary", json!(article.description.unwrap_or_default()))
                    .with_extra("keywords", json!(article.keywords))
                    .with_extra("html", json!(article.html)),
            ),
            Err(e) => CrawlOutcome::Degraded(Content::failed(
                ARTICLE_SOURCE,
                "extracting article",
                e.to_string(),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use mockall::predicate::*;
    use serde_json::Value;

    use crate::domain::{BackendKind, CollectionConfig};
    use crate::errors::BookmarkError;
    use crate::http::{HttpResponse, MockHttpTransport};
    use crate::storage::traits::MockStorageBackend;

    fn service(
        backend: MockStorageBackend,
        kind: BackendKind,
        transport: MockHttpTransport,
    ) -> CrawlService {
        CrawlService::new(
            ResolvedCollection {
                backend: Arc::new(backend),
                collection: CollectionConfig {
                    name: "reading".to_string(),
                    backend: kind,
                    remote_id: "col-1".to_string(),
                    categories: Vec::new(),
                },
            },
            Arc::new(transport),
        )
    }

    fn jsonbin_bin(record: Value) -> Value {
        json!({"record": record, "metadata": {"id": "bin-1", "private": true}})
    }

    fn article_page() -> HttpResponse {
        HttpResponse::new(
            200,
            r#"<html><head><meta name="description" content="Short."><meta name="keywords" content="a,b"></head><body><p>Body text.</p></body></html>"#,
        )
    }

    #[test]
    fn test_article_crawl_replaces_whole_jsonbin_document() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_read()
            .with(eq("col-1"), eq("bin-1"))
            .times(1)
            .returning(|_, _| {
                Ok(jsonbin_bin(json!({
                    "url": "https://example.com/a",
                    "type": "article",
                    "title": "A",
                    "category": "tech"
                })))
            });
        backend
            .expect_update()
            .withf(|_, object_id, data| {
                object_id == "bin-1"
                    && data["url"] == "https://example.com/a"
                    && data["title"] == "A"
                    && data["category"] == "tech"
                    && data["content"]["source"] == "article"
                    && data["content"]["text"] == "Body text."
                    && data["content"]["summary"] == "Short."
                    && data["content"]["keywords"] == json!(["a", "b"])
            })
            .times(1)
            .returning(|_, _, data| Ok(json!({"record": data.clone()})));

        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.url == "https://example.com/a")
            .times(1)
            .returning(|_| Ok(article_page()));

        let outcome = service(backend, BackendKind::JsonBin, transport)
            .crawl("bin-1")
            .unwrap();

        assert!(!outcome.is_degraded());
        assert_eq!(outcome.content().text, "Body text.");
    }

    #[test]
    fn test_supabase_crawl_patches_only_content() {
        let mut backend = MockStorageBackend::new();
        backend.expect_read().returning(|_, _| {
            Ok(json!({"id": 4, "url": "https://example.com/a", "type": "generic", "collection_id": "col-1"}))
        });
        backend
            .expect_update()
            .withf(|_, object_id, data| {
                let keys: Vec<&String> = data.as_object().unwrap().keys().collect();
                object_id == "4" && keys == vec!["content"]
            })
            .times(1)
            .returning(|_, _, data| Ok(json!([data.clone()])));

        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .returning(|_| Ok(article_page()));

        let outcome = service(backend, BackendKind::Supabase, transport)
            .crawl("4")
            .unwrap();
        assert_eq!(outcome.content().source, ARTICLE_SOURCE);
    }

    #[test]
    fn test_unreachable_article_stores_error_content() {
        let mut backend = MockStorageBackend::new();
        backend.expect_read().returning(|_, _| {
            Ok(jsonbin_bin(json!({"url": "https://example.com/a", "type": "article"})))
        });
        backend
            .expect_update()
            .withf(|_, _, data| {
                data["content"]["source"] == "article"
                    && data["content"]["error"].is_string()
                    && data["content"]["text"]
                        .as_str()
                        .map(|t| t.starts_with("Error extracting article:"))
                        .unwrap_or(false)
            })
            .times(1)
            .returning(|_, _, data| Ok(data.clone()));

        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .returning(|_| Ok(HttpResponse::new(500, "oops")));

        let outcome = service(backend, BackendKind::JsonBin, transport)
            .crawl("bin-1")
            .unwrap();
        assert!(outcome.is_degraded());
        assert!(outcome.content().is_error());
    }

    #[test]
    fn test_youtube_crawl_stores_transcript() {
        let mut backend = MockStorageBackend::new();
        backend.expect_read().returning(|_, _| {
            Ok(jsonbin_bin(json!({
                "url": "https://youtu.be/abc",
                "type": "youtube",
                "data": {"video_id": "abc"}
            })))
        });
        backend
            .expect_update()
            .withf(|_, _, data| {
                data["content"]["source"] == TRANSCRIPT_SOURCE
                    && data["content"]["text"] == "Hi there"
                    && data["content"]["segments"][1]["start"] == 1.5
                    && data["data"]["video_id"] == "abc"
            })
            .times(1)
            .returning(|_, _, data| Ok(data.clone()));

        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .withf(|req| req.url == "https://www.youtube.com/watch?v=abc")
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"x = {"captionTracks":[{"baseUrl":"https://www.youtube.com/api/timedtext?v=abc","languageCode":"en"}]};"#,
                ))
            });
        transport
            .expect_execute()
            .withf(|req| req.url == "https://www.youtube.com/api/timedtext?v=abc")
            .times(1)
            .returning(|_| {
                Ok(HttpResponse::new(
                    200,
                    r#"<transcript><text start="0" dur="1.5">Hi</text><text start="1.5" dur="1">there</text></transcript>"#,
                ))
            });

        let outcome = service(backend, BackendKind::JsonBin, transport)
            .crawl("bin-1")
            .unwrap();
        assert!(!outcome.is_degraded());
        assert_eq!(outcome.content().extra["segments"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn test_youtube_without_captions_degrades() {
        let mut backend = MockStorageBackend::new();
        backend.expect_read().returning(|_, _| {
            Ok(jsonbin_bin(json!({"url": "https://www.youtube.com/watch?v=abc", "type": "youtube"})))
        });
        backend
            .expect_update()
            .withf(|_, _, data| data["content"]["source"] == TRANSCRIPT_SOURCE)
            .times(1)
            .returning(|_, _, data| Ok(data.clone()));

        let mut transport = MockHttpTransport::new();
        transport
            .expect_execute()
            .times(1)
            .returning(|_| Ok(HttpResponse::new(200, "<html></html>")));

        let outcome = service(backend, BackendKind::JsonBin, transport)
            .crawl("bin-1")
            .unwrap();

        assert!(outcome.is_degraded());
        assert!(outcome
            .content()
            .text
            .starts_with("Error extracting transcript:"));
    }

    #[test]
    fn test_read_failure_is_returned_without_update() {
        let mut backend = MockStorageBackend::new();
        backend
            .expect_read()
            .returning(|_, id| Err(BookmarkError::NotFound(id.to_string())));
        backend.expect_update().times(0);

        let mut transport = MockHttpTransport::new();
        transport.expect_execute().times(0);

        let result = service(backend, BackendKind::JsonBin, transport).crawl("missing");
        assert!(matches!(result, Err(BookmarkError::NotFound(_))));
    }
}
