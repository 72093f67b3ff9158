use crate::domain::{BookmarkType, Extraction};
use crate::errors::BookmarkResult;

pub trait MetadataSource: Send + Sync {
    /// Bookmark type this source produces on success
    fn bookmark_type(&self) -> BookmarkType;

    /// Check if this source handles URLs on the given lowercased host
    fn can_handle(&self, domain: &str) -> bool;

    /// Scrape metadata for `url`.
    ///
    /// Fails only when the URL doesn't have the shape this source needs,
    /// and always before any request is made. Network and parse failures
    /// come back as [`Extraction::Degraded`].
    fn extract(&self, url: &str) -> BookmarkResult<Extraction>;
}
