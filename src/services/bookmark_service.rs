use crate::domain::{BookmarkRecord, CollectionConfig, NewBookmark};
use crate::errors::{BookmarkError, BookmarkResult};
use crate::sources::text::truncate;
use crate::storage::jsonbin::MAX_NAME_LENGTH;
use crate::storage::normalizer::{self, OperationKind};
use crate::storage::ResolvedCollection;

/// Bookmark operations against one resolved collection.
pub struct BookmarkService {
    collection: ResolvedCollection,
}

impl BookmarkService {
    pub fn new(collection: ResolvedCollection) -> Self {
        Self { collection }
    }

    pub fn collection(&self) -> &CollectionConfig {
        &self.collection.collection
    }

    /// Store a new bookmark.
    /// The category must belong to the collection's category set.
    pub fn add(&self, bookmark: NewBookmark) -> BookmarkResult<BookmarkRecord> {
        if bookmark.url.trim().is_empty() {
            return Err(BookmarkError::Validation("URL is required".to_string()));
        }

        if let Some(category) = &bookmark.category {
            let collection = self.collection();
            if !collection.allows_category(category) {
                return Err(BookmarkError::Validation(format!(
                    "Category '{}' is not one of: {}",
                    category,
                    collection.categories.join(", ")
                )));
            }
        }

        let name = Self::display_name(&bookmark);
        let document = normalizer::create_document(&bookmark);

        let raw = self.collection.backend.create(
            self.collection.collection_id(),
            &document,
            Some(name),
        )?;

        tracing::debug!(collection = %self.collection().name, url = %bookmark.url, "bookmark created");
        normalizer::normalize(&raw, self.collection.kind(), OperationKind::Create)
    }

    /// Fetch a single bookmark by id
    pub fn show(&self, object_id: &str) -> BookmarkResult<BookmarkRecord> {
        let raw = self
            .collection
            .backend
            .read(self.collection.collection_id(), object_id)?;
        normalizer::normalize(&raw, self.collection.kind(), OperationKind::Read)
    }

    pub fn delete(&self, object_id: &str) -> BookmarkResult<()> {
        self.collection
            .backend
            .delete(self.collection.collection_id(), object_id)?;
        Ok(())
    }

    /// One page of bookmarks, continuing after `cursor` when given
    pub fn list_page(
        &self,
        ascending: bool,
        cursor: Option<String>,
    ) -> BookmarkResult<Vec<BookmarkRecord>> {
        let raw = self
            .collection
            .backend
            .list(self.collection.collection_id(), ascending, cursor)?;
        normalizer::normalize_page(&raw, self.collection.kind())
    }

    /// Walk every page in order.
    ///
    /// Stops on an empty page or on a page shorter than the backend's page
    /// size; the last id of each page is the cursor for the next.
    pub fn list_all(&self, ascending: bool) -> BookmarkResult<Vec<BookmarkRecord>> {
        let page_size = self.collection.backend.page_size();
        let mut bookmarks: Vec<BookmarkRecord> = Vec::new();
        let mut cursor: Option<String> = None;

        loop {
            let page = self.list_page(ascending, cursor.clone())?;
            let page_len = page.len();

            let next = match page.last() {
                Some(last) if !last.id.is_empty() => last.id.clone(),
                _ => {
                    bookmarks.extend(page);
                    break;
                }
            };

            bookmarks.extend(page);

            // A repeated cursor would loop forever
            if page_len < page_size || cursor.as_deref() == Some(next.as_str()) {
                break;
            }
            cursor = Some(next);
        }

        Ok(bookmarks)
    }

    /// Name stored with the bookmark: explicit name, extracted title, or the URL
    fn display_name(bookmark: &NewBookmark) -> String {
        if let Some(name) = bookmark.name.as_deref().filter(|n| !n.is_empty()) {
            return name.to_string();
        }

        let fallback = bookmark
            .metadata
            .title
            .as_deref()
            .filter(|t| !t.is_empty())
            .unwrap_or(&bookmark.url);
        truncate(fallback, MAX_NAME_LENGTH)
    }
}
