use serde_json::Value;

use crate::domain::BackendKind;
use crate::errors::BookmarkResult;

/// A backend's response payload, exactly as it came off the wire.
/// Only `storage::normalizer` looks inside one.
pub type RawRecord = Value;

/// Uniform CRUD + list contract over one remote object store.
///
/// `update` keeps the backend's own semantics: full replace on JsonBin,
/// partial column update on Supabase. Callers must not assume a merge.
#[cfg_attr(test, mockall::automock)]
pub trait StorageBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    /// Records per `list` page; a shorter page means there is nothing after it
    fn page_size(&self) -> usize;

    fn create(
        &self,
        collection_id: &str,
        data: &Value,
        name: Option<String>,
    ) -> BookmarkResult<RawRecord>;

    fn read(&self, collection_id: &str, object_id: &str) -> BookmarkResult<RawRecord>;

    fn update(&self, collection_id: &str, object_id: &str, data: &Value)
        -> BookmarkResult<RawRecord>;

    fn delete(&self, collection_id: &str, object_id: &str) -> BookmarkResult<RawRecord>;

    /// One page in creation order. `cursor` is the id of the last record of
    /// the previous page; an empty page signals the end.
    fn list(
        &self,
        collection_id: &str,
        ascending: bool,
        cursor: Option<String>,
    ) -> BookmarkResult<Vec<RawRecord>>;
}
