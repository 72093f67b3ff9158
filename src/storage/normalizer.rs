//! Translation between raw backend payloads and [`BookmarkRecord`].
//!
//! This is the only module that knows what JsonBin and Supabase responses
//! look like. JsonBin wraps a bin as `{record: {...}, metadata: {...}}` on
//! create/read/update/delete, while its collection listing returns flat
//! entries (`{record: "<bin id>", createdAt, private, snippetMeta}`).
//! Supabase returns plain table rows for everything.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde_json::{Map, Value};

use crate::domain::{BackendKind, BookmarkRecord, Content, NewBookmark};
use crate::errors::{BookmarkError, BookmarkResult};
use crate::storage::traits::RawRecord;

/// Row-level security keeps Supabase rows private to their owner
const SUPABASE_IS_PRIVATE: bool = true;

/// Document keys with a canonical home; anything else lands in `data`
const DOCUMENT_KEYS: &[&str] = &[
    "url",
    "title",
    "description",
    "text",
    "author",
    "thumbnail",
    "category",
    "note",
    "type",
    "data",
    "content",
    "name",
];

/// Supabase columns managed by the store itself
const SUPABASE_ROW_KEYS: &[&str] = &["id", "collection_id", "created_at"];

/// JsonBin list entry keys describing the bin rather than the bookmark
const JSONBIN_LIST_KEYS: &[&str] = &["record", "createdAt", "private", "snippetMeta"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    Create,
    Read,
    Update,
    Delete,
    List,
}

/// Map a raw backend response onto the canonical bookmark shape.
///
/// Missing optional fields come back as `None`/empty; only a payload that
/// isn't a JSON object at all is rejected.
pub fn normalize(
    raw: &RawRecord,
    backend: BackendKind,
    operation: OperationKind,
) -> BookmarkResult<BookmarkRecord> {
    let object = raw.as_object().ok_or_else(|| {
        BookmarkError::Storage(format!(
            "Unexpected {} response for {:?}: {}",
            backend, operation, raw
        ))
    })?;

    let record = match (backend, operation) {
        (BackendKind::JsonBin, OperationKind::List) => jsonbin_list_entry(object),
        (BackendKind::JsonBin, _) => jsonbin_bin(object),
        (BackendKind::Supabase, _) => supabase_row(object),
    };

    Ok(record)
}

/// Normalize a whole listing page, preserving order
pub fn normalize_page(
    raw: &[RawRecord],
    backend: BackendKind,
) -> BookmarkResult<Vec<BookmarkRecord>> {
    raw.iter()
        .map(|item| normalize(item, backend, OperationKind::List))
        .collect()
}

/// Document sent to `create` for a new bookmark. Identifiers and
/// timestamps are left to the backend.
pub fn create_document(bookmark: &NewBookmark) -> Value {
    let metadata = &bookmark.metadata;
    let mut doc = Map::new();

    doc.insert("url".to_string(), Value::String(bookmark.url.clone()));
    insert_opt(&mut doc, "description", &bookmark.description);
    insert_opt(&mut doc, "category", &bookmark.category);
    insert_opt(&mut doc, "note", &bookmark.note);
    doc.insert(
        "type".to_string(),
        Value::String(metadata.bookmark_type.as_str().to_string()),
    );
    insert_opt(&mut doc, "title", &metadata.title);
    insert_opt(&mut doc, "author", &metadata.author);
    insert_opt(&mut doc, "thumbnail", &metadata.thumbnail);
    doc.insert("data".to_string(), Value::Object(metadata.data.clone()));

    Value::Object(doc)
}

/// Payload for `update` that attaches `content` and leaves every other
/// stored field as it was.
///
/// JsonBin replaces the whole bin, so the stored document from `raw`
/// (a read response) is sent back with `content` set. Supabase patches
/// columns, so only `content` is sent.
pub fn content_update(
    raw: &RawRecord,
    backend: BackendKind,
    content: &Content,
) -> BookmarkResult<Value> {
    let content = serde_json::to_value(content)?;

    match backend {
        BackendKind::JsonBin => {
            let mut document = raw
                .get("record")
                .and_then(Value::as_object)
                .cloned()
                .ok_or_else(|| {
                    BookmarkError::Storage("JsonBin response has no record document".to_string())
                })?;
            document.insert("content".to_string(), content);
            Ok(Value::Object(document))
        }
        BackendKind::Supabase => {
            let mut patch = Map::new();
            patch.insert("content".to_string(), content);
            Ok(Value::Object(patch))
        }
    }
}

fn jsonbin_bin(object: &Map<String, Value>) -> BookmarkRecord {
    let empty = Map::new();
    let metadata = object
        .get("metadata")
        .and_then(Value::as_object)
        .unwrap_or(&empty);

    // update responses carry the bin id as parentId
    let id = metadata
        .get("id")
        .or_else(|| metadata.get("parentId"))
        .and_then(id_string)
        .unwrap_or_default();

    let mut bookmark = BookmarkRecord::new(id, String::new());
    bookmark.name = string_field(metadata, "name");
    bookmark.created_at = metadata.get("createdAt").and_then(timestamp);
    bookmark.is_private = metadata
        .get("private")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    if let Some(document) = object.get("record").and_then(Value::as_object) {
        apply_document(&mut bookmark, document, &[]);
    }

    bookmark
}

fn jsonbin_list_entry(object: &Map<String, Value>) -> BookmarkRecord {
    let id = object.get("record").and_then(id_string).unwrap_or_default();

    let mut bookmark = BookmarkRecord::new(id, String::new());
    bookmark.created_at = object.get("createdAt").and_then(timestamp);
    bookmark.is_private = object
        .get("private")
        .and_then(Value::as_bool)
        .unwrap_or(false);

    // Bookmark fields co-located with the bin metadata, when present
    apply_document(&mut bookmark, object, JSONBIN_LIST_KEYS);

    if let Some(name) = object
        .get("snippetMeta")
        .and_then(Value::as_object)
        .and_then(|meta| string_field(meta, "name"))
    {
        bookmark.name = Some(name);
    }

    bookmark
}

fn supabase_row(row: &Map<String, Value>) -> BookmarkRecord {
    let id = row.get("id").and_then(id_string).unwrap_or_default();

    let mut bookmark = BookmarkRecord::new(id, String::new());
    bookmark.created_at = row.get("created_at").and_then(timestamp);
    bookmark.is_private = SUPABASE_IS_PRIVATE;

    apply_document(&mut bookmark, row, SUPABASE_ROW_KEYS);

    bookmark
}

/// Copy bookmark fields out of a stored document. Unknown keys (older
/// bookmarks stored source extras at the top level) are folded into `data`.
fn apply_document(bookmark: &mut BookmarkRecord, document: &Map<String, Value>, skip: &[&str]) {
    bookmark.url = string_field(document, "url").unwrap_or_default();
    bookmark.title = string_field(document, "title");
    bookmark.description =
        string_field(document, "description").or_else(|| string_field(document, "text"));
    bookmark.author = string_field(document, "author");
    bookmark.thumbnail = string_field(document, "thumbnail");
    bookmark.category = string_field(document, "category");
    bookmark.note = string_field(document, "note");
    bookmark.bookmark_type = string_field(document, "type")
        .and_then(|t| t.parse().ok())
        .unwrap_or_default();
    bookmark.content = document
        .get("content")
        .filter(|c| c.is_object())
        .and_then(|c| serde_json::from_value(c.clone()).ok());

    if let Some(name) = string_field(document, "name") {
        bookmark.name = Some(name);
    }

    if let Some(data) = document.get("data").and_then(Value::as_object) {
        bookmark.data = data.clone();
    }

    for (key, value) in document {
        if DOCUMENT_KEYS.contains(&key.as_str()) || skip.contains(&key.as_str()) {
            continue;
        }
        bookmark
            .data
            .entry(key.clone())
            .or_insert_with(|| value.clone());
    }
}

fn insert_opt(doc: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        doc.insert(key.to_string(), Value::String(value.clone()));
    }
}

fn string_field(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Ids are strings on JsonBin and integers on Supabase
fn id_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn timestamp(value: &Value) -> Option<DateTime<Utc>> {
    let s = value.as_str()?;

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }

    // `timestamp without time zone` columns come back without an offset
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}
