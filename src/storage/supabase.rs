use std::sync::Arc;

use serde_json::Value;
use url::Url;

use crate::domain::BackendKind;
use crate::errors::{BookmarkError, BookmarkResult};
use crate::http::{HttpRequest, HttpTransport};
use crate::storage::traits::{RawRecord, StorageBackend};

pub const BOOKMARKS_TABLE: &str = "bookmarks";
pub const SUPABASE_PAGE_SIZE: usize = 50;

/// Supabase: one `bookmarks` table behind PostgREST, rows scoped by `collection_id`.
pub struct SupabaseBackend {
    transport: Arc<dyn HttpTransport>,
    table_url: Url,
    headers: Vec<(String, String)>,
}

impl SupabaseBackend {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        anon_key: &str,
        project_url: &str,
    ) -> BookmarkResult<Self> {
        let table_url = Url::parse(&format!(
            "{}/rest/v1/{}",
            project_url.trim_end_matches('/'),
            BOOKMARKS_TABLE
        ))
        .map_err(|e| BookmarkError::Config(format!("Invalid SUPABASE_URL: {}", e)))?;

        Ok(Self {
            transport,
            table_url,
            headers: vec![
                ("apikey".to_string(), anon_key.to_string()),
                ("Authorization".to_string(), format!("Bearer {}", anon_key)),
                ("Prefer".to_string(), "return=representation".to_string()),
            ],
        })
    }

    /// Table URL filtered down to one row of one collection
    fn row_url(&self, collection_id: &str, object_id: &str) -> String {
        let mut url = self.table_url.clone();
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("id", &format!("eq.{}", object_id))
            .append_pair("collection_id", &format!("eq.{}", collection_id));
        url.into()
    }

    fn rows(&self, request: HttpRequest, action: &str) -> BookmarkResult<Vec<RawRecord>> {
        let response = self.transport.execute(request.headers(&self.headers))?;

        if !response.is_success() {
            return Err(BookmarkError::Storage(format!(
                "Failed to {}: {}",
                action, response.body
            )));
        }

        response.json()
    }

    /// First returned row, or NotFound when the filter matched nothing
    fn single_row(
        &self,
        request: HttpRequest,
        action: &str,
        object_id: &str,
    ) -> BookmarkResult<RawRecord> {
        self.rows(request, action)?
            .into_iter()
            .next()
            .ok_or_else(|| BookmarkError::NotFound(format!("Bookmark not found: {}", object_id)))
    }
}

impl StorageBackend for SupabaseBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Supabase
    }

    fn page_size(&self) -> usize {
        SUPABASE_PAGE_SIZE
    }

    fn create(
        &self,
        collection_id: &str,
        data: &Value,
        name: Option<String>,
    ) -> BookmarkResult<RawRecord> {
        let mut row = data
            .as_object()
            .cloned()
            .ok_or_else(|| BookmarkError::Validation("Bookmark data must be an object".to_string()))?;

        if let Some(name) = name.filter(|n| !n.is_empty()) {
            row.insert("name".to_string(), Value::String(name));
        }
        row.insert(
            "collection_id".to_string(),
            Value::String(collection_id.to_string()),
        );

        let request = HttpRequest::post(self.table_url.as_str()).json(Value::Object(row));

        self.rows(request, "create bookmark")?
            .into_iter()
            .next()
            .ok_or_else(|| BookmarkError::Storage("Failed to create bookmark".to_string()))
    }

    fn read(&self, collection_id: &str, object_id: &str) -> BookmarkResult<RawRecord> {
        let request = HttpRequest::get(self.row_url(collection_id, object_id));
        self.single_row(request, "read bookmark", object_id)
    }

    fn update(
        &self,
        collection_id: &str,
        object_id: &str,
        data: &Value,
    ) -> BookmarkResult<RawRecord> {
        // PATCH only touches the columns present in `data`
        let request = HttpRequest::patch(self.row_url(collection_id, object_id)).json(data.clone());
        self.single_row(request, "update bookmark", object_id)
    }

    fn delete(&self, collection_id: &str, object_id: &str) -> BookmarkResult<RawRecord> {
        let request = HttpRequest::delete(self.row_url(collection_id, object_id));
        self.single_row(request, "delete bookmark", object_id)
    }

    fn list(
        &self,
        collection_id: &str,
        ascending: bool,
        cursor: Option<String>,
    ) -> BookmarkResult<Vec<RawRecord>> {
        let mut url = self.table_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("select", "*")
                .append_pair("collection_id", &format!("eq.{}", collection_id))
                .append_pair(
                    "order",
                    if ascending { "created_at.asc" } else { "created_at.desc" },
                )
                .append_pair("limit", &SUPABASE_PAGE_SIZE.to_string());

            if let Some(last_id) = cursor.as_deref().filter(|c| !c.is_empty()) {
                let op = if ascending { "gt" } else { "lt" };
                query.append_pair("id", &format!("{}.{}", op, last_id));
            }
        }

        self.rows(HttpRequest::get(String::from(url)), "list bookmarks")
    }
}
