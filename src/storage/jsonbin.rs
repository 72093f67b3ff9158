use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::BackendKind;
use crate::errors::{BookmarkError, BookmarkResult};
use crate::http::{HttpRequest, HttpResponse, HttpTransport};
use crate::storage::traits::{RawRecord, StorageBackend};

pub const JSONBIN_BASE_URL: &str = "https://api.jsonbin.io/v3";

/// Fixed by the collection listing endpoint
pub const JSONBIN_PAGE_SIZE: usize = 10;

/// Longest accepted `X-Bin-Name`, in characters
pub const MAX_NAME_LENGTH: usize = 128;

/// JsonBin.io: every bookmark is a private bin inside a bin collection.
pub struct JsonBinBackend {
    transport: Arc<dyn HttpTransport>,
    base_url: String,
    headers: Vec<(String, String)>,
}

impl JsonBinBackend {
    pub fn new(transport: Arc<dyn HttpTransport>, api_key: &str, access_key: &str) -> Self {
        Self::with_base_url(transport, api_key, access_key, JSONBIN_BASE_URL)
    }

    pub fn with_base_url(
        transport: Arc<dyn HttpTransport>,
        api_key: &str,
        access_key: &str,
        base_url: &str,
    ) -> Self {
        Self {
            transport,
            base_url: base_url.trim_end_matches('/').to_string(),
            headers: vec![
                ("X-Master-Key".to_string(), api_key.to_string()),
                ("X-Access-Key".to_string(), access_key.to_string()),
            ],
        }
    }

    fn validate_name(name: &str) -> BookmarkResult<()> {
        if name.chars().count() > MAX_NAME_LENGTH {
            return Err(BookmarkError::Validation(format!(
                "Name must be {} characters or less",
                MAX_NAME_LENGTH
            )));
        }
        Ok(())
    }

    fn send(&self, request: HttpRequest, action: &str) -> BookmarkResult<HttpResponse> {
        let response = self.transport.execute(request.headers(&self.headers))?;

        match response.status {
            200..=299 => Ok(response),
            404 => Err(BookmarkError::NotFound(response.body)),
            _ => Err(BookmarkError::Storage(format!(
                "Failed to {}: {}",
                action, response.body
            ))),
        }
    }

    fn send_json<T: DeserializeOwned>(
        &self,
        request: HttpRequest,
        action: &str,
    ) -> BookmarkResult<T> {
        self.send(request, action)?.json()
    }
}

impl StorageBackend for JsonBinBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::JsonBin
    }

    fn page_size(&self) -> usize {
        JSONBIN_PAGE_SIZE
    }

    fn create(
        &self,
        collection_id: &str,
        data: &Value,
        name: Option<String>,
    ) -> BookmarkResult<RawRecord> {
        let mut request = HttpRequest::post(format!("{}/b", self.base_url));

        if let Some(name) = name.as_deref().filter(|n| !n.is_empty()) {
            Self::validate_name(name)?;
            request = request.header("X-Bin-Name", name);
        }

        let request = request
            .header("X-Bin-Private", "true")
            .header("X-Collection-Id", collection_id)
            .json(data.clone());

        self.send_json(request, "create object")
    }

    fn read(&self, _collection_id: &str, object_id: &str) -> BookmarkResult<RawRecord> {
        let request = HttpRequest::get(format!("{}/b/{}/latest", self.base_url, object_id));
        self.send_json(request, "read object")
    }

    fn update(
        &self,
        _collection_id: &str,
        object_id: &str,
        data: &Value,
    ) -> BookmarkResult<RawRecord> {
        // PUT replaces the whole bin
        let request =
            HttpRequest::put(format!("{}/b/{}", self.base_url, object_id)).json(data.clone());
        self.send_json(request, "update object")
    }

    fn delete(&self, _collection_id: &str, object_id: &str) -> BookmarkResult<RawRecord> {
        let request = HttpRequest::delete(format!("{}/b/{}", self.base_url, object_id));
        self.send_json(request, "delete object")
    }

    fn list(
        &self,
        collection_id: &str,
        ascending: bool,
        cursor: Option<String>,
    ) -> BookmarkResult<Vec<RawRecord>> {
        let mut url = format!("{}/c/{}/bins", self.base_url, collection_id);
        if let Some(last_id) = cursor.as_deref().filter(|c| !c.is_empty()) {
            url = format!("{}/{}", url, last_id);
        }

        let mut request = HttpRequest::get(url);
        if ascending {
            request = request.header("X-Sort-Order", "ascending");
        }

        self.send_json(request, "list objects")
    }
}
