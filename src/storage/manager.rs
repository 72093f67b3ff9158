use std::sync::{Arc, OnceLock};

use crate::config::{Config, Credentials};
use crate::domain::{BackendKind, CollectionConfig};
use crate::errors::BookmarkResult;
use crate::http::HttpTransport;
use crate::storage::jsonbin::JsonBinBackend;
use crate::storage::supabase::SupabaseBackend;
use crate::storage::traits::StorageBackend;

/// A collection name resolved to the store that holds it.
#[derive(Clone)]
pub struct ResolvedCollection {
    pub backend: Arc<dyn StorageBackend>,
    pub collection: CollectionConfig,
}

impl ResolvedCollection {
    pub fn collection_id(&self) -> &str {
        &self.collection.remote_id
    }

    pub fn kind(&self) -> BackendKind {
        self.collection.backend
    }
}

/// Maps logical collection names to backends.
///
/// Each backend kind is built on first use and then shared by every
/// collection configured with that kind.
pub struct StorageManager {
    config: Config,
    credentials: Credentials,
    transport: Arc<dyn HttpTransport>,
    jsonbin: OnceLock<Arc<dyn StorageBackend>>,
    supabase: OnceLock<Arc<dyn StorageBackend>>,
}

impl StorageManager {
    pub fn new(config: Config, credentials: Credentials, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            config,
            credentials,
            transport,
            jsonbin: OnceLock::new(),
            supabase: OnceLock::new(),
        }
    }

    pub fn collection(&self, collection_name: &str) -> BookmarkResult<CollectionConfig> {
        self.config.collection(collection_name)
    }

    pub fn get_backend(&self, collection_name: &str) -> BookmarkResult<Arc<dyn StorageBackend>> {
        let collection = self.collection(collection_name)?;
        self.backend_for(collection.backend)
    }

    pub fn resolve_collection_id(&self, collection_name: &str) -> BookmarkResult<String> {
        Ok(self.collection(collection_name)?.remote_id)
    }

    pub fn resolve(&self, collection_name: &str) -> BookmarkResult<ResolvedCollection> {
        let collection = self.collection(collection_name)?;
        let backend = self.backend_for(collection.backend)?;
        Ok(ResolvedCollection {
            backend,
            collection,
        })
    }

    fn backend_for(&self, kind: BackendKind) -> BookmarkResult<Arc<dyn StorageBackend>> {
        let cell = match kind {
            BackendKind::JsonBin => &self.jsonbin,
            BackendKind::Supabase => &self.supabase,
        };

        if let Some(backend) = cell.get() {
            return Ok(Arc::clone(backend));
        }

        let backend = self.build(kind)?;
        Ok(Arc::clone(cell.get_or_init(|| backend)))
    }

    /// Credentials are checked here so a missing key fails before any request
    fn build(&self, kind: BackendKind) -> BookmarkResult<Arc<dyn StorageBackend>> {
        tracing::debug!(backend = %kind, "initializing storage backend");

        let backend: Arc<dyn StorageBackend> = match kind {
            BackendKind::JsonBin => {
                let (api_key, access_key) = self.credentials.jsonbin()?;
                Arc::new(JsonBinBackend::new(
                    Arc::clone(&self.transport),
                    api_key,
                    access_key,
                ))
            }
            BackendKind::Supabase => {
                let (anon_key, url) = self.credentials.supabase()?;
                Arc::new(SupabaseBackend::new(
                    Arc::clone(&self.transport),
                    anon_key,
                    url,
                )?)
            }
        };

        Ok(backend)
    }
}
