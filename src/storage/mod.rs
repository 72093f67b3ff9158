pub mod jsonbin;
pub mod manager;
pub mod normalizer;
pub mod supabase;
pub mod traits;

pub use jsonbin::JsonBinBackend;
pub use manager::{ResolvedCollection, StorageManager};
pub use normalizer::{normalize, OperationKind};
pub use supabase::SupabaseBackend;
pub use traits::{RawRecord, StorageBackend};
