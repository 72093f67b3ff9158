pub mod bookmark;
pub mod collection;
pub mod metadata;

pub use bookmark::{BookmarkRecord, BookmarkType, Content, NewBookmark};
pub use collection::{BackendKind, CollectionConfig};
pub use metadata::{Extraction, Metadata};
