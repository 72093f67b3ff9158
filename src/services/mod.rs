pub mod bookmark_service;
pub mod crawl_service;

pub use bookmark_service::BookmarkService;
pub use crawl_service::{CrawlOutcome, CrawlService};
