pub mod article;
pub mod reddit;
pub mod registry;
pub mod text;
pub mod traits;
pub mod transcript;
pub mod youtube;

pub use article::{ArticleSource, ParsedArticle};
pub use registry::{domain_of, SelectedSource, SourceRegistry};
pub use traits::MetadataSource;
pub use transcript::{Transcript, TranscriptFetcher};
pub use youtube::extract_video_id;
