use serde::Serialize;
use serde_json::{Map, Value};

use super::BookmarkType;

/// Metadata scraped from a bookmarked URL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Metadata {
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    #[serde(rename = "type")]
    pub bookmark_type: BookmarkType,
    /// Source-specific extras (video_id, subreddit, score, full_text, ...)
    pub data: Map<String, Value>,
}

impl Metadata {
    pub fn new(bookmark_type: BookmarkType) -> Self {
        Self {
            bookmark_type,
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title.filter(|t| !t.is_empty());
        self
    }

    pub fn with_description(mut self, description: Option<String>) -> Self {
        self.description = description;
        self
    }

    pub fn with_author(mut self, author: Option<String>) -> Self {
        self.author = author.filter(|a| !a.is_empty());
        self
    }

    pub fn with_thumbnail(mut self, thumbnail: Option<String>) -> Self {
        self.thumbnail = thumbnail.filter(|t| !t.is_empty());
        self
    }

    pub fn with_data(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.data.insert(key.to_string(), value.into());
        self
    }
}

/// Outcome of running a metadata handler against a URL.
///
/// Remote failures never surface as errors: the handler falls back to a
/// minimal record and reports what went wrong alongside it.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    Complete(Metadata),
    Degraded { metadata: Metadata, error: String },
}

impl Extraction {
    pub fn degraded(metadata: Metadata, error: impl ToString) -> Self {
        Extraction::Degraded {
            metadata,
            error: error.to_string(),
        }
    }

    pub fn metadata(&self) -> &Metadata {
        match self {
            Extraction::Complete(metadata) => metadata,
            Extraction::Degraded { metadata, .. } => metadata,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Extraction::Complete(_) => None,
            Extraction::Degraded { error, .. } => Some(error),
        }
    }

    pub fn is_degraded(&self) -> bool {
        matches!(self, Extraction::Degraded { .. })
    }

    /// Metadata to persist; a degraded result keeps its error under `data.error`
    pub fn into_metadata(self) -> Metadata {
        match self {
            Extraction::Complete(metadata) => metadata,
            Extraction::Degraded { metadata, error } => metadata.with_data("error", error),
        }
    }
}
