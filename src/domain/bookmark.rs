use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::Metadata;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BookmarkType {
    Youtube,
    Reddit,
    Article,
    #[default]
    Generic,
}

impl BookmarkType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookmarkType::Youtube => "youtube",
            BookmarkType::Reddit => "reddit",
            BookmarkType::Article => "article",
            BookmarkType::Generic => "generic",
        }
    }
}

impl std::str::FromStr for BookmarkType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "youtube" => Ok(BookmarkType::Youtube),
            "reddit" => Ok(BookmarkType::Reddit),
            "article" => Ok(BookmarkType::Article),
            "generic" => Ok(BookmarkType::Generic),
            _ => Err(format!("Unknown bookmark type: {}", s)),
        }
    }
}

impl std::fmt::Display for BookmarkType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Enrichment attached to a bookmark after the fact by the crawler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    pub text: String,
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Source-specific extras (transcript segments, keywords, raw html)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Content {
    pub fn extracted(text: String, source: &str) -> Self {
        Self {
            text,
            source: source.to_string(),
            error: None,
            extra: Map::new(),
        }
    }

    /// Content carrying an error tag in place of the extracted text
    pub fn failed(source: &str, what: &str, error: String) -> Self {
        Self {
            text: format!("Error {}: {}", what, error),
            source: source.to_string(),
            error: Some(error),
            extra: Map::new(),
        }
    }

    pub fn with_extra(mut self, key: &str, value: Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }

    /// First `max_chars` characters of the text, with an ellipsis when cut
    pub fn preview(&self, max_chars: usize) -> String {
        if self.text.chars().count() <= max_chars {
            return self.text.clone();
        }
        let head: String = self.text.chars().take(max_chars).collect();
        format!("{}...", head)
    }
}

/// Canonical, backend-agnostic bookmark shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BookmarkRecord {
    pub id: String,
    pub name: Option<String>,
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub author: Option<String>,
    pub thumbnail: Option<String>,
    pub category: Option<String>,
    pub note: Option<String>,
    #[serde(rename = "type")]
    pub bookmark_type: BookmarkType,
    pub data: Map<String, Value>,
    pub created_at: Option<DateTime<Utc>>,
    pub is_private: bool,
    pub content: Option<Content>,
}

impl BookmarkRecord {
    pub fn new(id: String, url: String) -> Self {
        Self {
            id,
            name: None,
            url,
            title: None,
            description: None,
            author: None,
            thumbnail: None,
            category: None,
            note: None,
            bookmark_type: BookmarkType::Generic,
            data: Map::new(),
            created_at: None,
            is_private: false,
            content: None,
        }
    }

    /// Label used in listings: name, then title, then the URL
    pub fn display_name(&self) -> &str {
        [self.name.as_deref(), self.title.as_deref()]
            .into_iter()
            .flatten()
            .find(|s| !s.is_empty())
            .unwrap_or(&self.url)
    }

    pub fn data_str(&self, key: &str) -> Option<&str> {
        self.data.get(key).and_then(Value::as_str)
    }
}

/// A bookmark about to be created. Its id and timestamp are assigned by
/// the backend.
#[derive(Debug, Clone)]
pub struct NewBookmark {
    pub url: String,
    pub name: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub note: Option<String>,
    pub metadata: Metadata,
}
