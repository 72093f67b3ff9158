use thiserror::Error;

#[derive(Error, Debug)]
pub enum BookmarkError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    // Client-side contract violations
    #[error("Validation failed: {0}")]
    Validation(String),

    // Remote store errors
    #[error("Bookmark not found: {0}")]
    NotFound(String),

    #[error("Storage request failed: {0}")]
    Storage(String),

    // URL does not fit the handler's expected shape
    #[error("Extraction failed: {0}")]
    Extraction(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    // Network errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    // Parsing errors
    #[error("Parsing failed: {0}")]
    Parse(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // User input errors
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl BookmarkError {
    /// True for errors raised by configuration or credential resolution
    pub fn is_config(&self) -> bool {
        matches!(self, BookmarkError::Config(_) | BookmarkError::MissingEnvVar(_))
    }
}

pub type BookmarkResult<T> = Result<T, BookmarkError>;
