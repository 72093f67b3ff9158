use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use crate::domain::{BackendKind, CollectionConfig};
use crate::errors::{BookmarkError, BookmarkResult};

const DEFAULT_BACKEND: &str = "jsonbin";
const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    /// Categories shared by every collection that doesn't declare its own
    #[serde(default)]
    categories: Vec<String>,
    #[serde(default)]
    collections: BTreeMap<String, CollectionEntry>,
}

#[derive(Debug, Clone, Deserialize)]
struct CollectionEntry {
    #[serde(default)]
    backend: Option<String>,
    #[serde(deserialize_with = "deserialize_string_or_number")]
    id: String,
    #[serde(default)]
    categories: Option<Vec<String>>,
}

#[derive(Debug, Clone)]
pub struct Config {
    file: ConfigFile,
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> BookmarkResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            BookmarkError::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> BookmarkResult<Self> {
        let file: ConfigFile = serde_yaml::from_str(content)?;
        Ok(Self { file })
    }

    /// Resolve a collection by its logical name
    pub fn collection(&self, name: &str) -> BookmarkResult<CollectionConfig> {
        let entry = self
            .file
            .collections
            .get(name)
            .ok_or_else(|| {
                let available: Vec<&str> = self.collection_names().collect();
                BookmarkError::Config(format!(
                    "Collection not found: {} (configured: {})",
                    name,
                    available.join(", ")
                ))
            })?;

        let backend: BackendKind = entry
            .backend
            .as_deref()
            .unwrap_or(DEFAULT_BACKEND)
            .parse()
            .map_err(BookmarkError::Config)?;

        let categories = entry
            .categories
            .clone()
            .unwrap_or_else(|| self.file.categories.clone());

        Ok(CollectionConfig {
            name: name.to_string(),
            backend,
            remote_id: entry.id.clone(),
            categories,
        })
    }

    pub fn collection_names(&self) -> impl Iterator<Item = &str> {
        self.file.collections.keys().map(String::as_str)
    }
}

/// Secrets for the remote stores, read from the environment.
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub jsonbin_api_key: Option<String>,
    pub jsonbin_access_key: Option<String>,
    pub supabase_anon_key: Option<String>,
    pub supabase_url: Option<String>,
}

impl Credentials {
    /// Get the directory where the executable is located
    fn exe_dir() -> Option<std::path::PathBuf> {
        std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(|p| p.to_path_buf()))
    }

    /// Load `.env` files, then read the store credentials
    pub fn from_env() -> Self {
        // Try to load .env from executable's directory first
        if let Some(dir) = Self::exe_dir() {
            let env_path = dir.join(".env");
            if env_path.exists() {
                dotenvy::from_path(&env_path).ok();
            }
        }
        // Fall back to current directory
        dotenvy::dotenv().ok();

        Self {
            jsonbin_api_key: env_var("JSONBIN_API_KEY"),
            jsonbin_access_key: env_var("JSONBIN_ACCESS_KEY"),
            supabase_anon_key: env_var("SUPABASE_ANON_PASSWORD")
                .or_else(|| env_var("SUPABASE_ANON_KEY")),
            supabase_url: env_var("SUPABASE_URL"),
        }
    }

    /// (master key, access key)
    pub fn jsonbin(&self) -> BookmarkResult<(&str, &str)> {
        let api_key = require(&self.jsonbin_api_key, "JSONBIN_API_KEY")?;
        let access_key = require(&self.jsonbin_access_key, "JSONBIN_ACCESS_KEY")?;
        Ok((api_key, access_key))
    }

    /// (anon key, project url)
    pub fn supabase(&self) -> BookmarkResult<(&str, &str)> {
        let anon_key = require(&self.supabase_anon_key, "SUPABASE_ANON_PASSWORD")?;
        let url = require(&self.supabase_url, "SUPABASE_URL")?;
        Ok((anon_key, url))
    }
}

/// Request timeout applied to every outgoing HTTP call
pub fn http_timeout() -> Duration {
    let secs = std::env::var("BOOKMARKS_HTTP_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECS);
    Duration::from_secs(secs)
}

/// Remote ids may be written bare in YAML (`id: 1234`)
fn deserialize_string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    use serde::de::{self, Visitor};
    use std::fmt;

    struct StringOrNumberVisitor;

    impl<'de> Visitor<'de> for StringOrNumberVisitor {
        type Value = String;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a string or integer")
        }

        fn visit_i64<E>(self, v: i64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_u64<E>(self, v: u64) -> Result<String, E> {
            Ok(v.to_string())
        }

        fn visit_str<E>(self, v: &str) -> Result<String, E>
        where
            E: de::Error,
        {
            Ok(v.to_string())
        }
    }

    deserializer.deserialize_any(StringOrNumberVisitor)
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn require<'a>(value: &'a Option<String>, name: &str) -> BookmarkResult<&'a str> {
    value
        .as_deref()
        .ok_or_else(|| BookmarkError::MissingEnvVar(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
categories:
  - tech
  - news
collections:
  reading:
    backend: jsonbin
    id: 65f0c0ffee
  videos:
    backend: supabase
    id: videos
    categories: [music, talks]
  legacy:
    id: 1234
  broken:
    backend: dynamodb
    id: x
"#;

    #[test]
    fn test_collection_inherits_global_categories() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let reading = config.collection("reading").unwrap();

        assert_eq!(reading.backend, BackendKind::JsonBin);
        assert_eq!(reading.remote_id, "65f0c0ffee");
        assert_eq!(reading.categories, vec!["tech", "news"]);
    }

    #[test]
    fn test_collection_overrides_categories() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let videos = config.collection("videos").unwrap();

        assert_eq!(videos.backend, BackendKind::Supabase);
        assert_eq!(videos.categories, vec!["music", "talks"]);
    }

    #[test]
    fn test_backend_defaults_to_jsonbin() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let legacy = config.collection("legacy").unwrap();

        assert_eq!(legacy.backend, BackendKind::JsonBin);
        assert_eq!(legacy.remote_id, "1234");
    }

    #[test]
    fn test_unknown_collection_is_config_error() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let err = config.collection("missing").unwrap_err();
        assert!(matches!(err, BookmarkError::Config(_)));
    }

    #[test]
    fn test_unsupported_backend_is_config_error() {
        let config = Config::from_yaml(SAMPLE).unwrap();
        let err = config.collection("broken").unwrap_err();
        assert!(matches!(err, BookmarkError::Config(ref m) if m.contains("dynamodb")));
    }

    #[test]
    fn test_missing_credentials_are_reported_by_name() {
        let creds = Credentials {
            jsonbin_api_key: Some("master".to_string()),
            ..Default::default()
        };

        let err = creds.jsonbin().unwrap_err();
        assert!(matches!(err, BookmarkError::MissingEnvVar(ref v) if v == "JSONBIN_ACCESS_KEY"));
        assert!(err.is_config());
        assert!(creds.supabase().is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(dir.path().join("nope.yaml")).unwrap_err();
        assert!(matches!(err, BookmarkError::Config(_)));
    }
}
