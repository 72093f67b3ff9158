use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    JsonBin,
    Supabase,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::JsonBin => "jsonbin",
            BackendKind::Supabase => "supabase",
        }
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonbin" => Ok(BackendKind::JsonBin),
            "supabase" => Ok(BackendKind::Supabase),
            _ => Err(format!("Unsupported backend type: {}", s)),
        }
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A logical collection as declared in the config file.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectionConfig {
    pub name: String,
    pub backend: BackendKind,
    pub remote_id: String,
    pub categories: Vec<String>,
}

impl CollectionConfig {
    pub fn allows_category(&self, category: &str) -> bool {
        self.categories.iter().any(|c| c == category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_parse() {
        assert_eq!("jsonbin".parse::<BackendKind>().unwrap(), BackendKind::JsonBin);
        assert_eq!("Supabase".parse::<BackendKind>().unwrap(), BackendKind::Supabase);
        assert!("dynamodb".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_allows_category() {
        let collection = CollectionConfig {
            name: "reading".to_string(),
            backend: BackendKind::JsonBin,
            remote_id: "abc".to_string(),
            categories: vec!["tech".to_string(), "news".to_string()],
        };

        assert!(collection.allows_category("tech"));
        assert!(!collection.allows_category("sports"));
    }
}
