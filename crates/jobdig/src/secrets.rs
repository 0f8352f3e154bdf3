use serde::Deserialize;
use std::fmt::{Debug, Display};
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum SecretsError {
    #[error("Failed to read secrets file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("Invalid secrets file: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("API key is empty")]
    Empty,
}

/// Scrapingdog API credential. Formatting never reveals the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(key: impl Into<String>) -> Result<Self, SecretsError> {
        let key = key.into().trim().to_string();
        if key.is_empty() {
            return Err(SecretsError::Empty);
        }
        Ok(Self(key))
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl Debug for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

impl Display for ApiKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("***")
    }
}

#[derive(Deserialize)]
struct SecretsFile {
    api: ApiSection,
}

#[derive(Deserialize)]
struct ApiSection {
    key1: String,
}

/// Reads the key stored under `[api] key1` in a TOML secrets file.
pub fn load_api_key(path: impl AsRef<Path>) -> Result<ApiKey, SecretsError> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path).map_err(|source| SecretsError::Io {
        path: path.display().to_string(),
        source,
    })?;
    parse_api_key(&contents)
}

pub fn parse_api_key(contents: &str) -> Result<ApiKey, SecretsError> {
    let secrets: SecretsFile = toml::from_str(contents)?;
    ApiKey::new(secrets.api.key1)
}
